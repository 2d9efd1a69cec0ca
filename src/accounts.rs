//! # Account Registry
//!
//! The set of accounts allowed to own credentials, injected from
//! configuration. Provisioning itself is external; this core only answers
//! "may this account run a ceremony". Zero, one, or many accounts are all
//! valid deployments — an empty registry simply rejects every ceremony.

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct AccountRegistry {
    accounts: Vec<String>,
}

impl AccountRegistry {
    pub fn new(accounts: Vec<String>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        Self { accounts }
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Resolve the account a ceremony runs for.
    ///
    /// An omitted account resolves to the sole registered account, preserving
    /// the single-administrator deployment where clients never name one.
    /// Every failure is `ConfigurationMissing`: an unknown account is made
    /// indistinguishable from an unconfigured deployment so the endpoint
    /// cannot be used to probe which accounts exist.
    pub fn resolve(&self, requested: Option<&str>) -> AppResult<String> {
        match requested {
            None => match self.accounts.as_slice() {
                [] => Err(AppError::ConfigurationMissing("no accounts configured".into())),
                [only] => Ok(only.clone()),
                _ => Err(AppError::ConfigurationMissing(
                    "account required when multiple accounts are configured".into(),
                )),
            },
            Some(requested) => {
                if self.accounts.iter().any(|a| a == requested) {
                    Ok(requested.to_string())
                } else {
                    Err(AppError::ConfigurationMissing(
                        "account is not provisioned".into(),
                    ))
                }
            }
        }
    }
}
