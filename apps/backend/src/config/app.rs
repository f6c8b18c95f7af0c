//! Runtime settings for the sign-up service.
//!
//! Read once at startup from the environment:
//! - `BACKEND_HOST` / `BACKEND_PORT`: listen address (default `0.0.0.0:3001`)
//! - `SIGNUP_PAGE_SIZE`: cap on listed groups (default 10, 1..=100)
//! - `SIGNUP_MAX_TXN_ATTEMPTS`: read-modify-write attempts per mutation (default 3, at least 1)

use std::env;
use std::str::FromStr;

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_MAX_TXN_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupConfig {
    pub host: String,
    pub port: u16,
    pub page_size: u64,
    pub max_txn_attempts: u32,
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            page_size: DEFAULT_PAGE_SIZE,
            max_txn_attempts: DEFAULT_MAX_TXN_ATTEMPTS,
        }
    }
}

impl SignupConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let host = match env::var("BACKEND_HOST") {
            Ok(host) if !host.trim().is_empty() => host.trim().to_string(),
            _ => defaults.host,
        };
        let port = parse_var("BACKEND_PORT", defaults.port)?;

        let page_size = parse_var("SIGNUP_PAGE_SIZE", defaults.page_size)?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::config(format!(
                "SIGNUP_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }

        let max_txn_attempts = parse_var("SIGNUP_MAX_TXN_ATTEMPTS", defaults.max_txn_attempts)?;
        if max_txn_attempts == 0 {
            return Err(AppError::config("SIGNUP_MAX_TXN_ATTEMPTS must be at least 1"));
        }

        Ok(Self {
            host,
            port,
            page_size,
            max_txn_attempts,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{name} has an invalid value '{raw}'"))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(AppError::config(format!("failed to read {name}: {e}"))),
    }
}
