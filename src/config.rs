// Configuration for the binaries, read from environment variables.
//
// Each binary loads a `.env` file first when one is present, so these can also
// be set there.
use crate::{Error, Result};

use std::{str::FromStr, time::Duration};

pub const DEFAULT_ORACLE_HOST: &str = "128.8.130.16";
pub const DEFAULT_ORACLE_PORT: u16 = 49101;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:49101";

/// The ciphertext attacked when `CIPHERTEXT` is not set.
pub const DEFAULT_CIPHERTEXT: &str = "9F0B13944841A832B2421B9EAF6D9836813EC9D944A5C8347A7CA69AA34D8DC0DF70E343C4000A2AE35874CE75E64C31";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackConfig {
    pub host: String,
    pub port: u16,
    /// Bound on every read and write to the oracle.
    pub timeout: Duration,
    /// How many blocks to attack at once, each over its own connection.
    pub workers: usize,
    pub ciphertext: Vec<u8>,
}

impl AttackConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ciphertext_hex =
            lookup("CIPHERTEXT").unwrap_or_else(|| DEFAULT_CIPHERTEXT.to_string());
        let ciphertext = hex::decode(ciphertext_hex.trim()).map_err(|e| Error::InvalidConfig {
            var: "CIPHERTEXT",
            reason: e.to_string(),
        })?;
        let workers = parse_or(&lookup, "ATTACK_WORKERS", 1)?;
        if workers == 0 {
            return Err(Error::InvalidConfig {
                var: "ATTACK_WORKERS",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            host: lookup("ORACLE_HOST").unwrap_or_else(|| DEFAULT_ORACLE_HOST.to_string()),
            port: parse_or(&lookup, "ORACLE_PORT", DEFAULT_ORACLE_PORT)?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "ORACLE_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            workers,
            ciphertext,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub key: [u8; 16],
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let invalid_key = |reason: String| Error::InvalidConfig {
            var: "ORACLE_KEY",
            reason,
        };
        let key_hex = lookup("ORACLE_KEY").ok_or_else(|| invalid_key("not set".to_string()))?;
        let key = hex::decode(key_hex.trim())
            .map_err(|e| invalid_key(e.to_string()))?
            .try_into()
            .map_err(|k: Vec<u8>| invalid_key(format!("expected 16 bytes, got {}", k.len())))?;

        Ok(Self {
            bind_addr: lookup("ORACLE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            key,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
            var,
            reason: format!("{value:?}: {e}"),
        }),
        None => Ok(default),
    }
}
