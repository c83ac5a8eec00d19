//! Settings read from the environment (and a `.env` file, when the
//! binaries find one).
//!
//! | variable                    | default          |
//! |-----------------------------|------------------|
//! | `GRADEMASTER_ADDR`          | `127.0.0.1:3000` |
//! | `GRADEMASTER_MAX_UPLOAD_MB` | `20`             |
//! | `GRADEMASTER_PASS_MARK`     | `15`             |

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::{GradeError, Result};
use crate::stats::DEFAULT_PASS_MARK;

const ENV_ADDR: &str = "GRADEMASTER_ADDR";
const ENV_MAX_UPLOAD_MB: &str = "GRADEMASTER_MAX_UPLOAD_MB";
const ENV_PASS_MARK: &str = "GRADEMASTER_PASS_MARK";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    /// Final result counted as passing in sheet statistics.
    pub pass_mark: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_upload_bytes: 20 * 1024 * 1024,
            pass_mark: DEFAULT_PASS_MARK,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let bind_addr = parse_or(&lookup, ENV_ADDR, defaults.bind_addr)?;
        let max_upload_mb: usize =
            parse_or(&lookup, ENV_MAX_UPLOAD_MB, defaults.max_upload_bytes / (1024 * 1024))?;
        let pass_mark: f64 = parse_or(&lookup, ENV_PASS_MARK, defaults.pass_mark)?;

        if max_upload_mb == 0 {
            return Err(GradeError::config(format!("{ENV_MAX_UPLOAD_MB} must be at least 1")));
        }
        if !pass_mark.is_finite() {
            return Err(GradeError::config(format!("{ENV_PASS_MARK} must be a number")));
        }

        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| GradeError::config(format!("{ENV_MAX_UPLOAD_MB} is too large")))?;

        Ok(ServerConfig {
            bind_addr,
            max_upload_bytes,
            pass_mark,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| GradeError::config(format!("invalid value for {key}: '{raw}'"))),
        _ => Ok(default),
    }
}
