//! Loading API keys before the model backend is resolved.
//!
//! Sources, first hit wins for each variable:
//!
//! 1. the process environment
//! 2. a `.env` file in the working directory (dotenvy)
//! 3. a TOML secrets file of flat `KEY = "value"` pairs
//!
//! Values are exported into the environment so that `edgequake-llm`
//! providers pick them up the usual way.

use crate::error::DetectaError;
use std::path::Path;
use tracing::{debug, warn};

/// Default secrets file name, looked up in the working directory.
pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";

/// Parse a secrets file into `(name, value)` pairs.
///
/// Only string, integer and boolean values at the top level are kept;
/// tables are ignored.
pub fn parse_secrets(content: &str) -> Result<Vec<(String, String)>, DetectaError> {
    let table: toml::Table = content
        .parse()
        .map_err(|e: toml::de::Error| DetectaError::InvalidConfig(format!("secrets file: {e}")))?;

    let mut pairs = Vec::new();
    for (key, value) in table {
        let value = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            _ => {
                debug!("Ignoring non-scalar secret '{}'", key);
                continue;
            }
        };
        pairs.push((key, value));
    }
    Ok(pairs)
}

/// Load `.env` and `secrets_file` into the process environment.
///
/// Call this before any thread is spawned (i.e. before the tokio runtime is
/// built). A missing file is not an error. Returns the names of the variables
/// that were set from the secrets file.
pub fn load_secrets(secrets_file: Option<&Path>) -> Result<Vec<String>, DetectaError> {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring .env file: {}", e),
    }

    let path = secrets_file.unwrap_or_else(|| Path::new(DEFAULT_SECRETS_FILE));
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(DetectaError::InvalidConfig(format!(
                "cannot read {}: {e}",
                path.display()
            )))
        }
    };

    let mut applied = Vec::new();
    for (key, value) in parse_secrets(&content)? {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        std::env::set_var(&key, value);
        applied.push(key);
    }
    debug!("Loaded {} secrets from {}", applied.len(), path.display());
    Ok(applied)
}
