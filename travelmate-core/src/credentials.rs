//! `.env`-style key/value file that keeps the maps API key between sessions.

use crate::{ConfigError, CoreResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Export the file's entries into the process environment.
    ///
    /// Variables that are already set win. A missing file is not an error.
    pub fn load_into_env(&self) -> CoreResult<()> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No credentials file present");
            return Ok(());
        }
        dotenvy::from_path(&self.path).map_err(|e| ConfigError::CredentialsFile {
            details: format!("{}: {}", self.path.display(), e),
        })?;
        debug!(path = %self.path.display(), "Loaded credentials file");
        Ok(())
    }

    pub fn get(&self, key: &str) -> CoreResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let entries = dotenvy::from_path_iter(&self.path).map_err(|e| {
            ConfigError::CredentialsFile {
                details: e.to_string(),
            }
        })?;
        for entry in entries {
            let (name, value) = entry.map_err(|e| ConfigError::CredentialsFile {
                details: e.to_string(),
            })?;
            if name == key {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Insert or replace `key`, leaving every other line untouched.
    pub fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        if key.is_empty() || key.contains(['=', '\n']) {
            return Err(ConfigError::InvalidValue {
                field: "credential key".to_string(),
                value: key.to_string(),
            }
            .into());
        }
        if value.contains('\n') {
            return Err(ConfigError::InvalidValue {
                field: key.to_string(),
                value: "<multi-line value>".to_string(),
            }
            .into());
        }

        let existing = if self.path.exists() {
            std::fs::read_to_string(&self.path)?
        } else {
            String::new()
        };

        let new_line = format!("{}={}", key, quote_value(value));
        let mut replaced = false;
        let mut lines: Vec<String> = existing
            .lines()
            .map(|line| {
                if line_key(line) == Some(key) {
                    replaced = true;
                    new_line.clone()
                } else {
                    line.to_string()
                }
            })
            .collect();
        if !replaced {
            lines.push(new_line);
        }

        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(&self.path, content)?;

        info!(path = %self.path.display(), key, "Stored credential");
        Ok(())
    }
}

/// Double-quoted with the characters dotenv treats specially escaped.
fn quote_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    trimmed.split_once('=').map(|(name, _)| name.trim())
}
