use crate::error::CliError;
use engine_config::settings::{ScrollSettings, env::MAX_ITEMS};
use std::{collections::HashMap, fs, path::Path};
use tracing::debug;

/// Collects `KEY=VALUE` pairs from the process environment and `.env` files.
/// Later sources override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

impl EnvManager {
    /// Starts from the process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read env file {}: {e}", path.display()))
        })?;

        let loaded = self.parse_env_content(&content)?;
        debug!(path = %path.display(), loaded, "Loaded env file");
        Ok(())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Scroll settings from the collected variables, with `max_items` taking
    /// precedence when given on the command line.
    pub fn scroll_settings(&self, max_items: Option<u64>) -> Result<ScrollSettings, CliError> {
        match max_items {
            Some(n) => {
                let mut vars = self.vars.clone();
                vars.insert(MAX_ITEMS.to_string(), n.to_string());
                Ok(ScrollSettings::from_vars(&vars)?)
            }
            None => Ok(ScrollSettings::from_vars(&self.vars)?),
        }
    }

    fn parse_env_content(&mut self, content: &str) -> Result<usize, CliError> {
        let mut loaded = 0;

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid env file: malformed line {} (expected KEY=VALUE)",
                    idx + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Config(format!(
                    "Invalid env file: empty key at line {}",
                    idx + 1
                )));
            }

            self.vars.insert(key.to_string(), unquote(value.trim()).to_string());
            loaded += 1;
        }

        Ok(loaded)
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
