use crate::error::CliError;
use engine_processing::transform::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, LlmConfig};
use std::{collections::HashMap, fs, path::Path};
use tracing::{info, warn};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
const DEFAULT_ENV_FILE: &str = ".env";

/// Process environment merged with an optional `.env` file.
#[derive(Debug, Clone)]
pub struct EnvManager {
    vars: HashMap<String, String>,
    sensitive_patterns: Vec<&'static str>,
}

impl EnvManager {
    pub fn new() -> Self {
        Self::with_vars(std::env::vars().collect())
    }

    fn with_vars(vars: HashMap<String, String>) -> Self {
        Self {
            vars,
            sensitive_patterns: vec![
                "password",
                "passwd",
                "secret",
                "token",
                "key",
                "auth",
                "credential",
                "private",
            ],
        }
    }

    /// Loads `explicit` when given (missing file is an error), otherwise
    /// `./.env` when present (missing file is only a warning).
    pub fn load(&mut self, explicit: Option<&Path>) -> Result<(), CliError> {
        match explicit {
            Some(path) => self.load_from_file(path),
            None if Path::new(DEFAULT_ENV_FILE).exists() => self.load_from_file(DEFAULT_ENV_FILE),
            None => {
                warn!("No {DEFAULT_ENV_FILE} file found, using process environment only");
                Ok(())
            }
        }
    }

    /// Load variables from a .env file; they override the process environment.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read env file {}: {}", path.display(), e))
        })?;

        let loaded = self.parse_env_content(&content)?;
        info!(path = %path.display(), variables = loaded, "Loaded env file");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The value with secrets reduced to their last four characters.
    pub fn masked(&self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        if !self.is_sensitive(key) {
            return Some(value.to_string());
        }
        let tail: String = value
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        Some(format!("****{tail}"))
    }

    fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        self.sensitive_patterns.iter().any(|p| key.contains(p))
    }

    /// Chat-completions settings from `OPENAI_*` variables.
    pub fn llm_config(&self) -> Result<LlmConfig, CliError> {
        let api_key = self.get(API_KEY_VAR).ok_or(CliError::MissingApiKey)?;
        let config = LlmConfig::new(api_key)
            .with_base_url(self.get(BASE_URL_VAR).unwrap_or(DEFAULT_BASE_URL))
            .with_model(self.get(MODEL_VAR).unwrap_or(DEFAULT_MODEL));

        info!(
            base_url = %config.base_url,
            model = %config.model,
            api_key = %self.masked(API_KEY_VAR).unwrap_or_default(),
            "API configuration"
        );
        Ok(config)
    }

    fn parse_env_content(&mut self, content: &str) -> Result<usize, CliError> {
        let mut loaded = 0;

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid env file: malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Config(format!(
                    "Invalid env file: empty key at line {}",
                    line_num + 1
                )));
            }

            self.vars.insert(key.to_string(), Self::unquote_value(value));
            loaded += 1;
        }

        Ok(loaded)
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();

        for quote in ['"', '\''] {
            if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
                return value[1..value.len() - 1].to_string();
            }
        }

        value.to_string()
    }
}

impl Default for EnvManager {
    fn default() -> Self {
        Self::new()
    }
}
