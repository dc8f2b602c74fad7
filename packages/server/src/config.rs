use std::env;

use anyhow::{Context, Result};
use dotenvy::dotenv;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Required only when the OpenAI suggester/analyzer/transcriber is used.
    pub openai_api_key: Option<String>,
    /// Required only when the AssemblyAI transcriber is used.
    pub assembly_api_key: Option<String>,
    /// Chat model for suggestion and analysis prompts.
    pub llm_model: String,
    /// Worker poll interval when the queue is empty.
    pub poll_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::validate_env_vars();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            assembly_api_key: env::var("ASSEMBLY_API_KEY").ok(),
            llm_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("POLL_INTERVAL_SECS must be a valid number")?,
        })
    }

    /// The OpenAI key, or an error naming the variable.
    pub fn require_openai_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .context("OPENAI_API_KEY must be set when the openai provider is selected")
    }

    /// The AssemblyAI key, or an error naming the variable.
    pub fn require_assembly_key(&self) -> Result<&str> {
        self.assembly_api_key
            .as_deref()
            .context("ASSEMBLY_API_KEY must be set when the assembly provider is selected")
    }

    /// Warn about unset variables; only DATABASE_URL is a hard requirement.
    fn validate_env_vars() {
        let optional_vars = [
            ("PORT", "8080"),
            ("OPENAI_API_KEY", "unset - openai provider disabled"),
            ("ASSEMBLY_API_KEY", "unset - assembly provider disabled"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("POLL_INTERVAL_SECS", "5"),
        ];

        for (var, default) in optional_vars {
            if env::var(var).is_err() {
                tracing::warn!("{} not set (default: {})", var, default);
            }
        }

        if env::var("DATABASE_URL").is_err() {
            tracing::error!("DATABASE_URL is missing; the process will fail to start");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_provider_keys_are_reported_by_name() {
        let config = Config {
            database_url: "postgres://localhost/signal_noise".into(),
            port: 8080,
            openai_api_key: None,
            assembly_api_key: Some("key".into()),
            llm_model: "gpt-4o-mini".into(),
            poll_interval_secs: 5,
        };

        let err = config.require_openai_key().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert_eq!(config.require_assembly_key().unwrap(), "key");
    }
}
