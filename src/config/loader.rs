//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, Environment, PostgreSQLConfig, VigilConfig};
use super::secret::secret_string;
use crate::domain::errors::VigilError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into VigilConfig
/// 4. Applies environment variable overrides (VIGIL_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`VigilError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use vigil::config::loader::load_config;
///
/// let config = load_config("vigil.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<VigilConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(VigilError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        VigilError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: VigilConfig = toml::from_str(&contents)
        .map_err(|e| VigilError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        VigilError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| VigilError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(VigilError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    value.trim().parse().map_err(|_| {
        VigilError::Configuration(format!("{name} must be 'true' or 'false', got '{value}'"))
    })
}

/// Applies environment variable overrides using the VIGIL_* prefix
///
/// Variables follow the pattern `VIGIL_<SECTION>_<KEY>`, for example
/// `VIGIL_POSTGRESQL_CONNECTION_STRING` or `VIGIL_REPAIR_DRY_RUN`.
fn apply_env_overrides(config: &mut VigilConfig) -> Result<()> {
    if let Ok(val) = std::env::var("VIGIL_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("VIGIL_ENVIRONMENT") {
        config.environment = match val.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(VigilError::Configuration(format!(
                    "VIGIL_ENVIRONMENT must be development, staging or production, got '{other}'"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("VIGIL_DATABASE_TARGET") {
        config.database_target = match val.to_lowercase().as_str() {
            "postgresql" => DatabaseTarget::PostgreSQL,
            "memory" => DatabaseTarget::Memory,
            other => {
                return Err(VigilError::Configuration(format!(
                    "VIGIL_DATABASE_TARGET must be postgresql or memory, got '{other}'"
                )))
            }
        };
    }

    // A connection string from the environment is enough to create the section
    if let Ok(val) = std::env::var("VIGIL_POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql {
            Some(ref mut pg) => pg.connection_string = secret_string(val),
            None => {
                let section = format!("connection_string = {}", toml::Value::String(val));
                let pg: PostgreSQLConfig = toml::from_str(&section)?;
                config.postgresql = Some(pg);
            }
        }
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Ok(val) = std::env::var("VIGIL_POSTGRESQL_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                pg.max_connections = max;
            }
        }
        if let Ok(val) = std::env::var("VIGIL_POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
        if let Ok(val) = std::env::var("VIGIL_POSTGRESQL_STATEMENT_TIMEOUT_SECONDS") {
            if let Ok(timeout) = val.parse() {
                pg.statement_timeout_seconds = timeout;
            }
        }
    }

    if let Ok(val) = std::env::var("VIGIL_REPAIR_DRY_RUN") {
        config.repair.dry_run = parse_bool("VIGIL_REPAIR_DRY_RUN", &val)?;
    }
    if let Ok(val) = std::env::var("VIGIL_REPAIR_ENSURE_UNIQUE_INDEX") {
        config.repair.ensure_unique_index = parse_bool("VIGIL_REPAIR_ENSURE_UNIQUE_INDEX", &val)?;
    }

    if let Ok(val) = std::env::var("VIGIL_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_bool("VIGIL_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("VIGIL_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
