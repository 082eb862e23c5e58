//! TOML-based configuration for a conversion run.
//!
//! Every field has a default, so a run without a configuration file uses
//! the ldapdomaindump input names and the BloodHound output names.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bloodhound::CollectionKind;
use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Input file names inside the input directory.
    #[serde(default)]
    pub input: InputConfig,

    /// Output file names and formatting.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Names of the four ldapdomaindump collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_users_input")]
    pub users: String,
    #[serde(default = "default_computers_input")]
    pub computers: String,
    #[serde(default = "default_groups_input")]
    pub groups: String,
    #[serde(default = "default_trusts_input")]
    pub trusts: String,
}

fn default_users_input() -> String {
    "domain_users.json".into()
}
fn default_computers_input() -> String {
    "domain_computers.json".into()
}
fn default_groups_input() -> String {
    "domain_groups.json".into()
}
fn default_trusts_input() -> String {
    "domain_trusts.json".into()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            users: default_users_input(),
            computers: default_computers_input(),
            groups: default_groups_input(),
            trusts: default_trusts_input(),
        }
    }
}

impl InputConfig {
    /// Input file feeding a collection. Domains are read from the trusts dump.
    pub fn file_for(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::Users => &self.users,
            CollectionKind::Computers => &self.computers,
            CollectionKind::Groups => &self.groups,
            CollectionKind::Domains => &self.trusts,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Output document names and formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_users_output")]
    pub users: String,
    #[serde(default = "default_computers_output")]
    pub computers: String,
    #[serde(default = "default_groups_output")]
    pub groups: String,
    #[serde(default = "default_domains_output")]
    pub domains: String,

    /// Pretty-print output documents.
    #[serde(default)]
    pub pretty: bool,
}

fn default_users_output() -> String {
    "users.json".into()
}
fn default_computers_output() -> String {
    "computers.json".into()
}
fn default_groups_output() -> String {
    "groups.json".into()
}
fn default_domains_output() -> String {
    "domains.json".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            users: default_users_output(),
            computers: default_computers_output(),
            groups: default_groups_output(),
            domains: default_domains_output(),
            pretty: false,
        }
    }
}

impl OutputConfig {
    pub fn file_for(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::Users => &self.users,
            CollectionKind::Computers => &self.computers,
            CollectionKind::Groups => &self.groups,
            CollectionKind::Domains => &self.domains,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl ConvertConfig {
    /// Load a [`ConvertConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: ConvertConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate file names: non-empty, no path separators, and no two
    /// collections writing the same output file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for kind in CollectionKind::ALL {
            let input = self.input.file_for(kind);
            check_file_name(&format!("input.{}", input_field(kind)), input)?;

            let output = self.output.file_for(kind);
            let field = format!("output.{}", kind.label());
            check_file_name(&field, output)?;
            if !seen.insert(output) {
                return Err(ConfigError::InvalidValue {
                    field,
                    detail: format!("'{}' is already used by another collection", output),
                });
            }
        }
        Ok(())
    }
}

fn input_field(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Domains => "trusts",
        other => other.label(),
    }
}

fn check_file_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            detail: "must not be empty".into(),
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            detail: format!("'{}' must be a bare file name", name),
        });
    }
    Ok(())
}
