use super::types::*;
use crate::error_handling::types::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Application configuration covering the sensor identity, the SSH listener,
/// the generation collaborator, the scoring oracle and the account table.
///
/// Loaded once at startup from a TOML file; every validation failure here is
/// fatal to the process since nothing sensible can be accepted without it.
///
/// # Fields Overview
///
/// - `honeypot`: sensor name, telemetry destinations, optional GeoIP database
/// - `ssh`: bind address, port, host key, version banner, idle bound
/// - `llm`: generation provider endpoint, model, history token budget
/// - `classifier`: optional lexicon override for the scoring oracle
/// - `accounts`: username to password map; an empty password value accepts
///   any password for that username
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub honeypot: HoneypotSection,

    #[serde(default)]
    pub ssh: SshSection,

    #[serde(default)]
    pub llm: LlmSection,

    #[serde(default)]
    pub classifier: ClassifierSection,

    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
}

impl Config {
    /// Parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read, is not valid
    /// TOML, declares no accounts, declares port 0, or names a host key that
    /// does not exist on disk.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.accounts.is_empty() {
            return Err(ConfigError::AccountsEmpty(String::from(
                "no user accounts found in configuration file",
            )));
        }

        if self.ssh.port == 0 {
            return Err(ConfigError::BadPort(String::from(
                "ssh port must be nonzero",
            )));
        }

        if !self.ssh.host_key.exists() {
            return Err(ConfigError::HostKeyMissing(format!(
                "host key '{}' not found",
                self.ssh.host_key.display()
            )));
        }

        if let Some(lexicon) = &self.classifier.lexicon_file {
            if !lexicon.exists() {
                return Err(ConfigError::NotInRange(format!(
                    "lexicon file '{}' not found",
                    lexicon.display()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_from_file_with_accounts_and_key() {
        let key = NamedTempFile::new().unwrap();
        let body = format!(
            r#"
[honeypot]
sensor_name = "lab-sensor"

[ssh]
port = 2222
host_key = "{}"

[accounts]
alice = ""
bob = "secret"
"#,
            key.path().display()
        );
        let file = write_config(&body);

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.honeypot.sensor_name, "lab-sensor");
        assert_eq!(config.ssh.port, 2222);
        assert_eq!(config.accounts.get("alice").unwrap(), "");
        assert_eq!(config.accounts.get("bob").unwrap(), "secret");
        assert_eq!(config.ssh.idle_timeout_secs, 600);
    }

    #[test]
    fn test_empty_accounts_rejected() {
        let key = NamedTempFile::new().unwrap();
        let body = format!(
            r#"
[ssh]
host_key = "{}"
"#,
            key.path().display()
        );
        let file = write_config(&body);

        match Config::from_file(file.path()) {
            Err(ConfigError::AccountsEmpty(_)) => {}
            other => panic!("expected AccountsEmpty, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_host_key_rejected() {
        let body = r#"
[ssh]
host_key = "/nonexistent/ssh_host_key"

[accounts]
alice = ""
"#;
        let file = write_config(body);

        match Config::from_file(file.path()) {
            Err(ConfigError::HostKeyMissing(_)) => {}
            other => panic!("expected HostKeyMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let file = write_config("[ssh\nport = ");

        match Config::from_file(file.path()) {
            Err(ConfigError::TomlError(_)) => {}
            other => panic!("expected TomlError, got {:?}", other),
        }
    }
}
