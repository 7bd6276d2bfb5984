// License Tool Configuration
// Loaded from a JSON file; every field is optional and falls back to a
// 1024-bit modulus, 30 days tolerance and raw blobs

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::license::{PayloadEncoding, DEFAULT_TOLERANCE_DAYS};
use crate::rsa::keygen::MIN_MODULUS_BITS;
use crate::util::{read_json, FileError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Modulus size for newly generated keys
    pub modulus_bits: u32,

    /// Maximum days between issuance and verification
    pub tolerance_days: i64,

    /// Blob layout on disk
    pub encoding: PayloadEncoding,

    /// License blob location
    pub license_path: PathBuf,

    /// Key pair file used by the issuer
    pub private_key_path: PathBuf,

    /// Public key file used by the verifier
    pub public_key_path: PathBuf,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            modulus_bits: 1024,
            tolerance_days: DEFAULT_TOLERANCE_DAYS,
            encoding: PayloadEncoding::Raw,
            license_path: PathBuf::from("License"),
            private_key_path: PathBuf::from("license-key.json"),
            public_key_path: PathBuf::from("license-key.pub.json"),
        }
    }
}

impl LicenseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modulus_bits < MIN_MODULUS_BITS || self.modulus_bits % 16 != 0 {
            return Err(ConfigError::Invalid(format!(
                "modulus_bits must be a multiple of 16 and at least {MIN_MODULUS_BITS}, got {}",
                self.modulus_bits
            )));
        }
        if self.tolerance_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance_days must not be negative, got {}",
                self.tolerance_days
            )));
        }
        Ok(())
    }
}

/// Load and validate a configuration file
pub fn load_config(path: &Path) -> Result<LicenseConfig, ConfigError> {
    let config: LicenseConfig = read_json(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = LicenseConfig::default();
        assert_eq!(config.modulus_bits, 1024);
        assert_eq!(config.tolerance_days, 30);
        assert_eq!(config.encoding, PayloadEncoding::Raw);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("license.json");
        fs::write(&path, r#"{ "tolerance_days": 15, "encoding": "legacy-hex" }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.tolerance_days, 15);
        assert_eq!(config.encoding, PayloadEncoding::LegacyHex);
        assert_eq!(config.modulus_bits, 1024);
        assert_eq!(config.license_path, PathBuf::from("License"));
    }

    #[test]
    fn test_invalid_values() {
        let config = LicenseConfig {
            modulus_bits: 1000,
            ..LicenseConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = LicenseConfig {
            tolerance_days: -1,
            ..LicenseConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreadable_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("license.json");
        fs::write(&path, r#"{ "encoding": "base32" }"#).unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::File(_))));
        assert!(load_config(&dir.path().join("missing.json")).is_err());
    }
}
