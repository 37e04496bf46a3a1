//! Configuration file parsing for vmasm.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure.
///
/// The module magic number is fixed by the format and cannot be configured.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Print a listing after assembling
    #[serde(default)]
    pub listing: bool,

    /// Where to write the postcard snapshot, if anywhere
    pub ir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive, overridden by RUST_LOG
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

/// Load configuration from a file, or from `vmasm.toml` in the working
/// directory if present.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file not found: {}", p.display());
            }
            Some(p.to_path_buf())
        }
        None => Some(PathBuf::from("vmasm.toml")).filter(|p| p.exists()),
    };

    match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            parse_config(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
        }
        None => Ok(Config::default()),
    }
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert!(!config.output.listing);
        assert!(config.output.ir.is_none());
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
[output]
listing = true
ir = "out.ir"

[log]
level = "vmasm=debug"
"#,
        )
        .unwrap();

        assert!(config.output.listing);
        assert_eq!(config.output.ir, Some(PathBuf::from("out.ir")));
        assert_eq!(config.log.level, "vmasm=debug");
    }

    #[test]
    fn test_unknown_value_type_is_rejected() {
        assert!(parse_config("[output]\nlisting = \"yes\"").is_err());
    }

    #[test]
    fn test_magic_is_not_configurable() {
        let err = parse_config("[assembler]\nmagic = 0xCAFEBABE").unwrap_err();
        assert!(err.to_string().contains("assembler"));
    }

    #[test]
    fn test_missing_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("vmasm.toml");
        assert!(load_config(Some(&missing)).is_err());
    }
}
