// SPDX-License-Identifier: AGPL-3.0

//! Configuration management for solmap
//!
//! Command-line arguments (clap) layered over an optional `solmap.toml`
//! whose `[global]` table provides defaults.

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the config file looked up under `--root`.
pub const CONFIG_FILE_NAME: &str = "solmap.toml";

/// Oldest compiler version the mapper is known to work with.
pub const DEFAULT_MIN_COMPILER_VERSION: &str = "0.5.17";

/// Main solmap configuration
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[clap(
    name = "solmap",
    version,
    about = "Map EVM program counters back to Solidity source"
)]
pub struct Config {
    /// Program counters to map, in hex with optional 0x prefix
    #[clap(required = true, num_args = 1..)]
    #[serde(default)]
    pub addresses: Vec<String>,

    /// solc JSON output (--standard-json or --combined-json)
    #[clap(long, short = 'o')]
    pub compiler_output: Option<PathBuf>,

    /// Contract name (or Solidity file name) to map addresses of
    #[clap(long, short = 'c', default_value = "")]
    #[serde(default)]
    pub contract: String,

    /// Directory to read source files from when the output does not embed them
    #[clap(long)]
    pub sources_dir: Option<PathBuf>,

    /// Always reconstruct code from the AST instead of slicing source text
    #[clap(long)]
    #[serde(default)]
    pub no_literal: bool,

    /// Print one JSON object per address
    #[clap(long)]
    #[serde(default)]
    pub json: bool,

    /// Print every step of each mapping to stderr
    #[clap(long)]
    #[serde(default)]
    pub explain: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    #[serde(default)]
    pub verbose: u8,

    /// Disable colored output
    #[clap(long)]
    #[serde(default)]
    pub no_color: bool,

    /// Warn about contracts compiled with an older compiler
    #[clap(long, default_value = DEFAULT_MIN_COMPILER_VERSION)]
    #[serde(default = "default_min_compiler_version")]
    pub min_compiler_version: String,

    /// Project root directory
    #[clap(long, default_value = ".")]
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Path to the config file
    #[clap(long)]
    pub config: Option<PathBuf>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_min_compiler_version() -> String {
    DEFAULT_MIN_COMPILER_VERSION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            compiler_output: None,
            contract: String::new(),
            sources_dir: None,
            no_literal: false,
            json: false,
            explain: false,
            verbose: 0,
            no_color: false,
            min_compiler_version: default_min_compiler_version(),
            root: default_root(),
            config: None,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let parsed: TomlConfig = toml::from_str(content)?;
        parsed.into_config()
    }

    /// Layer command-line values over this (file) configuration.
    ///
    /// Only values that differ from their defaults override.
    pub fn merge(&mut self, other: Self) {
        if !other.addresses.is_empty() {
            self.addresses = other.addresses;
        }
        if other.compiler_output.is_some() {
            self.compiler_output = other.compiler_output;
        }
        if !other.contract.is_empty() {
            self.contract = other.contract;
        }
        if other.sources_dir.is_some() {
            self.sources_dir = other.sources_dir;
        }
        if other.no_literal {
            self.no_literal = true;
        }
        if other.json {
            self.json = true;
        }
        if other.explain {
            self.explain = true;
        }
        if other.verbose > 0 {
            self.verbose = other.verbose;
        }
        if other.no_color {
            self.no_color = true;
        }
        if other.min_compiler_version != default_min_compiler_version() {
            self.min_compiler_version = other.min_compiler_version;
        }
        if other.root != default_root() {
            self.root = other.root;
        }
        if other.config.is_some() {
            self.config = other.config;
        }
    }

    /// Explicit `--config`, else `solmap.toml` under the root if it exists.
    pub fn resolve_config_path(&self) -> Option<PathBuf> {
        if let Some(config) = &self.config {
            Some(config.clone())
        } else {
            let default_path = self.root.join(CONFIG_FILE_NAME);
            if default_path.exists() {
                Some(default_path)
            } else {
                None
            }
        }
    }

    /// Command-line configuration merged over the config file, if any.
    pub fn with_config_file(self) -> Result<Self> {
        let Some(path) = self.resolve_config_path() else {
            return Ok(self);
        };

        let mut config = Self::from_file(&path)?;
        // root and config path are only meaningful from the command line
        config.root = self.root.clone();
        config.merge(self);
        Ok(config)
    }

    /// Check that everything needed for a run is present.
    pub fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            anyhow::bail!("No addresses given");
        }
        if self.compiler_output.is_none() {
            anyhow::bail!("Missing --compiler-output (or compiler-output in {})", CONFIG_FILE_NAME);
        }
        if self.contract.is_empty() {
            anyhow::bail!("Missing --contract (or contract in {})", CONFIG_FILE_NAME);
        }
        Ok(())
    }

    pub fn resolved_compiler_output(&self) -> Option<PathBuf> {
        self.compiler_output.as_deref().map(|path| self.resolve_path(path))
    }

    pub fn resolved_sources_dir(&self) -> Option<PathBuf> {
        self.sources_dir.as_deref().map(|path| self.resolve_path(path))
    }

    /// Relative paths are taken relative to the root.
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// TOML configuration structure (for parsing from file)
#[derive(Debug, Deserialize)]
struct TomlConfig {
    #[serde(default)]
    global: HashMap<String, toml::Value>,
}

impl TomlConfig {
    fn into_config(self) -> Result<Config> {
        let mut config = Config::default();

        for (key, value) in self.global {
            let key = key.replace('-', "_");
            let invalid = || format!("Invalid value for {}", key);

            match key.as_str() {
                "compiler_output" => {
                    config.compiler_output = Some(parse_toml_path(&value).with_context(invalid)?)
                }
                "contract" => config.contract = parse_toml_string(&value).with_context(invalid)?,
                "sources_dir" => {
                    config.sources_dir = Some(parse_toml_path(&value).with_context(invalid)?)
                }
                "no_literal" => config.no_literal = parse_toml_bool(&value).with_context(invalid)?,
                "json" => config.json = parse_toml_bool(&value).with_context(invalid)?,
                "explain" => config.explain = parse_toml_bool(&value).with_context(invalid)?,
                "verbose" => config.verbose = parse_toml_u8(&value).with_context(invalid)?,
                "no_color" => config.no_color = parse_toml_bool(&value).with_context(invalid)?,
                "min_compiler_version" => {
                    config.min_compiler_version = parse_toml_string(&value).with_context(invalid)?
                }
                _ => {
                    // unknown keys are ignored so newer files still load
                }
            }
        }

        Ok(config)
    }
}

fn parse_toml_string(value: &toml::Value) -> Result<String> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Expected string, got {:?}", value))
}

fn parse_toml_bool(value: &toml::Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| anyhow::anyhow!("Expected bool, got {:?}", value))
}

fn parse_toml_u8(value: &toml::Value) -> Result<u8> {
    value
        .as_integer()
        .and_then(|i| u8::try_from(i).ok())
        .ok_or_else(|| anyhow::anyhow!("Expected u8, got {:?}", value))
}

fn parse_toml_path(value: &toml::Value) -> Result<PathBuf> {
    Ok(PathBuf::from(parse_toml_string(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.min_compiler_version, DEFAULT_MIN_COMPILER_VERSION);
        assert_eq!(config.root, PathBuf::from("."));
        assert!(!config.no_literal);
    }

    #[test]
    fn test_parse_command_line() {
        let config = Config::try_parse_from([
            "solmap",
            "0x1798",
            "90e",
            "--compiler-output",
            "out.json",
            "--contract",
            "BeerBar",
            "-vv",
            "--json",
        ])
        .unwrap();

        assert_eq!(config.addresses, vec!["0x1798", "90e"]);
        assert_eq!(config.compiler_output, Some(PathBuf::from("out.json")));
        assert_eq!(config.contract, "BeerBar");
        assert_eq!(config.verbose, 2);
        assert!(config.json);
        assert!(!config.explain);
        assert_eq!(config.min_compiler_version, DEFAULT_MIN_COMPILER_VERSION);
        assert_eq!(config.min_compiler_version, Config::default().min_compiler_version);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_addresses_are_required() {
        assert!(Config::try_parse_from(["solmap", "--contract", "A"]).is_err());
    }

    #[test]
    fn test_toml_kebab_and_snake_keys() {
        let config = Config::from_toml_str(
            r#"
            [global]
            compiler-output = "build/out.json"
            contract = "BeerBar"
            sources_dir = "contracts"
            no-literal = true
            verbose = 1
            min-compiler-version = "0.6.0"
            "#,
        )
        .unwrap();

        assert_eq!(config.compiler_output, Some(PathBuf::from("build/out.json")));
        assert_eq!(config.contract, "BeerBar");
        assert_eq!(config.sources_dir, Some(PathBuf::from("contracts")));
        assert!(config.no_literal);
        assert_eq!(config.verbose, 1);
        assert_eq!(config.min_compiler_version, "0.6.0");
    }

    #[test]
    fn test_toml_unknown_keys_ignored() {
        let config = Config::from_toml_str("[global]\nfuture-option = 3\n").unwrap();
        assert_eq!(config.contract, "");

        let config = Config::from_toml_str("[other]\nx = 1\n").unwrap();
        assert!(config.compiler_output.is_none());
    }

    #[test]
    fn test_toml_ill_typed_value() {
        let err = Config::from_toml_str("[global]\njson = \"yes\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid value for json"));

        assert!(Config::from_toml_str("[global]\nverbose = 300\n").is_err());
    }

    #[test]
    fn test_merge_command_line_over_file() {
        let mut file = Config::from_toml_str(
            "[global]\ncontract = \"FromFile\"\njson = true\nmin-compiler-version = \"0.6.0\"\n",
        )
        .unwrap();
        let cli = Config::try_parse_from(["solmap", "0x10", "--contract", "FromCli"]).unwrap();

        file.merge(cli);
        assert_eq!(file.contract, "FromCli");
        assert_eq!(file.addresses, vec!["0x10"]);
        // defaults on the command line leave file values alone
        assert!(file.json);
        assert_eq!(file.min_compiler_version, "0.6.0");
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let mut config = Config {
            addresses: vec!["0".to_string()],
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("--compiler-output"));

        config.compiler_output = Some(PathBuf::from("out.json"));
        assert!(config.validate().unwrap_err().to_string().contains("--contract"));
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let config = Config {
            root: PathBuf::from("/work"),
            compiler_output: Some(PathBuf::from("out.json")),
            sources_dir: Some(PathBuf::from("/abs/contracts")),
            ..Config::default()
        };
        assert_eq!(
            config.resolved_compiler_output(),
            Some(PathBuf::from("/work/out.json"))
        );
        assert_eq!(
            config.resolved_sources_dir(),
            Some(PathBuf::from("/abs/contracts"))
        );
    }
}
