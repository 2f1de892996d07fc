use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};

use crate::env::expand_placeholders;
use crate::logging::Level;

pub const CONFIG_ENV: &str = "HLF_CHAINCODE_CONFIG";
const CONFIG_DIR: &str = ".hlf-chaincode";
const CONFIG_FILE: &str = "config.toml";

/// How the golang workspace root reaches the package builder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoPathMode {
    /// Only passed in the install request.
    #[default]
    Explicit,
    /// Also exported as `GOPATH` for the duration of the install.
    Environment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub gopath_mode: GoPathMode,
    pub log_level: Level,
    pub profiles_dir: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            gopath_mode: GoPathMode::Explicit,
            log_level: Level::Info,
            profiles_dir: None,
        }
    }
}

impl ToolConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: ToolConfig =
            toml::from_str(content).context("invalid tool configuration")?;
        config.profiles_dir = config
            .profiles_dir
            .map(|dir| PathBuf::from(expand_placeholders(&dir.to_string_lossy())));
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("unable to read configuration {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Loads `$HLF_CHAINCODE_CONFIG` when set (the file must exist), otherwise
    /// `~/.hlf-chaincode/config.toml` when present, otherwise defaults.
    pub fn discover() -> Result<Self> {
        if let Some(explicit) = env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
            return Self::load(Path::new(&explicit));
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Directory holding connection profiles, `~/.hlf-chaincode/profiles`
    /// unless configured.
    pub fn resolved_profiles_dir(&self) -> Option<PathBuf> {
        self.profiles_dir
            .clone()
            .or_else(|| home_dir().map(|home| home.join(CONFIG_DIR).join("profiles")))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(ToolConfig::from_toml("").unwrap(), ToolConfig::default());
    }

    #[test]
    fn parses_all_keys() {
        env::set_var("HLF_CHAINCODE_CONFIG_TEST_ROOT", "/srv/fabric");
        let config = ToolConfig::from_toml(
            r#"
gopath_mode = "environment"
log_level = "debug"
profiles_dir = "${HLF_CHAINCODE_CONFIG_TEST_ROOT}/profiles"
"#,
        )
        .unwrap();
        assert_eq!(config.gopath_mode, GoPathMode::Environment);
        assert_eq!(config.log_level, Level::Debug);
        assert_eq!(
            config.resolved_profiles_dir(),
            Some(PathBuf::from("/srv/fabric/profiles"))
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(ToolConfig::from_toml("gopath = \"/opt\"").is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = \"warn\"\n").unwrap();
        let config = ToolConfig::load(&path).unwrap();
        assert_eq!(config.log_level, Level::Warn);
        assert!(ToolConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn discover_honours_explicit_env_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "gopath_mode = \"environment\"\n").unwrap();
        env::set_var(CONFIG_ENV, &path);
        let config = ToolConfig::discover();
        env::remove_var(CONFIG_ENV);
        assert_eq!(config.unwrap().gopath_mode, GoPathMode::Environment);
    }
}
