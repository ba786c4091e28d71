use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    magic::{
        DEFAULT_ENTRY_FUNCTION, DEFAULT_ENTRY_MODULE, DEFAULT_STRINGER_METHOD, ENV_CONFIG_PATH,
    },
    utils::error::{GoError, GoResult},
};

/// Names the engine treats specially during activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoConfig {
    /// Activating a module with this name runs its entry function.
    pub entry_module: String,
    pub entry_function: String,
    /// Receiver methods with this name double as the representation hook.
    pub stringer_method: String,
}

impl Default for GoConfig {
    fn default() -> Self {
        Self {
            entry_module: DEFAULT_ENTRY_MODULE.to_string(),
            entry_function: DEFAULT_ENTRY_FUNCTION.to_string(),
            stringer_method: DEFAULT_STRINGER_METHOD.to_string(),
        }
    }
}

impl GoConfig {
    /// Get the default path to the configuration file.
    pub fn default_path() -> PathBuf {
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push("gocore");
        path.push("config.toml");
        path
    }

    /// Parse a configuration from TOML source. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str, file: &str) -> GoResult<Self> {
        toml::from_str(source).map_err(|e| GoError::ConfigParseError {
            source: e,
            file: file.to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> GoResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str, &path.display().to_string())
    }

    /// Load the configuration at [`GoConfig::default_path`], or the defaults if
    /// there is no such file.
    pub fn load_or_default() -> GoResult<Self> {
        let path = Self::default_path();
        if path.is_file() {
            Self::load_from_toml(&path)
        } else {
            Ok(Self::default())
        }
    }
}
