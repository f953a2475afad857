//! Optional TOML configuration.
//!
//! The DLL has no command line, so the file is located through the
//! `NATIVEINPUT_CONFIG` environment variable. Without it every setting takes
//! its default. All keys are optional:
//!
//! ```toml
//! [hook]
//! thread_name = "NativeInput RawInput"
//! window_class = "RawInputWindow"
//!
//! [log]
//! level = "debug"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable holding the path of the configuration file.
pub const CONFIG_ENV: &str = "NATIVEINPUT_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: InvalidSetting,
    },
}

/// A setting that parsed but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{field}` must not contain NUL characters")]
pub struct InvalidSetting {
    pub field: &'static str,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub hook: HookConfig,
    pub log: LogConfig,
}

/// Settings for the raw input worker thread and its window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HookConfig {
    /// Name given to the worker thread (visible in debuggers).
    pub thread_name: String,
    /// Window class registered for the message-only window.
    pub window_class: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            thread_name: "NativeInput RawInput".into(),
            window_class: "RawInputWindow".into(),
        }
    }
}

impl HookConfig {
    /// Both names end up as NUL-terminated OS strings; an embedded NUL would
    /// panic the thread spawn or truncate the class name.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        if self.thread_name.contains('\0') {
            return Err(InvalidSetting {
                field: "hook.thread_name",
            });
        }
        if self.window_class.contains('\0') {
            return Err(InvalidSetting {
                field: "hook.window_class",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Default `env_logger` filter. `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Config {
    /// Parses a configuration document. `origin` is only used in errors.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.hook.validate().map_err(|source| ConfigError::Invalid {
            path: origin.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Loads the file named by `NATIVEINPUT_CONFIG`, or defaults when unset.
    pub fn load() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        Config::from_toml_str(text, Path::new("test.toml"))
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.hook.window_class, "RawInputWindow");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse(
            r#"
            [hook]
            window_class = "NativeInputSink"

            [log]
            level = "nativeinput=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.hook.window_class, "NativeInputSink");
        assert_eq!(config.hook.thread_name, "NativeInput RawInput");
        assert_eq!(config.log.level, "nativeinput=debug");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        // No `background` switch: a message-only window never has focus, so
        // registration always uses RIDEV_INPUTSINK.
        let err = parse("[hook]\nbackground = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("test.toml"));
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        assert!(matches!(
            parse("[hook]\nthread_name = 7\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn nul_in_thread_name_is_rejected() {
        let err = parse("[hook]\nthread_name = \"a\\u0000b\"\n").unwrap_err();
        match err {
            ConfigError::Invalid { source, .. } => assert_eq!(source.field, "hook.thread_name"),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn nul_in_window_class_is_rejected() {
        let err = parse("[hook]\nwindow_class = \"Raw\\u0000Input\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("test.toml"));
    }

    #[test]
    fn validate_accepts_defaults_and_rejects_nul() {
        assert!(HookConfig::default().validate().is_ok());
        let config = HookConfig {
            thread_name: "worker\0".into(),
            ..HookConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(InvalidSetting {
                field: "hook.thread_name"
            })
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::from_file(Path::new("/nonexistent/nativeinput.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
