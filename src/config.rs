use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Formatting attributes that can be switched off for a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoredFormats {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub double_underline: bool,
    pub strikethrough: bool,
    pub double_strikethrough: bool,
    pub subscript: bool,
    pub superscript: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Adds empty Heading 2, Heading 3 and Response columns to the report.
    pub add_columns: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub folder_path: Option<PathBuf>,
    pub filename_delimiter: String,
    pub comment_bubble_delimiter: String,
    pub include_replies: bool,
    pub output: Option<PathBuf>,
    pub ignore_formatting: IgnoredFormats,
    pub response: ResponseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            folder_path: None,
            filename_delimiter: "-".to_string(),
            comment_bubble_delimiter: String::new(),
            include_replies: false,
            output: None,
            ignore_formatting: IgnoredFormats::default(),
            response: ResponseConfig::default(),
        }
    }
}

impl Config {
    /// Loads a TOML config file. A missing file yields `Ok(None)`.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, Error> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", config_path.display()))
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("failed to parse {}: {e}", config_path.display()))
        })?;
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_is_none() {
        let loaded = Config::load_from_path("/definitely/not/here/config.toml").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
comment_bubble_delimiter = ":"
include_replies = true

[ignore_formatting]
double_underline = true
"#
        )
        .unwrap();

        let config = Config::load_from_path(file.path()).unwrap().unwrap();
        assert_eq!(config.filename_delimiter, "-");
        assert_eq!(config.comment_bubble_delimiter, ":");
        assert!(config.include_replies);
        assert!(config.ignore_formatting.double_underline);
        assert!(!config.ignore_formatting.bold);
        assert!(!config.response.add_columns);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "include_replies = maybe").unwrap();
        let err = Config::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
