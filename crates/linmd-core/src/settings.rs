//! User-facing sync settings and the per-call template configuration.
//!
//! [`SyncSettings`] is what gets persisted and edited. Each pull or push
//! takes a fresh [`TemplateConfig`] snapshot from it, so an edit made between
//! two calls applies to the next call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LinmdError, Result};
use crate::template::DateFormat;

/// Default filename template.
pub const DEFAULT_FILENAME_FORMAT: &str = "${title}.md";

/// Setting names accepted by [`SyncSettings::get_key`] and [`SyncSettings::set_key`].
pub const SETTING_KEYS: &[&str] = &[
    "enable_code_lens",
    "filename_format",
    "date_format",
    "create_directory",
    "directory_format",
    "skip_frontmatter",
    "custom_frontmatter_fields",
];

/// How pulled files are grouped into subdirectories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryFormat {
    #[default]
    None,
    /// One directory per team name.
    Team,
    /// One directory per workflow state name.
    Status,
}

impl DirectoryFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Team => "team",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for DirectoryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectoryFormat {
    type Err = LinmdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "team" => Ok(Self::Team),
            "status" => Ok(Self::Status),
            other => Err(LinmdError::Config(format!(
                "unknown directory format '{other}': expected team, status or none"
            ))),
        }
    }
}

/// Persisted sync settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Show inline sync actions on linked documents.
    #[serde(alias = "enableCodeLens")]
    pub enable_code_lens: bool,
    #[serde(alias = "filenameFormat")]
    pub filename_format: String,
    #[serde(alias = "dateFormat")]
    pub date_format: DateFormat,
    /// Group pulled files into subdirectories per [`DirectoryFormat`].
    #[serde(alias = "createDirectory")]
    pub create_directory: bool,
    #[serde(alias = "directoryFormat")]
    pub directory_format: DirectoryFormat,
    /// Write pulled files without a metadata block.
    #[serde(alias = "skipFrontmatter")]
    pub skip_frontmatter: bool,
    /// Dotted attribute paths to copy into the metadata block.
    #[serde(alias = "customFrontmatterFields")]
    pub custom_frontmatter_fields: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enable_code_lens: true,
            filename_format: DEFAULT_FILENAME_FORMAT.to_string(),
            date_format: DateFormat::Ymd,
            create_directory: false,
            directory_format: DirectoryFormat::None,
            skip_frontmatter: false,
            custom_frontmatter_fields: Vec::new(),
        }
    }
}

/// Immutable configuration captured at the start of one sync call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    pub filename_template: String,
    pub date_format: DateFormat,
    pub bucketing: DirectoryFormat,
    pub skip_frontmatter: bool,
    pub extra_fields: Vec<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        SyncSettings::default().template_config()
    }
}

impl SyncSettings {
    /// Snapshot the settings one sync call works from.
    ///
    /// Bucketing only applies when `create_directory` is on.
    #[must_use]
    pub fn template_config(&self) -> TemplateConfig {
        TemplateConfig {
            filename_template: self.filename_format.clone(),
            date_format: self.date_format,
            bucketing: if self.create_directory {
                self.directory_format
            } else {
                DirectoryFormat::None
            },
            skip_frontmatter: self.skip_frontmatter,
            extra_fields: self.custom_frontmatter_fields.clone(),
        }
    }

    /// Read a setting as text.
    ///
    /// # Errors
    ///
    /// Returns [`LinmdError::Config`] for an unknown key.
    pub fn get_key(&self, key: &str) -> Result<String> {
        Ok(match canonical_key(key)? {
            "enable_code_lens" => self.enable_code_lens.to_string(),
            "filename_format" => self.filename_format.clone(),
            "date_format" => self.date_format.to_string(),
            "create_directory" => self.create_directory.to_string(),
            "directory_format" => self.directory_format.to_string(),
            "skip_frontmatter" => self.skip_frontmatter.to_string(),
            _ => self.custom_frontmatter_fields.join(","),
        })
    }

    /// Update a setting from text. Lists are comma-separated.
    ///
    /// # Errors
    ///
    /// Returns [`LinmdError::Config`] for an unknown key or an invalid value.
    pub fn set_key(&mut self, key: &str, raw: &str) -> Result<()> {
        let raw = raw.trim();
        match canonical_key(key)? {
            "enable_code_lens" => self.enable_code_lens = parse_bool(key, raw)?,
            "filename_format" => {
                if raw.is_empty() {
                    return Err(LinmdError::Config(
                        "filename_format cannot be empty".to_string(),
                    ));
                }
                self.filename_format = raw.to_string();
            }
            "date_format" => self.date_format = raw.parse()?,
            "create_directory" => self.create_directory = parse_bool(key, raw)?,
            "directory_format" => self.directory_format = raw.parse()?,
            "skip_frontmatter" => self.skip_frontmatter = parse_bool(key, raw)?,
            _ => {
                self.custom_frontmatter_fields = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
        Ok(())
    }
}

/// Map a snake_case or camelCase setting name onto its canonical form.
fn canonical_key(key: &str) -> Result<&'static str> {
    let snake: String = key
        .chars()
        .flat_map(|c| {
            if c.is_ascii_uppercase() {
                vec!['_', c.to_ascii_lowercase()]
            } else {
                vec![c]
            }
        })
        .collect();
    SETTING_KEYS
        .iter()
        .copied()
        .find(|k| *k == snake)
        .ok_or_else(|| {
            LinmdError::Config(format!(
                "unknown setting '{key}': expected one of {}",
                SETTING_KEYS.join(", ")
            ))
        })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    raw.parse()
        .map_err(|_| LinmdError::Config(format!("{key} expects true or false, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = SyncSettings::default();
        assert!(s.enable_code_lens);
        assert_eq!(s.filename_format, "${title}.md");
        assert_eq!(s.date_format, DateFormat::Ymd);
        assert_eq!(s.directory_format, DirectoryFormat::None);
        assert!(!s.skip_frontmatter);
        assert!(s.custom_frontmatter_fields.is_empty());
    }

    #[test]
    fn bucketing_requires_create_directory() {
        let mut s = SyncSettings {
            directory_format: DirectoryFormat::Team,
            ..SyncSettings::default()
        };
        assert_eq!(s.template_config().bucketing, DirectoryFormat::None);
        s.create_directory = true;
        assert_eq!(s.template_config().bucketing, DirectoryFormat::Team);
    }

    #[test]
    fn set_key_accepts_camel_and_snake_case() {
        let mut s = SyncSettings::default();
        s.set_key("dateFormat", "ISO").unwrap();
        s.set_key("directory_format", "status").unwrap();
        s.set_key("customFrontmatterFields", "priority, team.name,,").unwrap();
        assert_eq!(s.date_format, DateFormat::Iso);
        assert_eq!(s.directory_format, DirectoryFormat::Status);
        assert_eq!(s.custom_frontmatter_fields, vec!["priority", "team.name"]);
        assert_eq!(s.get_key("custom_frontmatter_fields").unwrap(), "priority,team.name");
    }

    #[test]
    fn set_key_rejects_bad_input() {
        let mut s = SyncSettings::default();
        assert!(s.set_key("colour", "red").is_err());
        assert!(s.set_key("skipFrontmatter", "yes").is_err());
        assert!(s.set_key("filename_format", "  ").is_err());
        assert!(s.set_key("directory_format", "project").is_err());
        assert_eq!(s, SyncSettings::default());
    }

    #[test]
    fn settings_deserialize_with_camel_case_aliases() {
        let json = r#"{"filenameFormat": "${date}-${title}.md", "dateFormat": "DMY", "createDirectory": true}"#;
        let s: SyncSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.filename_format, "${date}-${title}.md");
        assert_eq!(s.date_format, DateFormat::Dmy);
        assert!(s.create_directory);
        assert!(s.enable_code_lens);
    }
}
