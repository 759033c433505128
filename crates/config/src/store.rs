//! Persisted settings
//!
//! Settings live in `~/.config/luminance-hdr/settings.json`, grouped into
//! sections named by the registry's `GROUP_*` constants. Keys without a group
//! go to the `General` section.
//!
//! The store is addressed through [`SettingsKey`] only, so nothing outside the
//! registry can be written. Entries already on disk that the registry does not
//! know are kept as-is and written back on save.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::keys::{self, SettingsKey, LUMINANCEVERSION};
use crate::version::Version;
use crate::Color;

/// A stored value. The registry declares no value types; callers pick one
/// when reading through the typed getters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl SettingValue {
    /// Interpret command-line input: booleans, then integers, then floats, else text
    pub fn from_input(input: &str) -> Self {
        match input {
            "true" => return SettingValue::Bool(true),
            "false" => return SettingValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = input.parse::<i64>() {
            return SettingValue::Int(i);
        }
        if let Ok(f) = input.parse::<f64>() {
            if f.is_finite() {
                return SettingValue::Float(f);
            }
        }
        SettingValue::Text(input.to_string())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            SettingValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingValue::Float(f) => Some(*f),
            SettingValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Int(i) => write!(f, "{}", i),
            SettingValue::Float(v) => write!(f, "{}", v),
            SettingValue::Text(s) => f.write_str(s),
            SettingValue::List(items) => f.write_str(&items.join("\n")),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(value: Vec<String>) -> Self {
        SettingValue::List(value)
    }
}

impl From<Color> for SettingValue {
    fn from(value: Color) -> Self {
        SettingValue::Text(value.to_hex())
    }
}

type Sections = BTreeMap<String, BTreeMap<String, SettingValue>>;

/// On-disk layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct SettingsFile {
    /// LUMINANCEVERSION of the build that last saved the file
    #[serde(skip_serializing_if = "String::is_empty")]
    version: String,
    sections: Sections,
}

/// Get the path to the user settings file
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("luminance-hdr").join("settings.json"))
}

#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    file: SettingsFile,
}

impl SettingsStore {
    /// Empty store not bound to any file
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the user settings file. A missing file yields an empty store.
    pub fn load() -> Result<Self, ConfigError> {
        let path = settings_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file yields an empty store bound to `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let file = match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no settings at {}, starting empty", path.display());
                SettingsFile::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let store = Self {
            path: Some(path.to_path_buf()),
            file,
        };

        for (section, key) in store.unknown_entries() {
            log::warn!("{}: unknown setting {}/{} kept as-is", path.display(), section, key);
        }
        if store.needs_migration() {
            log::info!(
                "settings written by version {} (this is {})",
                store.file.version,
                LUMINANCEVERSION
            );
        }

        Ok(store)
    }

    /// File this store loads from and saves to, if bound
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Save to the bound path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => settings_path().ok_or(ConfigError::NoConfigDir)?,
        };
        self.save_to(&path)
    }

    /// Save to `path` (atomic write) and bind the store to it.
    ///
    /// Stamps the file with the running LUMINANCEVERSION.
    pub fn save_to(&mut self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        self.file.version = LUMINANCEVERSION.to_string();
        let json = serde_json::to_string_pretty(&self.file).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        // Write to temp file, then rename over the target
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, json).map_err(io_err)?;
        fs::rename(&temp, path).map_err(io_err)?;

        log::debug!("saved settings to {}", path.display());
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    pub fn get(&self, key: &SettingsKey) -> Option<&SettingValue> {
        self.file
            .sections
            .get(key.section_name())
            .and_then(|entries| entries.get(key.key))
    }

    pub fn contains(&self, key: &SettingsKey) -> bool {
        self.get(key).is_some()
    }

    /// Non-finite floats have no JSON form and are not stored
    pub fn set(&mut self, key: &SettingsKey, value: impl Into<SettingValue>) {
        let value = value.into();
        if let SettingValue::Float(f) = value {
            if !f.is_finite() {
                log::warn!("not storing {} = {}", key.key, f);
                return;
            }
        }
        self.file
            .sections
            .entry(key.section_name().to_string())
            .or_default()
            .insert(key.key.to_string(), value);
    }

    /// Remove a value, dropping the section once it is empty
    pub fn remove(&mut self, key: &SettingsKey) -> Option<SettingValue> {
        let section = key.section_name();
        let entries = self.file.sections.get_mut(section)?;
        let removed = entries.remove(key.key);
        if entries.is_empty() {
            self.file.sections.remove(section);
        }
        removed
    }

    // ========================================================================
    // Typed access
    // ========================================================================

    pub fn get_bool(&self, key: &SettingsKey, default: bool) -> bool {
        self.get(key).and_then(SettingValue::as_bool).unwrap_or(default)
    }

    pub fn get_int(&self, key: &SettingsKey, default: i64) -> i64 {
        self.get(key).and_then(SettingValue::as_int).unwrap_or(default)
    }

    pub fn get_float(&self, key: &SettingsKey, default: f64) -> f64 {
        self.get(key).and_then(SettingValue::as_float).unwrap_or(default)
    }

    pub fn get_text(&self, key: &SettingsKey, default: &str) -> String {
        self.get(key)
            .and_then(SettingValue::as_text)
            .unwrap_or(default)
            .to_string()
    }

    pub fn get_list(&self, key: &SettingsKey) -> Vec<String> {
        self.get(key)
            .and_then(SettingValue::as_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// Colors are stored as `#rrggbb` or `#rrggbbaa`
    pub fn get_color(&self, key: &SettingsKey, default: Color) -> Color {
        self.get(key)
            .and_then(SettingValue::as_text)
            .and_then(Color::from_hex_str)
            .unwrap_or(default)
    }

    // ========================================================================
    // Versioning
    // ========================================================================

    /// LUMINANCEVERSION recorded by the last save, None for a fresh store
    pub fn stored_version(&self) -> Option<&str> {
        if self.file.version.is_empty() {
            None
        } else {
            Some(&self.file.version)
        }
    }

    /// True when the file was last saved by a different (or unreadable) version
    pub fn needs_migration(&self) -> bool {
        match self.stored_version() {
            None => false,
            Some(stored) => match Version::parse(stored) {
                Ok(stored) => stored != Version::current(),
                Err(_) => true,
            },
        }
    }

    /// (section, key) pairs on disk that the registry does not declare
    pub fn unknown_entries(&self) -> Vec<(String, String)> {
        let mut unknown = Vec::new();
        for (section, entries) in &self.file.sections {
            for key in entries.keys() {
                let known = keys::find_by_token(key)
                    .map(|k| k.section_name() == section)
                    .unwrap_or(false);
                if !known {
                    unknown.push((section.clone(), key.clone()));
                }
            }
        }
        unknown
    }

    /// Every registered key that currently has a value, in registry order
    pub fn entries(&self) -> impl Iterator<Item = (&'static SettingsKey, &SettingValue)> + '_ {
        keys::KEYS
            .iter()
            .filter_map(move |key| self.get(key).map(|value| (key, value)))
    }
}
