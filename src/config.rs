//! Policy configuration snapshot.
//!
//! The engine consumes a [`Config`] read-only. The source form is a JSON
//! object with camelCase keys; application class lists may be given either
//! as a comma separated string (`"zoom, kruler"`) or as an array of strings.
//! A key with a malformed value falls back to that option's default so a
//! single typo never disables the whole policy.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::{DEFAULT_EXCLUDED_FOREGROUND, DEFAULT_SHELL_CLASSES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("configuration root must be an object")]
    NotAnObject,
}

/// Case-insensitive set of application classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "ListSource")]
pub struct AppClassList(BTreeSet<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum ListSource {
    Joined(String),
    Items(Vec<String>),
}

impl From<ListSource> for AppClassList {
    fn from(source: ListSource) -> Self {
        match source {
            ListSource::Joined(joined) => AppClassList::parse(&joined),
            ListSource::Items(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

impl AppClassList {
    /// Parse the comma separated source form. Entries are trimmed and
    /// lowercased; empty entries are dropped.
    pub fn parse(source: &str) -> Self {
        source.split(',').collect()
    }

    pub fn contains(&self, class: &str) -> bool {
        let class = class.trim();
        if class.is_empty() {
            return false;
        }
        self.0.contains(&class.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for AppClassList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_lowercase)
                .collect(),
        )
    }
}

/// Include/exclude filtering for one role (foreground or background).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleFilter {
    pub exclude: bool,
    pub excluded: AppClassList,
    pub include: bool,
    pub included: AppClassList,
}

impl RoleFilter {
    /// True when `class` is dropped from this role.
    pub fn rejects(&self, class: &str) -> bool {
        (self.exclude && self.excluded.contains(class))
            || (self.include && !self.included.contains(class))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Restore automatically minimized windows once they are uncovered.
    pub auto_restore: bool,
    /// Activate a recent window when nothing sensible is active.
    pub auto_reactivate: bool,
    pub ignore_nonnormal: bool,
    /// Ignore launcher/panel popups (see `shell_classes`) unless fullscreen.
    pub ignore_shell: bool,
    pub shell_classes: AppClassList,
    /// Dialogs never cover their parent or siblings.
    pub ignore_transient: bool,
    pub foreground: RoleFilter,
    pub background: RoleFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_restore: true,
            auto_reactivate: true,
            ignore_nonnormal: true,
            ignore_shell: true,
            shell_classes: AppClassList::parse(DEFAULT_SHELL_CLASSES),
            ignore_transient: true,
            foreground: RoleFilter {
                exclude: true,
                excluded: AppClassList::parse(DEFAULT_EXCLUDED_FOREGROUND),
                ..RoleFilter::default()
            },
            background: RoleFilter::default(),
        }
    }
}

impl Config {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(source)?;
        let Value::Object(map) = value else {
            return Err(ConfigError::NotAnObject);
        };
        Ok(Self::from_map(&map))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    /// Load `path`, falling back to the defaults if it cannot be read or
    /// parsed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "using default configuration");
                Self::default()
            }
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        Self {
            auto_restore: field(map, "autoRestore", defaults.auto_restore),
            auto_reactivate: field(map, "autoReactivate", defaults.auto_reactivate),
            ignore_nonnormal: field(map, "ignoreNonnormal", defaults.ignore_nonnormal),
            ignore_shell: field(map, "ignoreShell", defaults.ignore_shell),
            shell_classes: field(map, "shellClasses", defaults.shell_classes),
            ignore_transient: field(map, "ignoreTransient", defaults.ignore_transient),
            foreground: RoleFilter {
                exclude: field(map, "excludeForeground", defaults.foreground.exclude),
                excluded: field(map, "excludedAppsForeground", defaults.foreground.excluded),
                include: field(map, "includeForeground", defaults.foreground.include),
                included: field(map, "includedAppsForeground", defaults.foreground.included),
            },
            background: RoleFilter {
                exclude: field(map, "excludeBackground", defaults.background.exclude),
                excluded: field(map, "excludedAppsBackground", defaults.background.excluded),
                include: field(map, "includeBackground", defaults.background.include),
                included: field(map, "includedAppsBackground", defaults.background.included),
            },
        }
    }
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str, default: T) -> T {
    let Some(value) = map.get(key) else {
        return default;
    };
    match T::deserialize(value) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(key, %err, "invalid configuration value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_parse_trims_lowercases_and_drops_empty() {
        let list = AppClassList::parse(" Zoom ,kruler,, ,Firefox");
        assert_eq!(list.len(), 3);
        assert!(list.contains("zoom"));
        assert!(list.contains("ZOOM"));
        assert!(list.contains("firefox"));
        assert!(!list.contains(""));
        assert!(AppClassList::parse("").is_empty());
    }

    #[test]
    fn role_filter_modes_are_independent() {
        let mut filter = RoleFilter::default();
        assert!(!filter.rejects("anything"));

        filter.exclude = true;
        filter.excluded = AppClassList::parse("zoom");
        assert!(filter.rejects("zoom"));
        assert!(!filter.rejects("konsole"));

        filter.exclude = false;
        filter.include = true;
        filter.included = AppClassList::parse("konsole");
        assert!(!filter.rejects("konsole"));
        assert!(filter.rejects("zoom"));

        // include enabled with an empty list rejects everything
        filter.included = AppClassList::default();
        assert!(filter.rejects("konsole"));
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.foreground.excluded.contains("kruler"));
        assert!(config.shell_classes.contains("krunner"));
    }

    #[test]
    fn lists_accept_strings_and_arrays() {
        let config = Config::from_json_str(
            r#"{
                "excludeForeground": true,
                "excludedAppsForeground": "Zoom, Spectacle",
                "includeBackground": true,
                "includedAppsBackground": ["Dolphin", " okular "]
            }"#,
        )
        .unwrap();
        assert!(config.foreground.excluded.contains("spectacle"));
        assert!(!config.foreground.excluded.contains("kruler"));
        assert!(config.background.include);
        assert!(config.background.included.contains("okular"));
        assert_eq!(config.background.included.len(), 2);
    }

    #[test]
    fn malformed_values_fall_back_per_key() {
        let config = Config::from_json_str(
            r#"{
                "autoRestore": "yes please",
                "autoReactivate": false,
                "excludedAppsForeground": 42,
                "unknownKey": [1, 2, 3]
            }"#,
        )
        .unwrap();
        assert!(config.auto_restore);
        assert!(!config.auto_reactivate);
        assert_eq!(config.foreground.excluded, Config::default().foreground.excluded);
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert!(matches!(
            Config::from_json_str("[true]"),
            Err(ConfigError::NotAnObject)
        ));
        assert!(matches!(
            Config::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
