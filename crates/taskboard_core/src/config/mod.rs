use crate::error::AppError;
use crate::model::{Category, Priority};
use crate::stats::OverdueGranularity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKBOARD_CONFIG_PATH";

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        if self.accent.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.accent, text, self.reset)
        }
    }

    pub fn mutedize(&self, text: &str) -> String {
        if self.muted.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.muted, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("noir") => Palette {
            accent: "\x1b[38;5;203m",
            muted: "\x1b[38;5;244m",
            reset: "\x1b[0m",
        },
        Some("solarized") => Palette {
            accent: "\x1b[38;5;166m",
            muted: "\x1b[38;5;109m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let cleaned = canonical_key(raw);
    if cleaned.is_empty() {
        return Some("default".into());
    }

    match cleaned.as_str() {
        "vanilla" | "light" => Some("default".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        other => Some(other.to_string()),
    }
}

/// Lowercases and collapses every run of non-alphanumerics into one `_`.
pub fn canonical_key(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    cleaned.trim_matches('_').to_string()
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub default_priority: Option<Priority>,
    #[serde(default)]
    pub default_category: Option<Category>,
    #[serde(default)]
    pub overdue: OverdueGranularity,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Config {
    pub fn palette(&self) -> Palette {
        palette_for_theme(self.theme.as_deref())
    }

    /// Replaces the first word of `args` with its alias expansion, if any.
    pub fn expand_alias(&self, args: Vec<String>) -> Vec<String> {
        let Some(first) = args.first() else {
            return args;
        };
        let Some(expansion) = self.aliases.get(first) else {
            return args;
        };

        let mut expanded: Vec<String> = expansion.split_whitespace().map(str::to_string).collect();
        expanded.extend(args.into_iter().skip(1));
        expanded
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub default_priority: Option<Priority>,
    pub default_category: Option<Category>,
    pub overdue: Option<OverdueGranularity>,
    pub aliases: HashMap<String, String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskboard")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskboard")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable config");
            ConfigLoad {
                config: Config::default(),
                error: Some(err),
            }
        }
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(normalized) = overrides.theme.as_deref().and_then(canonical_theme_name) {
        merged.theme = Some(normalized);
    }
    if overrides.default_priority.is_some() {
        merged.default_priority = overrides.default_priority;
    }
    if overrides.default_category.is_some() {
        merged.default_category = overrides.default_category;
    }
    if let Some(overdue) = overrides.overdue {
        merged.overdue = overdue;
    }

    for (alias, value) in overrides.aliases.iter() {
        merged.aliases.insert(alias.clone(), value.clone());
    }

    merged
}

/// Parses one `KEY=VALUE` override into `overrides`.
///
/// Keys: `theme`, `default_priority`, `default_category`, `overdue` and
/// `aliases.NAME`.
pub fn apply_override(overrides: &mut ConfigOverrides, raw: &str) -> Result<(), AppError> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| AppError::invalid_input("override must be in KEY=VALUE format"))?;
    let value = value_raw.trim();

    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field = canonical_key(field);
    if canonical_field.is_empty() {
        return Err(AppError::invalid_input("override key cannot be empty"));
    }

    if remainder.is_some() && !matches!(canonical_field.as_str(), "aliases" | "alias") {
        return Err(AppError::invalid_input(format!(
            "{canonical_field} override cannot have subfields"
        )));
    }

    match canonical_field.as_str() {
        "theme" => overrides.theme = Some(value.to_string()),
        "default_priority" | "priority" => overrides.default_priority = Some(value.parse()?),
        "default_category" | "category" => overrides.default_category = Some(value.parse()?),
        "overdue" => overrides.overdue = Some(value.parse()?),
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| AppError::invalid_input("aliases override requires an alias name"))?;
            overrides
                .aliases
                .insert(alias_name.to_string(), value.to_string());
        }
        other => {
            return Err(AppError::invalid_input(format!(
                "unknown config field '{other}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, apply_override, canonical_theme_name, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides, palette_for_theme,
    };
    use crate::model::{Category, Priority};
    use crate::stats::OverdueGranularity;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskboard-{nanos}-{file_name}"))
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_data"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "theme": "Dark Mode",
            "default_priority": "high",
            "default_category": "trabajo",
            "overdue": "day",
            "aliases": {
                "ls": "list --status pending"
            }
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.theme.as_deref(), Some("noir"));
        assert_eq!(loaded.default_priority, Some(Priority::High));
        assert_eq!(loaded.default_category, Some(Category::Work));
        assert_eq!(loaded.overdue, OverdueGranularity::Day);
        assert_eq!(
            loaded.aliases.get("ls").map(String::as_str),
            Some("list --status pending")
        );
    }

    #[test]
    fn merge_overrides_updates_fields_and_keeps_base() {
        let base = Config {
            theme: Some("default".into()),
            aliases: [("ls".into(), "list".into())].into_iter().collect(),
            ..Config::default()
        };

        let mut overrides = ConfigOverrides::default();
        apply_override(&mut overrides, "theme=Noir").unwrap();
        apply_override(&mut overrides, "default_priority = alta").unwrap();
        apply_override(&mut overrides, "overdue=day").unwrap();
        apply_override(&mut overrides, "aliases. pend = list --status pending").unwrap();

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.theme.as_deref(), Some("noir"));
        assert_eq!(merged.default_priority, Some(Priority::High));
        assert_eq!(merged.default_category, None);
        assert_eq!(merged.overdue, OverdueGranularity::Day);
        assert_eq!(merged.aliases.len(), 2);
        assert_eq!(base.theme.as_deref(), Some("default"));
        assert!(!base.aliases.contains_key("pend"));
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            theme: Some("solarized".into()),
            default_category: Some(Category::Study),
            ..Config::default()
        };

        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn apply_override_rejects_bad_input() {
        let mut overrides = ConfigOverrides::default();

        let missing_equals = apply_override(&mut overrides, "themenoir").unwrap_err();
        assert!(missing_equals.message().contains("KEY=VALUE"));

        let unknown = apply_override(&mut overrides, "colour=red").unwrap_err();
        assert!(unknown.message().contains("unknown config field"));

        let empty_alias = apply_override(&mut overrides, "aliases. = list").unwrap_err();
        assert!(empty_alias.message().contains("requires an alias name"));

        let bad_priority = apply_override(&mut overrides, "default_priority=urgent").unwrap_err();
        assert_eq!(bad_priority.code(), "invalid_input");

        assert!(apply_override(&mut overrides, "theme.sub=noir").is_err());
    }

    #[test]
    fn expand_alias_replaces_first_word_only() {
        let config = Config {
            aliases: [("pend".into(), "list --status pending".into())]
                .into_iter()
                .collect(),
            ..Config::default()
        };

        assert_eq!(
            config.expand_alias(args(&["pend", "--search", "milk"])),
            args(&["list", "--status", "pending", "--search", "milk"])
        );
        assert_eq!(config.expand_alias(args(&["stats"])), args(&["stats"]));
        assert!(config.expand_alias(Vec::new()).is_empty());
    }

    #[test]
    fn canonical_theme_name_maps_variants() {
        assert_eq!(canonical_theme_name("Vanilla"), Some("default".into()));
        assert_eq!(canonical_theme_name("Noir"), Some("noir".into()));
        assert_eq!(canonical_theme_name("dark-mode"), Some("noir".into()));
        assert_eq!(canonical_theme_name("  "), Some("default".into()));
    }

    #[test]
    fn palette_for_theme_returns_palette() {
        assert!(palette_for_theme(Some("vanilla")).accent.is_empty());
        assert!(palette_for_theme(None).muted.is_empty());

        let noir = palette_for_theme(Some("noir"));
        assert_eq!(noir.accentize("3"), "\x1b[38;5;203m3\x1b[0m");

        assert!(palette_for_theme(Some("oceanic")).accent.is_empty());
    }
}
