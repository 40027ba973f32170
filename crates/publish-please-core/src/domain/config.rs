//! Publish configuration resolution.
//!
//! A [`ResolvedConfig`] is built once per run from three layers, later
//! layers winning key by key (objects are merged recursively):
//!
//! 1. built-in defaults, including each validation's default setting
//! 2. the project-local `.publishrc` JSON file, when present
//! 3. caller overrides
//!
//! A `null` in a later layer leaves the earlier value in place.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::error::{PublishError, Result};

/// Project-local configuration file name.
pub const CONFIG_FILE: &str = ".publishrc";

pub const DEFAULT_PUBLISH_COMMAND: &str = "npm publish";
pub const DEFAULT_PUBLISH_TAG: &str = "latest";
pub const DEFAULT_PRE_PUBLISH_SCRIPT: &str = "npm test";

/// Options object accepted by validations that take structured settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Glob patterns excluded from the validation.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Resolved setting of a single validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationSetting {
    /// `false` disables the validation, `true` enables it with defaults.
    Flag(bool),
    /// Enabled with a textual parameter (branch name or pattern, tag prefix).
    Text(String),
    /// Enabled with structured options.
    Options(ValidationOptions),
}

impl ValidationSetting {
    pub fn enabled() -> Self {
        ValidationSetting::Flag(true)
    }

    pub fn disabled() -> Self {
        ValidationSetting::Flag(false)
    }

    /// Only an explicit `false` disables a validation.
    pub fn is_disabled(&self) -> bool {
        matches!(self, ValidationSetting::Flag(false))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ValidationSetting::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Ignore globs, empty unless the setting is an options object.
    pub fn ignore_globs(&self) -> &[String] {
        match self {
            ValidationSetting::Options(options) => &options.ignore,
            _ => &[],
        }
    }
}

impl From<bool> for ValidationSetting {
    fn from(value: bool) -> Self {
        ValidationSetting::Flag(value)
    }
}

impl From<&str> for ValidationSetting {
    fn from(value: &str) -> Self {
        ValidationSetting::Text(value.to_string())
    }
}

/// Fully resolved, read-only publish configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub confirm: bool,
    pub publish_command: String,
    pub publish_tag: String,
    pub pre_publish_script: Option<String>,
    pub post_publish_script: Option<String>,
    validations: BTreeMap<String, ValidationSetting>,
}

impl ResolvedConfig {
    /// Resolve configuration for `project_dir`.
    ///
    /// `validation_defaults` supplies the default setting of every known
    /// validation key; `overrides` is merged last.
    pub fn resolve<I>(
        project_dir: &Path,
        validation_defaults: I,
        overrides: Option<&Value>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, ValidationSetting)>,
    {
        let mut merged = default_value(validation_defaults)?;
        if let Some(file) = read_config_file(project_dir)? {
            merge_values(&mut merged, file);
        }
        if let Some(overrides) = overrides {
            merge_values(&mut merged, overrides.clone());
        }
        Self::from_value(&merged)
    }

    /// Build from already merged JSON, without touching the filesystem.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or(PublishError::InvalidConfig)?;

        let confirm = match obj.get("confirm") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(b)) => *b,
            Some(other) => return Err(invalid("confirm", other)),
        };

        let publish_command = text_or(obj, "publishCommand", DEFAULT_PUBLISH_COMMAND)?;
        let publish_tag = text_or(obj, "publishTag", DEFAULT_PUBLISH_TAG)?;
        let pre_publish_script = script(obj, "prePublishScript")?;
        let post_publish_script = script(obj, "postPublishScript")?;

        let mut validations = BTreeMap::new();
        match obj.get("validations") {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (key, raw) in map {
                    if raw.is_null() {
                        continue;
                    }
                    let setting: ValidationSetting = serde_json::from_value(raw.clone())
                        .map_err(|e| PublishError::InvalidSetting {
                            key: format!("validations.{key}"),
                            reason: e.to_string(),
                        })?;
                    validations.insert(key.clone(), setting);
                }
            }
            Some(other) => return Err(invalid("validations", other)),
        }

        Ok(Self {
            confirm,
            publish_command,
            publish_tag,
            pre_publish_script,
            post_publish_script,
            validations,
        })
    }

    /// Setting for a validation key, if the key is known.
    pub fn validation(&self, key: &str) -> Option<&ValidationSetting> {
        self.validations.get(key)
    }

    pub fn validations(&self) -> impl Iterator<Item = (&str, &ValidationSetting)> {
        self.validations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replace a validation setting. Used by the interactive configurator
    /// while it assembles a new configuration.
    pub fn set_validation(&mut self, key: impl Into<String>, setting: ValidationSetting) {
        self.validations.insert(key.into(), setting);
    }

    /// JSON shape written to `.publishrc`.
    pub fn to_value(&self) -> Value {
        let validations: Map<String, Value> = self
            .validations
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(Value::Null)))
            .collect();
        json!({
            "confirm": self.confirm,
            "validations": validations,
            "publishTag": self.publish_tag,
            "prePublishScript": self.pre_publish_script.clone().unwrap_or_default(),
            "postPublishScript": self.post_publish_script.clone().unwrap_or_default(),
            "publishCommand": self.publish_command,
        })
    }

    /// Write the configuration to `<project_dir>/.publishrc`.
    pub fn save(&self, project_dir: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.to_value())?;
        std::fs::write(project_dir.join(CONFIG_FILE), content)?;
        Ok(())
    }
}

/// Built-in defaults as JSON, so the file and overrides merge over them.
fn default_value<I>(validation_defaults: I) -> Result<Value>
where
    I: IntoIterator<Item = (String, ValidationSetting)>,
{
    let mut validations = Map::new();
    for (key, setting) in validation_defaults {
        validations.insert(key, serde_json::to_value(setting)?);
    }
    Ok(json!({
        "confirm": true,
        "validations": validations,
        "publishTag": DEFAULT_PUBLISH_TAG,
        "prePublishScript": DEFAULT_PRE_PUBLISH_SCRIPT,
        "postPublishScript": "",
        "publishCommand": DEFAULT_PUBLISH_COMMAND,
    }))
}

fn read_config_file(project_dir: &Path) -> Result<Option<Value>> {
    let path = project_dir.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    debug!(path = %path.display(), "loading publish configuration");
    let value: Value = serde_json::from_str(&content).map_err(|_| PublishError::InvalidConfig)?;
    if !value.is_object() {
        return Err(PublishError::InvalidConfig);
    }
    Ok(Some(value))
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key, `null` keeps the base value, anything else
/// replaces it.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        if !value.is_null() {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn invalid(key: &str, value: &Value) -> PublishError {
    PublishError::InvalidSetting {
        key: key.to_string(),
        reason: format!("unexpected value {value}"),
    }
}

fn text_or(obj: &Map<String, Value>, key: &str, default: &str) -> Result<String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(invalid(key, other)),
    }
}

/// Scripts accept a command string; `""`, `false` and `null` mean none.
fn script(obj: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid(key, other)),
    }
}
