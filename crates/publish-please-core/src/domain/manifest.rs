//! `package.json` access.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::error::{PublishError, Result};

pub const MANIFEST_FILE: &str = "package.json";

/// Parsed `package.json`. The raw document is kept so that rewrites
/// preserve unknown keys and their order.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    path: PathBuf,
    raw: Map<String, Value>,
}

impl Manifest {
    pub fn exists(project_dir: &Path) -> bool {
        project_dir.join(MANIFEST_FILE).is_file()
    }

    /// Read `<project_dir>/package.json`.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(MANIFEST_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PublishError::ManifestMissing)
            }
            Err(e) => return Err(e.into()),
        };
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| PublishError::InvalidManifest(e.to_string()))?;
        match value {
            Value::Object(raw) => Ok(Self { path, raw }),
            _ => Err(PublishError::InvalidManifest(
                "top-level value is not an object".to_string(),
            )),
        }
    }

    pub fn name(&self) -> &str {
        self.str_field("name").unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.str_field("version").unwrap_or_default()
    }

    /// Tarball name produced by `npm pack`: scoped names drop the `@` and
    /// replace `/` with `-`.
    pub fn artifact_name(&self) -> String {
        let name = self.name().trim_start_matches('@').replace('/', "-");
        format!("{name}-{}.tgz", self.version())
    }

    pub fn script(&self, name: &str) -> Option<&str> {
        self.raw.get("scripts")?.get(name)?.as_str()
    }

    /// Set `scripts.<name>`, creating the `scripts` object if needed.
    pub fn set_script(&mut self, name: &str, command: impl Into<String>) {
        let scripts = self
            .raw
            .entry("scripts")
            .or_insert_with(|| Value::Object(Map::new()));
        if !scripts.is_object() {
            *scripts = Value::Object(Map::new());
        }
        if let Value::Object(map) = scripts {
            map.insert(name.to_string(), Value::String(command.into()));
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write back to disk with two-space indentation and a trailing newline.
    pub fn save(&self) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.raw)?;
        content.push('\n');
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, content: &str) {
        std::fs::write(dir.join(MANIFEST_FILE), content).unwrap();
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!Manifest::exists(dir.path()));
        let err = Manifest::load(dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "package.json file doesn't exist.");
    }

    #[test]
    fn test_fields_and_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            r#"{"name": "testing-repo", "version": "0.0.0", "scripts": {"test": "mocha"}}"#,
        );
        let manifest = Manifest::load(dir.path()).unwrap();
        assert_eq!(manifest.name(), "testing-repo");
        assert_eq!(manifest.version(), "0.0.0");
        assert_eq!(manifest.artifact_name(), "testing-repo-0.0.0.tgz");
        assert_eq!(manifest.script("test"), Some("mocha"));
        assert_eq!(manifest.script("prepublishOnly"), None);
    }

    #[test]
    fn test_scoped_artifact_name() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), r#"{"name": "@scope/pkg", "version": "1.2.3"}"#);
        let manifest = Manifest::load(dir.path()).unwrap();
        assert_eq!(manifest.artifact_name(), "scope-pkg-1.2.3.tgz");
    }

    #[test]
    fn test_set_script_keeps_key_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), r#"{"version": "1.0.0", "name": "a", "private": true}"#);
        let mut manifest = Manifest::load(dir.path()).unwrap();
        manifest.set_script("publish-please", "publish-please");
        manifest.save().unwrap();

        let saved = std::fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let version_at = saved.find("\"version\"").unwrap();
        let name_at = saved.find("\"name\"").unwrap();
        let scripts_at = saved.find("\"scripts\"").unwrap();
        assert!(version_at < name_at && name_at < scripts_at);
        assert!(saved.ends_with('\n'));

        let reloaded = Manifest::load(dir.path()).unwrap();
        assert_eq!(reloaded.script("publish-please"), Some("publish-please"));
    }

    #[test]
    fn test_invalid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "[1, 2]");
        assert!(matches!(
            Manifest::load(dir.path()),
            Err(PublishError::InvalidManifest(_))
        ));
    }
}
