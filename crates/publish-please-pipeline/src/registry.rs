//! Ordered, immutable set of validations.

use std::collections::HashSet;
use std::path::Path;

use publish_please_core::{NpmInfo, ResolvedConfig, ValidationSetting};

use crate::error::{PipelineError, Result};
use crate::validation::Validation;
use crate::validations::{
    BranchValidation, GitTagValidation, SensitiveDataValidation, UncommittedChangesValidation,
    UntrackedFilesValidation, VulnerableDependenciesValidation,
};

/// Registration order is run order and report order.
pub struct ValidationRegistry {
    validations: Vec<Box<dyn Validation>>,
}

impl ValidationRegistry {
    /// Build a registry; keys must be unique.
    pub fn new(validations: Vec<Box<dyn Validation>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for v in &validations {
            if !seen.insert(v.key()) {
                return Err(PipelineError::DuplicateValidation(v.key().to_string()));
            }
        }
        Ok(Self { validations })
    }

    /// The built-in validations, capability-checked against `npm`.
    pub fn standard(npm: NpmInfo) -> Self {
        Self {
            validations: vec![
                Box::new(VulnerableDependenciesValidation::new(npm.clone())),
                Box::new(SensitiveDataValidation::new(npm)),
                Box::new(UncommittedChangesValidation),
                Box::new(UntrackedFilesValidation),
                Box::new(BranchValidation),
                Box::new(GitTagValidation),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Validation> {
        self.validations.iter().map(|v| v.as_ref())
    }

    pub fn get(&self, key: &str) -> Option<&dyn Validation> {
        self.iter().find(|v| v.key() == key)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.iter().map(|v| v.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.validations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validations.is_empty()
    }

    pub fn defaults(&self) -> Vec<(String, ValidationSetting)> {
        self.iter()
            .map(|v| (v.key().to_string(), v.default_setting()))
            .collect()
    }

    /// Resolve configuration with this registry's defaults.
    pub fn resolve_config(
        &self,
        project_dir: &Path,
        overrides: Option<&serde_json::Value>,
    ) -> Result<ResolvedConfig> {
        Ok(ResolvedConfig::resolve(
            project_dir,
            self.defaults(),
            overrides,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let registry = ValidationRegistry::standard(NpmInfo::default());
        assert_eq!(
            registry.keys(),
            vec![
                "vulnerableDependencies",
                "sensitiveData",
                "uncommittedChanges",
                "untrackedFiles",
                "branch",
                "gitTag",
            ]
        );
        let texts: Vec<_> = registry.iter().map(|v| v.status_text()).collect();
        assert_eq!(
            texts,
            vec![
                "Checking for the vulnerable dependencies",
                "Checking for the sensitive and non-essential data in the npm package",
                "Checking for the uncommitted changes",
                "Checking for the untracked files",
                "Validating branch",
                "Validating git tag",
            ]
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = ValidationRegistry::new(vec![
            Box::new(BranchValidation),
            Box::new(BranchValidation),
        ]);
        assert!(matches!(
            result,
            Err(PipelineError::DuplicateValidation(key)) if key == "branch"
        ));
    }

    #[test]
    fn test_defaults() {
        let registry = ValidationRegistry::standard(NpmInfo::default());
        let defaults = registry.defaults();
        assert_eq!(defaults.len(), 6);
        assert!(defaults.contains(&("branch".to_string(), ValidationSetting::from("master"))));
        assert!(defaults.contains(&("gitTag".to_string(), ValidationSetting::enabled())));
    }
}
