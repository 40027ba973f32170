//! The six built-in pre-release validations.

pub mod branch;
pub mod git_tag;
pub mod sensitive_data;
pub mod uncommitted_changes;
pub mod untracked_files;
pub mod vulnerable_dependencies;

pub use branch::BranchValidation;
pub use git_tag::GitTagValidation;
pub use sensitive_data::SensitiveDataValidation;
pub use uncommitted_changes::UncommittedChangesValidation;
pub use untracked_files::UntrackedFilesValidation;
pub use vulnerable_dependencies::VulnerableDependenciesValidation;
