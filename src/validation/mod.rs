//! Pull request content validation.
//!
//! Classifies a PR from its changed-file list before it enters the vote:
//!
//! - `Accepted` - the PR goes to the community vote
//! - `MetaRequired` - the PR needs a maintainer, not a vote
//! - `Rejected(reasons)` - the PR touches blacklisted files; the author may fix
//!   it and ask for reverification
//!
//! Validation is pure. The caller fetches the file list through the gateway.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the whitelisted extensions decide whether a PR is "meta".
///
/// Both readings have been used in practice and they disagree on PRs that mix
/// extensions, so the choice is a configuration flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionPolicy {
    /// Any file NOT ending in a whitelisted extension makes the PR meta.
    ///
    /// The whitelist lists what the community may vote on. Takes precedence
    /// over blacklist reasons.
    #[default]
    Strict,

    /// Any file ending in a whitelisted extension makes the PR meta.
    ///
    /// The whitelist lists what maintainers must look at.
    Permissive,
}

/// Blacklist and whitelist configuration for the validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Exact file paths (compared case-insensitively) a PR may not touch.
    pub blacklisted_files: Vec<String>,

    /// File-name suffixes (compared case-insensitively), e.g. `.md`.
    pub whitelisted_file_extensions: Vec<String>,

    /// How `whitelisted_file_extensions` is interpreted.
    pub extension_policy: ExtensionPolicy,
}

impl ValidationRules {
    fn is_blacklisted(&self, file: &str) -> bool {
        self.blacklisted_files
            .iter()
            .any(|bad| bad.to_lowercase() == file.to_lowercase())
    }

    fn has_whitelisted_extension(&self, file: &str) -> bool {
        let file = file.to_lowercase();
        self.whitelisted_file_extensions
            .iter()
            .any(|ext| file.ends_with(&ext.to_lowercase()))
    }

    fn requires_meta(&self, file: &str) -> bool {
        match self.extension_policy {
            ExtensionPolicy::Strict => !self.has_whitelisted_extension(file),
            ExtensionPolicy::Permissive => self.has_whitelisted_extension(file),
        }
    }
}

/// Why a PR was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The PR changes a blacklisted file.
    BlacklistedFile { file: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::BlacklistedFile { file } => {
                write!(f, "- Changes a blacklisted file: {}", file)
            }
        }
    }
}

/// Result of validating a PR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reasons", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// The PR enters the vote.
    Accepted,

    /// The PR is routed to manual review.
    MetaRequired,

    /// The PR is rejected; always carries at least one reason.
    Rejected(Vec<RejectionReason>),
}

/// Renders rejection reasons one per line, for a fenced block in a comment.
pub fn format_reasons(reasons: &[RejectionReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classifies a PR from its changed files.
///
/// Meta classification takes precedence over blacklist reasons: if any file
/// triggers it, the PR is `MetaRequired` regardless of what else it touches.
/// Otherwise each blacklisted file contributes exactly one reason.
pub fn validate_files<S: AsRef<str>>(files: &[S], rules: &ValidationRules) -> ValidationOutcome {
    if files.iter().any(|f| rules.requires_meta(f.as_ref())) {
        return ValidationOutcome::MetaRequired;
    }

    let reasons: Vec<RejectionReason> = files
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| rules.is_blacklisted(f))
        .map(|f| RejectionReason::BlacklistedFile {
            file: f.to_string(),
        })
        .collect();

    if reasons.is_empty() {
        ValidationOutcome::Accepted
    } else {
        ValidationOutcome::Rejected(reasons)
    }
}
