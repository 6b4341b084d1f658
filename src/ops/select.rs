//! Top-level package selection.
//!
//! The top-level set is derived twice from the explicitly installed
//! packages: once through an allow-list (names matching any pattern) and
//! once through a deny-list (names matching no pattern). Both derivations
//! must agree; when the catalog drifts so that they don't, the run stops
//! before anything is written.

use std::collections::BTreeSet;

use regex::RegexSet;
use thiserror::Error;

use crate::core::PackageName;
use crate::util::diagnostic::Diagnostic;

/// Error while computing the top-level selection.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("allow-list and deny-list selections disagree")]
    Mismatch {
        allowed: BTreeSet<PackageName>,
        permitted: BTreeSet<PackageName>,
    },

    #[error("no explicitly installed package was selected")]
    Empty,

    #[error("invalid selection pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl SelectError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SelectError::Mismatch { allowed, permitted } => {
                let only_allowed: Vec<_> = allowed.difference(permitted).map(|n| n.as_str()).collect();
                let only_permitted: Vec<_> =
                    permitted.difference(allowed).map(|n| n.as_str()).collect();

                let mut diag =
                    Diagnostic::error("allow-list and deny-list selections disagree")
                        .with_context(format!("allow-list selects: {}", join(allowed)))
                        .with_context(format!("deny-list selects: {}", join(permitted)));

                if !only_allowed.is_empty() {
                    diag = diag.with_context(format!(
                        "only in allow-list: {}",
                        only_allowed.join(", ")
                    ));
                }
                if !only_permitted.is_empty() {
                    diag = diag.with_context(format!(
                        "only in deny-list: {}",
                        only_permitted.join(", ")
                    ));
                }

                diag.with_suggestion(
                    "Update `selection.allow` or `selection.deny` so both select the same packages"
                        .to_string(),
                )
            }

            SelectError::Empty => Diagnostic::error("no explicitly installed package was selected")
                .with_suggestion("Check the `selection.allow` patterns".to_string()),

            SelectError::InvalidPattern(e) => {
                Diagnostic::error("invalid selection pattern").with_context(e.to_string())
            }
        }
    }
}

fn join(names: &BTreeSet<PackageName>) -> String {
    if names.is_empty() {
        return "(none)".to_string();
    }
    names
        .iter()
        .map(|n| n.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Allow- and deny-list predicates over package names.
#[derive(Debug, Clone)]
pub struct Selection {
    allow: RegexSet,
    deny: RegexSet,
}

impl Selection {
    /// Compile both pattern lists.
    pub fn new<S: AsRef<str>>(allow: &[S], deny: &[S]) -> Result<Self, SelectError> {
        Ok(Selection {
            allow: RegexSet::new(allow.iter().map(|s| s.as_ref()))?,
            deny: RegexSet::new(deny.iter().map(|s| s.as_ref()))?,
        })
    }

    /// Names matched by any allow pattern.
    pub fn allowed(&self, installed: &[PackageName]) -> BTreeSet<PackageName> {
        installed
            .iter()
            .filter(|n| self.allow.is_match(n.as_str()))
            .cloned()
            .collect()
    }

    /// Names matched by no deny pattern.
    pub fn permitted(&self, installed: &[PackageName]) -> BTreeSet<PackageName> {
        installed
            .iter()
            .filter(|n| !self.deny.is_match(n.as_str()))
            .cloned()
            .collect()
    }

    /// Compute the agreed top-level set.
    pub fn select(&self, installed: &[PackageName]) -> Result<BTreeSet<PackageName>, SelectError> {
        let allowed = self.allowed(installed);
        let permitted = self.permitted(installed);

        if allowed != permitted {
            return Err(SelectError::Mismatch { allowed, permitted });
        }
        if allowed.is_empty() {
            return Err(SelectError::Empty);
        }

        tracing::info!("Selected {} top-level packages", allowed.len());
        for name in &allowed {
            tracing::debug!("top-level: {}", name);
        }
        Ok(allowed)
    }
}

/// Compute the top-level set from explicitly installed packages.
pub fn select_top_level<S: AsRef<str>>(
    installed: &[PackageName],
    allow: &[S],
    deny: &[S],
) -> Result<BTreeSet<PackageName>, SelectError> {
    Selection::new(allow, deny)?.select(installed)
}
