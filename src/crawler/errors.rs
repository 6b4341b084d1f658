//! Crawl error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error while crawling the registry or building a manifest.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("`{package}` lists `{}`, which does not exist", .path.display())]
    MissingFile { package: String, path: PathBuf },

    #[error("`{package}` lists `{path}`, which is outside the install root `{root}`")]
    OutsideRoot {
        package: String,
        path: String,
        root: String,
    },

    #[error("registry query for `{package}` failed: {message}")]
    Registry { package: String, message: String },

    #[error("`{first}` and `{second}` both map to the installer identifier `{ident}`")]
    IdentifierCollision {
        ident: String,
        first: String,
        second: String,
    },

    #[error("invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl CrawlError {
    pub(crate) fn registry(package: &impl ToString, err: anyhow::Error) -> Self {
        CrawlError::Registry {
            package: package.to_string(),
            message: format!("{:#}", err),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CrawlError::MissingFile { package, path } => Diagnostic::error(format!(
                "file inventory of `{}` is inconsistent with the filesystem",
                package
            ))
            .with_context(format!("missing: {}", path.display()))
            .with_suggestion(format!("Reinstall `{}` to restore its files", package))
            .with_suggestion(
                "Check `layout.filesystem_root` if the registry runs under a different root"
                    .to_string(),
            ),

            CrawlError::OutsideRoot {
                package,
                path,
                root,
            } => Diagnostic::error(format!(
                "`{}` installs files outside `{}`",
                package, root
            ))
            .with_context(format!("path: {}", path))
            .with_suggestion(format!(
                "Add a `[filters.rules.\"{}\"]` exclude pattern for these files",
                package
            ))
            .with_suggestion("Adjust `layout.install_root`".to_string()),

            CrawlError::Registry { package, message } => {
                Diagnostic::error(format!("registry query for `{}` failed", package))
                    .with_context(message.clone())
                    .with_suggestion("Check that the package is installed".to_string())
            }

            CrawlError::IdentifierCollision {
                ident,
                first,
                second,
            } => Diagnostic::error(format!(
                "packages `{}` and `{}` cannot both be packaged",
                first, second
            ))
            .with_context(format!("shared identifier: {}", ident))
            .with_context(format!("manifest: manifests/{}.nsh", ident))
            .with_suggestion(format!(
                "Exclude one of them from the selection, or uninstall `{}`",
                second
            )),

            CrawlError::InvalidPattern(e) => Diagnostic::error("invalid filter pattern")
                .with_context(e.to_string())
                .with_suggestion("Fix the pattern under `[filters]`".to_string()),
        }
    }
}
