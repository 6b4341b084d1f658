//! NSIS rendering for manifests, section stubs, edges and descriptions.
//!
//! Every artifact that names a package goes through [`ident`] so the same
//! identifier is produced everywhere.

use crate::core::manifest::{Directive, Manifest};
use crate::core::{DependencyEdge, PackageName, Visibility};

/// Directory, relative to the output root, holding per-package manifests.
pub const MANIFEST_DIR: &str = "manifests";

/// Transliterate a package name into a legal NSIS identifier.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`.
pub fn ident(name: &PackageName) -> String {
    name.as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Section identifier for a package, e.g. `SEC_mingw_w64_zlib`.
pub fn section_ident(name: &PackageName) -> String {
    format!("SEC_{}", ident(name))
}

/// Manifest path for a package, relative to the output root.
pub fn manifest_file(name: &PackageName) -> String {
    format!("{}/{}.nsh", MANIFEST_DIR, ident(name))
}

/// Escape a value for use inside a double-quoted NSIS string.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' => out.push_str("$$"),
            '"' => out.push_str("$\\\""),
            '\r' | '\n' | '\t' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Render a manifest as `SetOutPath` / `File` lines.
pub fn render_manifest(manifest: &Manifest) -> String {
    let mut out = String::new();
    for directive in manifest.directives() {
        match directive {
            Directive::SetOutPath { dir } => {
                if dir.is_empty() {
                    out.push_str("SetOutPath \"$INSTDIR\"\n");
                } else {
                    out.push_str(&format!(
                        "SetOutPath \"$INSTDIR\\{}\"\n",
                        escape(&dir.replace('/', "\\"))
                    ));
                }
            }
            Directive::File { entry } => {
                out.push_str(&format!(
                    "File \"{}\"\n",
                    escape(&entry.source().to_string_lossy())
                ));
            }
        }
    }
    out
}

/// Render one section stub.
///
/// Visible sections are user-selectable; hidden sections carry a leading
/// `-` and are read-only so they are always installed.
pub fn render_section(name: &PackageName, visibility: Visibility) -> String {
    let mut out = String::new();
    match visibility {
        Visibility::Visible => {
            out.push_str(&format!(
                "Section \"{}\" {}\n",
                escape(name.as_str()),
                section_ident(name)
            ));
        }
        Visibility::Hidden => {
            out.push_str(&format!(
                "Section \"-{}\" {}\n",
                escape(name.as_str()),
                section_ident(name)
            ));
            out.push_str("  SectionIn RO\n");
        }
    }
    out.push_str(&format!("  !include \"{}\"\n", manifest_file(name)));
    out.push_str("SectionEnd\n\n");
    out
}

/// Render one edge line: `<dependent> <dependency>`.
pub fn render_edge(edge: &DependencyEdge) -> String {
    format!(
        "{} {}\n",
        section_ident(&edge.dependent),
        section_ident(&edge.dependency)
    )
}

/// Render the description string for a visible package.
pub fn render_description(name: &PackageName, description: &str) -> String {
    format!(
        "LangString DESC_{} ${{LANG_ENGLISH}} \"{}\"\n",
        section_ident(name),
        escape(description)
    )
}

/// Render the directive binding a description to its section.
pub fn render_description_binding(name: &PackageName) -> String {
    let sec = section_ident(name);
    format!(
        "  !insertmacro MUI_DESCRIPTION_TEXT ${{{}}} $(DESC_{})\n",
        sec, sec
    )
}
