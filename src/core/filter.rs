//! Per-package include/exclude rules for file inventories.

use std::collections::HashMap;

use regex::Regex;

use crate::core::PackageName;

/// Default include pattern: keep everything.
pub const DEFAULT_INCLUDE: &str = ".*";

/// Default exclude pattern: build by-products that never belong in an installer.
pub const DEFAULT_EXCLUDE: &str = r"\.(la|o|obj|pdb|cmt|cmti|annot|pyc|pyo)$";

/// An include/exclude regex pair.
///
/// A path is kept when it matches `include` and does not match `exclude`.
#[derive(Debug, Clone)]
pub struct FilterRule {
    include: Regex,
    exclude: Regex,
}

impl FilterRule {
    /// Compile a rule from its two patterns.
    pub fn new(include: &str, exclude: &str) -> Result<Self, regex::Error> {
        Ok(FilterRule {
            include: Regex::new(include)?,
            exclude: Regex::new(exclude)?,
        })
    }

    /// The process-wide default rule.
    pub fn default_rule() -> Self {
        FilterRule {
            include: Regex::new(DEFAULT_INCLUDE).expect("default include pattern is valid"),
            exclude: Regex::new(DEFAULT_EXCLUDE).expect("default exclude pattern is valid"),
        }
    }

    /// Whether a path survives the include-then-exclude filter.
    pub fn keeps(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }

    pub fn include(&self) -> &str {
        self.include.as_str()
    }

    pub fn exclude(&self) -> &str {
        self.exclude.as_str()
    }
}

impl Default for FilterRule {
    fn default() -> Self {
        Self::default_rule()
    }
}

/// Read-only lookup table of filter rules keyed by package name.
///
/// Populated before crawling; packages without an explicit rule get the
/// fallback rule.
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    fallback: FilterRule,
    rules: HashMap<PackageName, FilterRule>,
}

impl FilterRules {
    /// Create a table with the given fallback rule and no per-package rules.
    pub fn new(fallback: FilterRule) -> Self {
        FilterRules {
            fallback,
            rules: HashMap::new(),
        }
    }

    /// Add a per-package rule.
    pub fn with_rule(mut self, name: impl Into<PackageName>, rule: FilterRule) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    /// Resolve the rule for a package.
    pub fn lookup(&self, name: &PackageName) -> &FilterRule {
        self.rules.get(name).unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &FilterRule {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_drops_byproducts() {
        let rule = FilterRule::default_rule();
        assert!(rule.keeps("/mingw64/bin/ocaml.exe"));
        assert!(rule.keeps("/mingw64/lib/libz.a"));
        assert!(!rule.keeps("/mingw64/lib/libz.la"));
        assert!(!rule.keeps("/mingw64/lib/ocaml/stdlib.cmti"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let rule = FilterRule::new("/bin/", r"\.dll$").unwrap();
        assert!(rule.keeps("/root/bin/p.exe"));
        assert!(!rule.keeps("/root/bin/q.dll"));
        assert!(!rule.keeps("/root/lib/p.cma"));
    }

    #[test]
    fn test_lookup_falls_back() {
        let rules = FilterRules::default()
            .with_rule("ocaml", FilterRule::new(".*", r"\.cma$").unwrap());

        assert_eq!(rules.lookup(&"ocaml".into()).exclude(), r"\.cma$");
        assert_eq!(rules.lookup(&"zlib".into()).exclude(), DEFAULT_EXCLUDE);
        assert_eq!(rules.len(), 1);
    }
}
