//! Registry of named matchers.
//!
//! A test suite builds one registry before any test runs, usually into a
//! `static` [`OnceLock`](std::sync::OnceLock), and only reads from it
//! afterwards:
//!
//! ```rust
//! use std::sync::OnceLock;
//! use framematch::MatcherRegistry;
//!
//! fn matchers() -> &'static MatcherRegistry {
//!     static MATCHERS: OnceLock<MatcherRegistry> = OnceLock::new();
//!     MATCHERS.get_or_init(MatcherRegistry::with_image_matchers)
//! }
//!
//! assert!(matchers().get("toBeSimilarToImage").is_some());
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::matcher::{resolve_reference, ImageMatcher, Matcher, MatcherOutcome, Predicate};
use crate::{CompareError, MatchParams};

/// Named matchers, looked up by the name a test asserts with.
#[derive(Default)]
pub struct MatcherRegistry {
    matchers: BTreeMap<String, Box<dyn Matcher>>,
}

impl std::fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherRegistry")
            .field("matchers", &self.matchers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MatcherRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding `toBeSimilarToImage` and
    /// `toBeIdenticalToImage` with default parameters.
    #[must_use]
    pub fn with_image_matchers() -> Self {
        let mut registry = Self::new();
        install_image_matchers(&mut registry);
        registry
    }

    /// Adds a matcher under its own name, returning the one it replaced.
    pub fn register(&mut self, matcher: impl Matcher + 'static) -> Option<Box<dyn Matcher>> {
        let name = matcher.name().to_string();
        debug!("registering matcher '{name}'");
        self.matchers.insert(name, Box::new(matcher))
    }

    /// Looks a matcher up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Matcher> {
        self.matchers.get(name).map(AsRef::as_ref)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.matchers.keys().map(String::as_str)
    }

    /// Number of registered matchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Runs the matcher called `name`, resolving a relative `expected`
    /// against `caller_dir`.
    ///
    /// # Errors
    /// Returns [`CompareError::UnknownMatcher`] for an unregistered name, or
    /// the comparison error if the images can't be compared.
    pub fn evaluate(
        &self,
        name: &str,
        actual: impl AsRef<Path>,
        expected: impl AsRef<Path>,
        caller_dir: impl AsRef<Path>,
    ) -> Result<MatcherOutcome, CompareError> {
        let matcher = self.get(name).ok_or_else(|| CompareError::UnknownMatcher {
            name: name.to_string(),
        })?;
        let expected = resolve_reference(caller_dir.as_ref(), expected.as_ref());
        matcher.compare(actual.as_ref(), &expected)
    }
}

/// Installs both image matchers with default parameters.
pub fn install_image_matchers(registry: &mut MatcherRegistry) {
    install_image_matchers_with(registry, &MatchParams::default());
}

/// Installs both image matchers configured by `params`.
pub fn install_image_matchers_with(registry: &mut MatcherRegistry, params: &MatchParams) {
    for predicate in Predicate::ALL {
        registry.register(ImageMatcher::with_params(predicate, params));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysPass;

    impl Matcher for AlwaysPass {
        fn name(&self) -> &str {
            "toBeAnything"
        }

        fn compare(&self, _: &Path, _: &Path) -> Result<MatcherOutcome, CompareError> {
            Ok(MatcherOutcome::pass())
        }
    }

    #[test]
    fn test_with_image_matchers() {
        let registry = MatcherRegistry::with_image_matchers();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            ["toBeIdenticalToImage", "toBeSimilarToImage"]
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = MatcherRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.register(AlwaysPass).is_none());
        assert!(registry.register(AlwaysPass).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_matcher() {
        let registry = MatcherRegistry::with_image_matchers();
        let result = registry.evaluate("toBeBlank", "a.png", "b.png", "/tmp");
        assert!(matches!(
            result,
            Err(CompareError::UnknownMatcher { ref name }) if name == "toBeBlank"
        ));
    }

    #[test]
    fn test_custom_matcher() {
        let mut registry = MatcherRegistry::new();
        registry.register(AlwaysPass);
        let outcome = registry
            .evaluate("toBeAnything", "a.png", "b.png", "/tmp")
            .unwrap();
        assert!(outcome.pass);
    }

    #[test]
    fn test_debug_lists_names() {
        let registry = MatcherRegistry::with_image_matchers();
        let debug = format!("{registry:?}");
        assert!(debug.contains("toBeSimilarToImage"));
    }
}
