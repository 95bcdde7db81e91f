//! Named image predicates built on the comparator.
//!
//! Each predicate resolves the reference path against the directory of the
//! test that invoked it, runs a comparison, and applies its pass rule.
//! Comparison errors (missing files, mismatched sizes) are returned as `Err`
//! and never folded into a failing outcome: they mean the test itself is
//! broken, not that the screen looks wrong.

use std::path::{Path, PathBuf};

use log::trace;

use crate::compare::ImageComparator;
use crate::consts::{IDENTICAL_PERCENT, SIMILAR_PERCENT};
use crate::diff::{DifferenceEngine, PixelMatch};
use crate::{CompareError, MatchParams};

/// The two comparison policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// At least 80% of the pixels match.
    SimilarTo,
    /// Every pixel matches.
    IdenticalTo,
}

impl Predicate {
    /// All predicates, in registration order.
    pub const ALL: [Predicate; 2] = [Predicate::SimilarTo, Predicate::IdenticalTo];

    /// Name under which the predicate is registered.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SimilarTo => "toBeSimilarToImage",
            Self::IdenticalTo => "toBeIdenticalToImage",
        }
    }

    /// Looks a predicate up by its registered name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a matcher reports back to the assertion framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherOutcome {
    /// Whether the assertion holds.
    pub pass: bool,
    /// Failure description; present iff `pass` is false.
    pub message: Option<String>,
}

impl MatcherOutcome {
    /// A passing outcome.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            pass: true,
            message: None,
        }
    }

    /// A failing outcome with a message.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            pass: false,
            message: Some(message.into()),
        }
    }
}

/// A named comparison predicate over an actual and an expected image path.
pub trait Matcher: Send + Sync {
    /// Registered name.
    fn name(&self) -> &str;

    /// Compares `actual` against the already resolved `expected` path.
    ///
    /// # Errors
    /// Returns an error if the comparison can't run (decode failure,
    /// dimension mismatch).
    fn compare(&self, actual: &Path, expected: &Path) -> Result<MatcherOutcome, CompareError>;
}

/// Resolves a reference image path against the invoking test's directory.
///
/// Absolute paths are returned unchanged.
#[must_use]
pub fn resolve_reference(caller_dir: &Path, expected: &Path) -> PathBuf {
    let resolved = if expected.is_absolute() {
        expected.to_path_buf()
    } else {
        caller_dir.join(expected)
    };
    trace!(
        "resolved reference '{}' to '{}'",
        expected.display(),
        resolved.display()
    );
    resolved
}

/// A [`Predicate`] bound to a comparator.
#[derive(Debug, Clone)]
pub struct ImageMatcher<E = PixelMatch> {
    predicate: Predicate,
    required_percent: f64,
    comparator: ImageComparator<E>,
}

impl ImageMatcher {
    /// Matcher for `predicate` with default parameters.
    pub fn new(predicate: Predicate) -> Self {
        Self::with_params(predicate, &MatchParams::default())
    }

    /// The `toBeSimilarToImage` matcher.
    pub fn similar() -> Self {
        Self::new(Predicate::SimilarTo)
    }

    /// The `toBeIdenticalToImage` matcher.
    pub fn identical() -> Self {
        Self::new(Predicate::IdenticalTo)
    }

    /// Matcher for `predicate` configured by `params`.
    pub fn with_params(predicate: Predicate, params: &MatchParams) -> Self {
        let required_percent = match predicate {
            Predicate::SimilarTo => params.similar_percent(),
            Predicate::IdenticalTo => IDENTICAL_PERCENT,
        };
        Self {
            predicate,
            required_percent,
            comparator: ImageComparator::with_engine(params.engine()),
        }
    }
}

impl<E: DifferenceEngine> ImageMatcher<E> {
    /// Matcher for `predicate` backed by a custom difference engine.
    pub fn with_engine(predicate: Predicate, engine: E) -> Self {
        let required_percent = match predicate {
            Predicate::SimilarTo => SIMILAR_PERCENT,
            Predicate::IdenticalTo => IDENTICAL_PERCENT,
        };
        Self {
            predicate,
            required_percent,
            comparator: ImageComparator::with_engine(engine),
        }
    }

    /// The predicate this matcher applies.
    pub fn predicate(&self) -> Predicate {
        self.predicate
    }

    /// Minimum similarity needed to pass.
    pub fn required_percent(&self) -> f64 {
        self.required_percent
    }

    /// Applies the pass rule to a similarity percentage.
    pub fn judge(&self, similarity: f64) -> MatcherOutcome {
        match self.predicate {
            Predicate::SimilarTo if similarity >= self.required_percent => MatcherOutcome::pass(),
            Predicate::SimilarTo => MatcherOutcome::fail(format!(
                "Expected {}% of pixels to be the same, actual percentage was {similarity}%",
                self.required_percent
            )),
            Predicate::IdenticalTo if similarity == IDENTICAL_PERCENT => MatcherOutcome::pass(),
            Predicate::IdenticalTo => MatcherOutcome::fail(format!(
                "Expected an exact image match, however the real match was {similarity}%"
            )),
        }
    }

    /// Compares `actual` with `expected`, resolving a relative `expected`
    /// against `caller_dir`.
    ///
    /// # Errors
    /// Returns an error if either image can't be decoded or their
    /// dimensions differ.
    pub fn evaluate(
        &self,
        actual: impl AsRef<Path>,
        expected: impl AsRef<Path>,
        caller_dir: impl AsRef<Path>,
    ) -> Result<MatcherOutcome, CompareError> {
        let expected = resolve_reference(caller_dir.as_ref(), expected.as_ref());
        self.compare(actual.as_ref(), &expected)
    }
}

impl<E: DifferenceEngine> Matcher for ImageMatcher<E> {
    fn name(&self) -> &str {
        self.predicate.name()
    }

    fn compare(&self, actual: &Path, expected: &Path) -> Result<MatcherOutcome, CompareError> {
        let similarity = self.comparator.compare(actual, expected)?;
        Ok(self.judge(similarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_names() {
        assert_eq!(Predicate::SimilarTo.name(), "toBeSimilarToImage");
        assert_eq!(Predicate::IdenticalTo.name(), "toBeIdenticalToImage");
        assert_eq!(
            Predicate::from_name("toBeIdenticalToImage"),
            Some(Predicate::IdenticalTo)
        );
        assert_eq!(Predicate::from_name("toBeImage"), None);
    }

    #[test]
    fn test_similar_threshold_is_inclusive() {
        let matcher = ImageMatcher::similar();
        assert_eq!(matcher.judge(80.0), MatcherOutcome::pass());
        assert_eq!(matcher.judge(100.0), MatcherOutcome::pass());

        let outcome = matcher.judge(79.99);
        assert!(!outcome.pass);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Expected 80% of pixels to be the same, actual percentage was 79.99%")
        );
    }

    #[test]
    fn test_identical_requires_exact_match() {
        let matcher = ImageMatcher::identical();
        assert!(matcher.judge(100.0).pass);

        let outcome = matcher.judge(97.3);
        assert!(!outcome.pass);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Expected an exact image match, however the real match was 97.3%")
        );
    }

    #[test]
    fn test_identical_pass_implies_similar_pass() {
        let similar = ImageMatcher::similar();
        let identical = ImageMatcher::identical();
        for pct in [0.0, 50.0, 79.9, 80.0, 99.99, 100.0] {
            if identical.judge(pct).pass {
                assert!(similar.judge(pct).pass, "{pct}");
            }
        }
        assert!(similar.judge(90.0).pass && !identical.judge(90.0).pass);
    }

    #[test]
    fn test_custom_similar_percent() {
        let params = MatchParams::new().with_similar_percent(95.0);
        let matcher = ImageMatcher::with_params(Predicate::SimilarTo, &params);
        assert!(!matcher.judge(90.0).pass);
        assert_eq!(
            matcher.judge(90.0).message.as_deref(),
            Some("Expected 95% of pixels to be the same, actual percentage was 90%")
        );
    }

    #[test]
    fn test_resolve_reference() {
        let dir = Path::new("/project/tests");
        assert_eq!(
            resolve_reference(dir, Path::new("./fixtures/intro.png")),
            Path::new("/project/tests/fixtures/intro.png")
        );
        assert_eq!(
            resolve_reference(dir, Path::new("/abs/intro.png")),
            Path::new("/abs/intro.png")
        );
    }
}
