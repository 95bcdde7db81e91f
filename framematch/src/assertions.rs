//! Panicking assertions for use inside `#[test]` functions.
//!
//! A failed match panics with the matcher's message. A comparison that
//! can't run at all (missing fixture, mismatched sizes) panics with a
//! different message so a broken test is not mistaken for a regression.

use std::path::Path;

use crate::matcher::{ImageMatcher, MatcherOutcome, Predicate};

/// Asserts that `actual` matches `expected` under `predicate`.
///
/// A relative `expected` is resolved against `caller_dir`.
///
/// # Panics
/// Panics if the images don't match, or if they can't be compared.
#[track_caller]
pub fn assert_image_matches(
    predicate: Predicate,
    actual: impl AsRef<Path>,
    expected: impl AsRef<Path>,
    caller_dir: impl AsRef<Path>,
) {
    let matcher = ImageMatcher::new(predicate);
    match matcher.evaluate(actual, expected, caller_dir) {
        Ok(MatcherOutcome { pass: true, .. }) => {}
        Ok(MatcherOutcome { message, .. }) => {
            panic!("{predicate}: {}", message.unwrap_or_default())
        }
        Err(err) => panic!("{predicate}: image comparison could not run: {err}"),
    }
}

/// Asserts that at least 80% of the pixels of two images match.
///
/// A relative expected path is resolved against the directory of the file
/// the macro is invoked from.
///
/// ```rust,no_run
/// # let screenshot = std::path::PathBuf::from("/tmp/title.png");
/// framematch::assert_similar_to_image!(&screenshot, "fixtures/title.png");
/// ```
#[macro_export]
macro_rules! assert_similar_to_image {
    ($actual:expr, $expected:expr $(,)?) => {
        $crate::assertions::assert_image_matches(
            $crate::Predicate::SimilarTo,
            $actual,
            $expected,
            $crate::caller_dir!(),
        )
    };
}

/// Asserts that every pixel of two images matches.
///
/// A relative expected path is resolved against the directory of the file
/// the macro is invoked from.
#[macro_export]
macro_rules! assert_identical_to_image {
    ($actual:expr, $expected:expr $(,)?) => {
        $crate::assertions::assert_image_matches(
            $crate::Predicate::IdenticalTo,
            $actual,
            $expected,
            $crate::caller_dir!(),
        )
    };
}
