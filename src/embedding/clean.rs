// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text clean-up applied to every string before it is embedded.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Runs of this many spaces or more collapse to a single space.
const SPACE_RUN: &str = r" {5,}";

static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(SPACE_RUN).expect("valid regex"));

/// Collapses long runs of spaces left behind by document extraction.
///
/// URLs end at whitespace, so collapsing space runs never alters one.
/// Shorter runs, tabs, and newlines are kept as they are.
pub fn clean_text(text: &str) -> Cow<'_, str> {
    SPACE_RUN_RE.replace_all(text, " ")
}
