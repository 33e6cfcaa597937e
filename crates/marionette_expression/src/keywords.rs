//! Topic tagging for reply targets.
//!
//! Plain case-insensitive substring matching against the keyword lists in
//! [`Topic::keywords`]. Several topics may match one text.

use marionette_core::Topic;
use std::collections::BTreeSet;

pub fn extract_topics(text: &str) -> BTreeSet<Topic> {
    let lower = text.to_lowercase();
    Topic::ALL
        .into_iter()
        .filter(|topic| topic.keywords().iter().any(|kw| lower.contains(kw)))
        .collect()
}
