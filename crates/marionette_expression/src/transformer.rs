//! Persona-driven rewriting of seed material.
//!
//! Posts are wrapped in the archetype's fixed opening and closing lines.
//! Replies are picked from a candidate pool: the archetype's base replies
//! plus every bonus reply whose topic appears in the target text. Templates
//! are returned verbatim.

use crate::keywords::extract_topics;
use marionette_core::{Archetype, RandomSource, Topic};
use serde::Serialize;
use std::collections::BTreeSet;

/// Archetype used for replies when an actor carries no usable persona.
pub const FALLBACK_ARCHETYPE: Archetype = Archetype::Sympathetic;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledPost {
    pub title: String,
    pub body: String,
}

/// Wrap a seed body in the persona's voice. Title passes through.
/// Without a persona the body is left as is.
pub fn style_new_post(raw_title: &str, raw_body: &str, persona: Option<Archetype>) -> StyledPost {
    let body = match persona {
        Some(archetype) => {
            let p = archetype.persona();
            format!("{}\n\n{}\n\n{}", p.opening, raw_body, p.closing)
        }
        None => raw_body.to_string(),
    };
    StyledPost {
        title: raw_title.to_string(),
        body,
    }
}

/// Every template eligible for `(persona, topics)`, base replies first.
pub fn reply_candidates(persona: Option<Archetype>, topics: &BTreeSet<Topic>) -> Vec<&'static str> {
    let p = persona.unwrap_or(FALLBACK_ARCHETYPE).persona();
    p.base_replies
        .iter()
        .copied()
        .chain(
            p.bonus_replies
                .iter()
                .filter(|(topic, _)| topics.contains(topic))
                .map(|(_, text)| *text),
        )
        .collect()
}

/// Pick a reply to `target_body` in the persona's voice.
pub fn style_reply(target_body: &str, persona: Option<Archetype>, rng: &dyn RandomSource) -> String {
    let topics = extract_topics(target_body);
    let candidates = reply_candidates(persona, &topics);
    tracing::debug!(
        archetype = %persona.unwrap_or(FALLBACK_ARCHETYPE),
        ?topics,
        pool = candidates.len(),
        "Selecting reply template"
    );
    // Base pools are never empty, so the index is always valid.
    candidates[rng.index(candidates.len())].to_string()
}
