mod keywords;
mod transformer;

pub use keywords::extract_topics;
pub use transformer::{
    reply_candidates, style_new_post, style_reply, StyledPost, FALLBACK_ARCHETYPE,
};
