pub mod cache;
pub mod filter;
pub mod reddit;
pub mod source;

pub use cache::{FeedCache, Snapshot};
pub use filter::FeedFilter;
pub use reddit::RedditHotSource;
pub use source::{validate_url, FixtureSource};
