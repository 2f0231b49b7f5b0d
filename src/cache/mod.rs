//! In-process content cache.
//!
//! Claude clients resend large system/context blobs verbatim on every turn.
//! The cache remembers content it has seen before so the gateway can collapse
//! a repeated first user part down to a short tail, cutting upstream token
//! spend without changing semantics.

mod store;

pub use store::{CacheStats, ContentCache};
pub(crate) use store::collapse_cached_content;
