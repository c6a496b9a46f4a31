//! Reuse of recent ratings.
//!
//! A [`RatingCache`] sits in front of the pipeline: it serves a stored rating while it is
//! fresh, and otherwise lets exactly one caller per artifact compute a new one.

mod rating_cache;
mod store;
mod store_lock;

pub use rating_cache::{RatingCache, is_fresh};
pub use store::{FileRatingStore, MemoryRatingStore, RatingStore, sanitize_path_component};

const LOG_TARGET: &str = "     cache";
