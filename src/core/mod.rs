//! # Core Module
//!
//! Configuration, embed builders, and Discord message-size helpers.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod config;
pub mod embeds;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use response::{chunk_text, truncate_for_embed, truncate_for_message, EMBED_LIMIT, MESSAGE_LIMIT};
