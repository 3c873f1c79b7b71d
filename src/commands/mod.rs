//! # Command System
//!
//! Slash command definitions, per-feature handlers, and registry dispatch.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod context;
pub mod handler;
pub mod handlers;
pub mod registry;
pub mod slash;

pub use crate::command_handler::CommandHandler;
pub use context::CommandContext;
pub use handler::SlashCommandHandler;
pub use registry::CommandRegistry;
pub use slash::{
    create_slash_commands, get_bool_option, get_integer_option, get_string_option,
    register_global_commands, register_guild_commands,
};
