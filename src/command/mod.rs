//! Command dispatch infrastructure for the control channel
//!
//! This module handles:
//! - Mapping trigger tokens to handler objects
//! - The built-in trigger set (`UPDATE`, `RESET`, `RECONF`, `INFO`, `VERSION`)
//! - Late handler registration by external collaborators

mod registry;
pub mod handlers;

pub use registry::{CommandHandler, CommandRegistry};
