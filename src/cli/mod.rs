//! CLI module - command-line interface
//!
//! Contains the REPL, the interactive session and command parsing.

pub mod commands;
pub mod repl;
pub mod session;

pub use repl::{default_target, print_report, Repl};
pub use session::{spawn_interrupt_handler, Interrupt, Session, Target};
