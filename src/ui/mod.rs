//! Line-oriented shell for the `newsdesk` binary.
//!
//! - `commands` - parsing input lines into [`Command`]s
//! - `render` - plain-text views of articles, blogs and status
//! - `loop_runner` - the read-eval-print loop and terminal confirmation

mod commands;
mod loop_runner;
mod render;

pub use commands::{parse, Command, ParseError};
pub use loop_runner::{execute_line, run, Action, StdinConfirm};
