//! Interactive action selection and log rendering.
//!
//! This module provides the terminal interface of nhx: the numbered action
//! list, the status badge, the live activity log and the prompts.
//!
//! # User Interface
//!
//! At the prompt the operator can type:
//! - a list number or an action ID to select an action
//! - 'r' to run (or re-run) the selected action
//! - 'c' to clear the log
//! - 'q' to quit

pub mod colors;
pub mod input;
pub mod types;
pub mod ui;

pub use input::{confirm_action_should_run, parse_menu_choice, prompt_menu_choice};
pub use types::{MenuChoice, RunChoice};

/// Character used to run the selected action
pub const RUN_OPTION: char = 'r';

/// Character used to clear the activity log
pub const CLEAR_LOG_OPTION: char = 'c';

/// Character used to quit
pub const QUIT_OPTION: char = 'q';
