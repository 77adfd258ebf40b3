//! NHX Kit CLI Library
//!
//! This crate provides the terminal host for nhx-kit. It lists the built-in
//! maintenance actions, lets the operator select and run them, and renders the
//! activity log and status badge as the run progresses.
//!
//! # Architecture
//!
//! - [`cli_args`]: Command-line argument parsing
//! - [`action_selection`]: Menu, prompts, badge and log rendering
//!
//! # Examples
//!
//! ```bash
//! # Interactive menu
//! nhx
//!
//! # Pre-select the network repair chain and skip confirmations
//! nhx --action netchain --force
//!
//! # Launch commands from another working directory
//! nhx --system-directory 'D:\Windows\System32'
//!
//! # Show diagnostics on stderr
//! RUST_LOG=debug nhx
//! ```

pub mod action_selection;
pub mod cli_args;
