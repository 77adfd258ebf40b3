//! Command-line argument parsing.
//!
//! This module defines the command-line interface of the `nhx` host using the
//! `clap` crate.

use clap::Parser;

/// Command-line arguments for the `nhx` maintenance kit.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use nhx_kit_cli::cli_args::Args;
///
/// let args = Args::parse_from(["nhx", "--action", "dns"]);
/// assert_eq!(args.action.as_deref(), Some("dns"));
/// ```
#[derive(Parser, Debug)]
#[command(term_width = 0)] // Just to make testing across clap features easier
pub struct Args {
    /// Working directory for every launched command.
    ///
    /// Tilde and environment variables are expanded. Defaults to the
    /// `System32` folder of the Windows directory.
    #[arg(long, short = 'd')]
    pub system_directory: Option<String>,

    /// Run actions without first confirming.
    #[arg(long, short = 'f', action)]
    pub force: bool,

    /// Action ID to select at start-up.
    ///
    /// The action is only selected; it still runs when asked to.
    #[arg(long, short = 'a')]
    pub action: Option<String>,
}
