//! Type definitions for the menu.

/// What the operator asked for at the menu prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    /// Zero-based position in the action list.
    Index(usize),
    ActionId(String),
    Run,
    ClearLog,
    Quit,
}

/// Represents the operator's answer when confirming a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunChoice {
    Yes,
    No,
}
