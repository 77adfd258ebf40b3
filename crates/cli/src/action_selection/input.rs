use std::io::{stdin, stdout, Write};

use nhx_kit_core::error::Result;

use super::types::{MenuChoice, RunChoice};
use super::{CLEAR_LOG_OPTION, QUIT_OPTION, RUN_OPTION};

/// Interprets one line typed at the menu prompt.
///
/// Numbers are 1-based list positions; anything else that is not a single
/// option character is taken as an action ID. Returns None for blank input
/// or a number outside the list.
pub fn parse_menu_choice(input: &str, action_count: usize) -> Option<MenuChoice> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(number) = input.parse::<usize>() {
        return (1..=action_count)
            .contains(&number)
            .then(|| MenuChoice::Index(number - 1));
    }

    let mut chars = input.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        match c.to_ascii_lowercase() {
            RUN_OPTION => return Some(MenuChoice::Run),
            CLEAR_LOG_OPTION => return Some(MenuChoice::ClearLog),
            QUIT_OPTION => return Some(MenuChoice::Quit),
            _ => {}
        }
    }

    Some(MenuChoice::ActionId(input.to_string()))
}

/// Reads menu choices until one is valid; end of input quits.
pub fn prompt_menu_choice(action_count: usize) -> Result<MenuChoice> {
    loop {
        print!(
            "Escolha [1-{action_count}] ou ID, {RUN_OPTION}: executar, {CLEAR_LOG_OPTION}: limpar log, {QUIT_OPTION}: sair > "
        );
        stdout().flush()?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            return Ok(MenuChoice::Quit);
        }

        if let Some(choice) = parse_menu_choice(&input, action_count) {
            return Ok(choice);
        }
    }
}

/// Interprets an answer to the run confirmation; blank means yes.
pub fn parse_confirmation(input: &str) -> Option<RunChoice> {
    match input.trim().to_lowercase().as_str() {
        "" | "s" | "y" => Some(RunChoice::Yes),
        "n" => Some(RunChoice::No),
        _ => None,
    }
}

/// Confirms with the operator whether the action should be run
pub fn confirm_action_should_run(title: &str) -> Result<RunChoice> {
    loop {
        print!("Executar {title}? ([S]im/[n]ao): ");
        stdout().flush()?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            return Ok(RunChoice::No);
        }

        if let Some(choice) = parse_confirmation(&input) {
            return Ok(choice);
        }
    }
}
