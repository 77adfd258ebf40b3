use std::fmt::Display;
use std::io::{stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Color::{DarkGreen, Reset, Yellow};
use crossterm::style::{
    Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};
use nhx_kit_core::controller::{RunController, Status};
use nhx_kit_core::error::Result;
use nhx_kit_core::log_sink::LogChange;

use super::colors::{severity_color, StatusColor};

const HEADER: &str = "NHX Kit - manutencao do Windows";

/// Pad a value to match the width of the largest value
fn pad_to_width_of<T: Display>(value: T, max_number: usize) -> String {
    let width = format!("{max_number}").len();
    format!("{:>width$}", value.to_string())
}

/// Prints the action list, the selected action and the badge.
pub fn print_menu(controller: &RunController) -> Result<()> {
    let mut stdout = stdout();
    let selected = controller.state().action();
    let count = controller.registry().len();

    queue!(
        stdout,
        Print("\n"),
        SetBackgroundColor(DarkGreen),
        Print(format!("  {HEADER}  ")),
        SetBackgroundColor(Reset),
        Print("\n"),
    )?;

    for (index, action) in controller.registry().enumerate().enumerate() {
        let info = action.info();
        let row = format!(
            "[{}] {:<10} {}",
            pad_to_width_of(index + 1, count),
            info.id,
            info
        );

        if selected.is_some_and(|selected| selected.id == info.id) {
            queue!(
                stdout,
                SetAttribute(Attribute::Bold),
                SetForegroundColor(Yellow),
                Print(row),
                SetAttribute(Attribute::Reset),
                ResetColor,
                Print("\n"),
            )?;
        } else {
            queue!(stdout, Print(row), Print("\n"))?;
        }
    }

    if let Some(info) = selected {
        queue!(
            stdout,
            Print("\n"),
            SetAttribute(Attribute::Bold),
            Print(info.title),
            SetAttribute(Attribute::Reset),
            Print(format!(" - {}\n", info.description)),
        )?;
    }

    print_badge(controller.status())?;
    Ok(())
}

/// Prints the status badge with its footer hint.
pub fn print_badge(status: Status) -> Result<()> {
    let mut stdout = stdout();

    queue!(
        stdout,
        SetBackgroundColor(status.background_color()),
        SetForegroundColor(status.foreground_color()),
        SetAttribute(Attribute::Bold),
        Print(format!(" {} ", status.label())),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print(format!("  {}\n", status.footer())),
    )?;

    stdout.flush()?;
    Ok(())
}

/// Renders one change of the activity log; used as the log consumer's callback.
pub fn render_log_change(change: LogChange<'_>) {
    let mut stdout = stdout();

    let result = match change {
        LogChange::Appended(event) => queue!(
            stdout,
            SetForegroundColor(severity_color(event.severity)),
            Print(event),
            ResetColor,
            Print("\n"),
        ),
        LogChange::Cleared => queue!(stdout, Clear(ClearType::All), MoveTo(0, 0)),
    };

    // Nowhere to report a broken terminal from the consumer task.
    let _ = result.and_then(|()| stdout.flush());
}
