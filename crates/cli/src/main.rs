use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{debug, info};
use nhx_kit_cli::action_selection::{
    confirm_action_should_run, prompt_menu_choice, ui, MenuChoice, RunChoice,
};
use nhx_kit_cli::cli_args::Args;
use nhx_kit_core::catalog;
use nhx_kit_core::config::{self, Settings};
use nhx_kit_core::context::ActionContext;
use nhx_kit_core::controller::RunController;
use nhx_kit_core::error::Error::ActionNotFound;
use nhx_kit_core::error::{Error, Result};
use nhx_kit_core::log_sink::{self, LogSink};
use nhx_kit_core::process::SystemInvoker;
use tokio::task;

/// Build session settings from the defaults and command-line overrides
fn build_settings(args: &Args) -> Settings {
    let settings = Settings::default();

    match config::expand_directory(&args.system_directory) {
        Some(system_directory) => settings.with_system_directory(system_directory),
        None => settings,
    }
}

/// Run a blocking terminal prompt off the async workers
async fn prompt<T, F>(read: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    task::spawn_blocking(read)
        .await
        .map_err(|e| Error::Io(io::Error::other(e)))?
}

/// Select an action by list position or ID, reporting unknown IDs without quitting
fn select(controller: &RunController, choice: MenuChoice) -> Result<()> {
    let id = match choice {
        MenuChoice::Index(index) => match controller.registry().enumerate().nth(index) {
            Some(action) => action.id().to_string(),
            None => return Ok(()),
        },
        MenuChoice::ActionId(id) => id,
        _ => return Ok(()),
    };

    match controller.select_action(&id) {
        Ok(_) => Ok(()),
        Err(e @ ActionNotFound(_)) => {
            eprintln!("{e}");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Run the selected action, redrawing the badge on every state change
async fn run_selected(controller: &RunController, sink: &LogSink, force: bool) -> Result<()> {
    let Some(action) = controller.state().action() else {
        println!("Nenhuma acao selecionada.");
        return Ok(());
    };

    if !force {
        let title = action.title;
        if prompt(move || confirm_action_should_run(title)).await? == RunChoice::No {
            return Ok(());
        }
    }

    let mut states = controller.subscribe();
    let run = controller.run();
    tokio::pin!(run);

    let status = loop {
        tokio::select! {
            status = &mut run => break status,
            Ok(()) = states.changed() => {
                let status = states.borrow_and_update().status();
                sink.sync().await;
                ui::print_badge(status)?;
            }
        }
    };

    sink.sync().await;
    info!("Run of `{}` ended with {}", action.id, status.label());
    Ok(())
}

async fn execute() -> Result<()> {
    let args = Args::parse();
    let settings = build_settings(&args);
    debug!(
        "System directory: `{}`",
        settings.paths.system_directory.display()
    );

    let invoker = Arc::new(SystemInvoker::new(settings.paths.system_directory.clone()));
    let (sink, stream) = log_sink::channel();
    let printer = tokio::spawn(stream.run(ui::render_log_change));

    let controller = RunController::new(
        Arc::new(catalog::builtin()?),
        ActionContext::new(invoker, sink.clone(), settings),
    );

    sink.info("NHX Kit iniciado.");
    sink.info("Selecione uma acao na lista.");

    if let Some(id) = &args.action {
        controller.select_action(id)?;
    }

    loop {
        sink.sync().await;
        ui::print_menu(&controller)?;

        let count = controller.registry().len();
        match prompt(move || prompt_menu_choice(count)).await? {
            MenuChoice::Quit => break,
            MenuChoice::Run => run_selected(&controller, &sink, args.force).await?,
            MenuChoice::ClearLog => controller.clear_log(),
            choice => select(&controller, choice)?,
        }
    }

    drop(controller);
    drop(sink);
    let _ = printer.await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
