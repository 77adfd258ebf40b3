//! Single-flight execution of the selected action.
//!
//! [`RunController`] is the only writer of the [`ExecutionState`]. It
//! publishes every transition on a watch channel, so a host can render the
//! badge from [`RunController::subscribe`] without polling.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::{error, info, warn};
use tokio::sync::watch;

use crate::context::ActionContext;
use crate::error::{Error, Result};
use crate::registry::{ActionInfo, ActionRegistry};

const RUN_SEPARATOR: &str = "-----------------------------------";

/// How a finished run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Carries only the fault's message text.
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    Idle,
    Selected(ActionInfo),
    Running(ActionInfo),
    Completed {
        action: ActionInfo,
        outcome: Outcome,
    },
}

impl ExecutionState {
    /// The action a `run` would execute, or is executing.
    pub fn action(&self) -> Option<ActionInfo> {
        match self {
            ExecutionState::Idle => None,
            ExecutionState::Selected(action)
            | ExecutionState::Running(action)
            | ExecutionState::Completed { action, .. } => Some(*action),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ExecutionState::Running(_))
    }

    pub fn status(&self) -> Status {
        match self {
            ExecutionState::Idle | ExecutionState::Selected(_) => Status::Ready,
            ExecutionState::Running(_) => Status::Running,
            ExecutionState::Completed {
                outcome: Outcome::Success,
                ..
            } => Status::Succeeded,
            ExecutionState::Completed {
                outcome: Outcome::Failure(_),
                ..
            } => Status::Error,
        }
    }
}

/// The four-valued badge shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Running,
    Succeeded,
    Error,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Ready => "PRONTO",
            Status::Running => "EM EXECUCAO",
            Status::Succeeded => "CONCLUIDO",
            Status::Error => "ERRO",
        }
    }

    /// Text colour as `#RRGGBB`.
    pub fn foreground(self) -> &'static str {
        match self {
            Status::Ready => "#0078D4",
            Status::Running => "#F0A30A",
            Status::Succeeded => "#2EC55A",
            Status::Error => "#E81123",
        }
    }

    /// Badge fill as `#AARRGGBB`.
    pub fn background(self) -> &'static str {
        match self {
            Status::Ready => "#220078D4",
            Status::Running => "#22F0A30A",
            Status::Succeeded => "#2216C60A",
            Status::Error => "#22E81123",
        }
    }

    pub fn footer(self) -> &'static str {
        match self {
            Status::Ready => "Clique em Executar para iniciar.",
            Status::Running => "Executando...",
            Status::Succeeded => "+ Concluido com sucesso.",
            Status::Error => "! Verifique o log para detalhes.",
        }
    }
}

pub struct RunController {
    registry: Arc<ActionRegistry>,
    context: ActionContext,
    state: watch::Sender<ExecutionState>,
}

impl RunController {
    pub fn new(registry: Arc<ActionRegistry>, context: ActionContext) -> Self {
        let (state, _) = watch::channel(ExecutionState::Idle);

        Self {
            registry,
            context,
            state,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    pub fn state(&self) -> ExecutionState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> Status {
        self.state.borrow().status()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.state.subscribe()
    }

    /// Selects the action that the next `run` executes.
    ///
    /// Returns None, changing nothing, while a run is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::ActionNotFound`] for an unknown
    /// identifier; the state is left as it was.
    pub fn select_action(&self, id: &str) -> Result<Option<ActionInfo>> {
        let action = self.registry.lookup(id)?.info();

        let selected = self.state.send_if_modified(|state| {
            if state.is_running() {
                return false;
            }
            *state = ExecutionState::Selected(action);
            true
        });

        if !selected {
            warn!("Ignoring selection of `{}` while a run is in flight", id);
            return Ok(None);
        }

        info!("Selected action `{}`", id);
        self.context
            .log
            .info(format!("Acao selecionada: {}", action.title));
        Ok(Some(action))
    }

    /// Runs the selected action to completion and returns the resulting badge.
    ///
    /// Does nothing if no action is selected or one is already running. A
    /// completed action stays selected, so calling `run` again re-runs it.
    pub async fn run(&self) -> Status {
        let mut claimed = None;
        self.state.send_if_modified(|state| match state {
            ExecutionState::Selected(action) | ExecutionState::Completed { action, .. } => {
                let action = *action;
                *state = ExecutionState::Running(action);
                claimed = Some(action);
                true
            }
            ExecutionState::Idle | ExecutionState::Running(_) => false,
        });

        let Some(info) = claimed else {
            return self.status();
        };

        info!("Running action `{}`", info.id);
        self.context.log.info(RUN_SEPARATOR);
        self.context
            .log
            .info(format!("Iniciando: {}", info.title));

        let result = match self.registry.lookup(info.id) {
            Ok(action) => AssertUnwindSafe(action.run(&self.context))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    error!("Action `{}` panicked", info.id);
                    Err(Error::Panicked(panic_message(payload.as_ref())))
                }),
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(()) => {
                self.context
                    .log
                    .ok(format!("{} concluido com sucesso.", info.title));
                Outcome::Success
            }
            Err(e) => {
                warn!("Action `{}` failed: {}", info.id, e);
                let message = e.to_string();
                self.context.log.error(format!("ERRO: {message}"));
                Outcome::Failure(message)
            }
        };

        let completed = ExecutionState::Completed {
            action: info,
            outcome,
        };
        let status = completed.status();
        self.state.send_replace(completed);
        info!("Action `{}` finished: {}", info.id, status.label());

        status
    }

    pub fn clear_log(&self) {
        self.context.log.clear();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
