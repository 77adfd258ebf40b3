//! The catalog of actions, keyed by a stable identifier.
//!
//! The registry is filled once at start-up and never changes afterwards.
//! Listing order is registration order.

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

use crate::catalog::Procedure;
use crate::context::ActionContext;
use crate::error::Error::{ActionNotFound, EmptyId, IdWithSpace, NonUniqueActionId};
use crate::error::Result;

/// Display text of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMetadata {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
}

/// Identifier plus display text, as handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
}

impl Display for ActionInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} ({})", self.title, self.subtitle)
    }
}

#[derive(Debug, Clone)]
pub struct Action {
    info: ActionInfo,
    procedure: Procedure,
}

impl Action {
    pub fn info(&self) -> ActionInfo {
        self.info
    }

    pub fn id(&self) -> &'static str {
        self.info.id
    }

    pub fn procedure(&self) -> Procedure {
        self.procedure
    }

    /// Runs the action's procedure.
    ///
    /// # Errors
    ///
    /// Returns the invocation fault that ended the procedure early.
    pub async fn run(&self, context: &ActionContext) -> Result<()> {
        self.procedure.run(context).await
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(EmptyId);
    }

    if id.chars().any(char::is_whitespace) {
        return Err(IdWithSpace(id.to_string()));
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: IndexMap<&'static str, Action>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is malformed or already registered.
    pub fn register(
        &mut self,
        id: &'static str,
        metadata: ActionMetadata,
        procedure: Procedure,
    ) -> Result<&mut Self> {
        validate_id(id)?;

        if self.actions.contains_key(id) {
            return Err(NonUniqueActionId(id.to_string()));
        }

        let info = ActionInfo {
            id,
            title: metadata.title,
            subtitle: metadata.subtitle,
            description: metadata.description,
        };
        self.actions.insert(id, Action { info, procedure });

        Ok(self)
    }

    /// Finds an action by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ActionNotFound`] for an unknown identifier.
    pub fn lookup(&self, id: &str) -> Result<&Action> {
        self.actions
            .get(id)
            .ok_or_else(|| ActionNotFound(id.to_string()))
    }

    /// Every action, in registration order.
    pub fn enumerate(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
