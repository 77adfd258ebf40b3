//! Sequential composition of captured invocations under one action.
//!
//! Each step logs its start message, runs its command, logs every non-empty
//! output line at Info and, if it has one, a finish message at Ok. A command
//! that runs but reports failure in its text does not stop the chain; a
//! process that cannot be started or awaited does, and the lines already
//! logged stay in the log.

use crate::context::ActionContext;
use crate::error::Result;
use crate::log_sink::Severity;
use crate::process::ProcessResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    pub command: String,
    pub args: String,
    pub start_message: String,
    pub finish_message: Option<String>,
    pub start_severity: Severity,
}

impl ChainStep {
    pub fn new(
        command: impl Into<String>,
        args: impl Into<String>,
        start_message: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            args: args.into(),
            start_message: start_message.into(),
            finish_message: None,
            start_severity: Severity::Info,
        }
    }

    pub fn finishing_with(mut self, finish_message: impl Into<String>) -> Self {
        self.finish_message = Some(finish_message.into());
        self
    }

    pub fn starting_at(mut self, start_severity: Severity) -> Self {
        self.start_severity = start_severity;
        self
    }

    /// Runs this step alone and returns what the command printed.
    ///
    /// # Errors
    ///
    /// Returns the invocation fault if the command cannot be started or awaited.
    pub async fn run(&self, context: &ActionContext) -> Result<ProcessResult> {
        context
            .log
            .append(self.start_message.as_str(), self.start_severity);

        let result = context
            .invoker
            .invoke_capture(&self.command, &self.args)
            .await?;

        for line in result.lines() {
            context.log.info(line);
        }

        if let Some(finish_message) = self
            .finish_message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
        {
            context.log.ok(finish_message);
        }

        Ok(result)
    }
}

/// An ordered list of steps run one after another.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    steps: Vec<ChainStep>,
}

pub fn compose(steps: Vec<ChainStep>) -> Chain {
    Chain { steps }
}

impl Chain {
    /// Runs every step in order.
    ///
    /// # Errors
    ///
    /// Stops at the first invocation fault and returns it; later steps never start.
    pub async fn run(&self, context: &ActionContext) -> Result<Vec<ProcessResult>> {
        let mut results = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            results.push(step.run(context).await?);
        }
        Ok(results)
    }
}
