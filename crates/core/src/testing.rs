//! Scripted process invoker for unit tests.

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{KitPaths, Settings};
use crate::context::ActionContext;
use crate::error::{Error, Result};
use crate::log_sink::{self, LogStream};
use crate::process::{ProcessInvoker, ProcessResult};

pub enum Scripted {
    Output { text: String, exit_code: i32 },
    LaunchFault,
}

impl Scripted {
    pub fn output(text: &str) -> Self {
        Self::Output {
            text: text.to_string(),
            exit_code: 0,
        }
    }

    pub fn failing_text(text: &str, exit_code: i32) -> Self {
        Self::Output {
            text: text.to_string(),
            exit_code,
        }
    }

    pub fn launch_fault() -> Self {
        Self::LaunchFault
    }
}

/// Replays scripted outcomes in call order; once the script runs out every
/// call succeeds without output.
#[derive(Default)]
pub struct ScriptedInvoker {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedInvoker {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// A context whose paths all live below a directory that does not exist.
    pub fn context(self: &Arc<Self>) -> (ActionContext, LogStream) {
        self.context_rooted_at(Path::new("/nhx-kit-test/missing-root"))
    }

    pub fn context_rooted_at(self: &Arc<Self>, root: &Path) -> (ActionContext, LogStream) {
        let (sink, stream) = log_sink::channel();
        let settings = Settings::default()
            .with_paths(KitPaths::rooted_at(root))
            .without_delays();
        let invoker: Arc<dyn ProcessInvoker> = self.clone();

        (ActionContext::new(invoker, sink, settings), stream)
    }

    fn next(&self, command: &str) -> Result<ProcessResult> {
        self.calls.lock().unwrap().push(command.to_string());

        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Output { text, exit_code }) => {
                Ok(ProcessResult::from_streams(&text, "", exit_code))
            }
            Some(Scripted::LaunchFault) => Err(Error::launch(
                command,
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "The system cannot find the file specified.",
                ),
            )),
            None => Ok(ProcessResult::from_streams("", "", 0)),
        }
    }
}

#[async_trait]
impl ProcessInvoker for ScriptedInvoker {
    async fn invoke_capture(&self, command: &str, _args: &str) -> Result<ProcessResult> {
        self.next(command)
    }

    async fn invoke_fire_and_forget(&self, command: &str, _args: &str) -> Result<i32> {
        self.next(command).map(|result| result.exit_code)
    }

    async fn spawn_detached(&self, command: &str, _args: &str) -> Result<()> {
        self.next(command).map(|_| ())
    }
}
