use std::sync::Arc;

use crate::config::Settings;
use crate::log_sink::LogSink;
use crate::process::ProcessInvoker;

/// Everything a running action may touch: the process launcher, the activity
/// log and the session settings.
#[derive(Clone)]
pub struct ActionContext {
    pub invoker: Arc<dyn ProcessInvoker>,
    pub log: LogSink,
    pub settings: Settings,
}

impl ActionContext {
    pub fn new(invoker: Arc<dyn ProcessInvoker>, log: LogSink, settings: Settings) -> Self {
        Self {
            invoker,
            log,
            settings,
        }
    }
}
