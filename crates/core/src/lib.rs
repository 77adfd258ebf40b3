//! NHX Kit Core Library
//!
//! This crate provides the core of nhx-kit, a catalog of Windows maintenance
//! actions (network resets, cache purges, system-file and disk checks). Each
//! action launches one or more system commands and reports its progress through
//! a timestamped, severity-tagged activity log.
//!
//! # Key Features
//!
//! - **Action Registry**: A fixed catalog of actions, keyed by stable identifiers
//! - **Process Invocation**: Windowless launches with correctly decoded console output
//! - **Chains**: Sequential composition of commands under one action
//! - **Run Controller**: Single-flight execution with a four-valued status badge
//! - **Activity Log**: Ordered delivery from any task to a single consumer
//! - **Bulk Cleanup**: Best-effort tree deletion that never stops at a locked file
//!
//! # Examples
//!
//! Selecting and running an action:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use nhx_kit_core::catalog;
//! use nhx_kit_core::config::Settings;
//! use nhx_kit_core::context::ActionContext;
//! use nhx_kit_core::controller::RunController;
//! use nhx_kit_core::log_sink;
//! use nhx_kit_core::process::SystemInvoker;
//!
//! # async fn example() -> nhx_kit_core::error::Result<()> {
//! let settings = Settings::default();
//! let invoker = Arc::new(SystemInvoker::new(settings.paths.system_directory.clone()));
//! let (sink, stream) = log_sink::channel();
//! tokio::spawn(stream.run(|change| println!("{:?}", change)));
//!
//! let controller = RunController::new(
//!     Arc::new(catalog::builtin()?),
//!     ActionContext::new(invoker, sink, settings),
//! );
//! controller.select_action("dns")?;
//! let status = controller.run().await;
//! println!("{}", status.label());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod chain;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod controller;
pub mod encoding;
pub mod error;
pub mod log_sink;
pub mod memory;
pub mod process;
pub mod registry;

#[cfg(test)]
mod testing;
