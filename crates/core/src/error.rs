use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not start `{}`: {}", .command, .source)]
    Launch {
        command: String,
        source: std::io::Error,
    },

    #[error("Could not wait on `{}`: {}", .command, .source)]
    Wait {
        command: String,
        source: std::io::Error,
    },

    #[error("Found a non-unique action ID: `{}`", .0)]
    NonUniqueActionId(String),

    #[error("No action is registered with ID `{}`", .0)]
    ActionNotFound(String),

    #[error("Invalid ID: ID may not be empty")]
    EmptyId,

    #[error("Invalid ID `{}`: ID may not contain spaces", .0)]
    IdWithSpace(String),

    #[error("Action panicked: {}", .0)]
    Panicked(String),

    #[error("Terminal IO error: {}", .0)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn launch(command: &str, source: std::io::Error) -> Self {
        Self::Launch {
            command: command.to_string(),
            source,
        }
    }

    pub fn wait(command: &str, source: std::io::Error) -> Self {
        Self::Wait {
            command: command.to_string(),
            source,
        }
    }

    /// Whether the process behind an invocation could not be started or awaited.
    ///
    /// These are the only faults allowed to end a run in failure; everything
    /// else an action encounters is reported as log content.
    pub fn is_invocation_fault(&self) -> bool {
        matches!(self, Self::Launch { .. } | Self::Wait { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_invocation_fault_classification() {
        let launch = Error::launch("ipconfig.exe", ErrorKind::NotFound.into());
        let wait = Error::wait("sfc.exe", ErrorKind::BrokenPipe.into());
        assert!(launch.is_invocation_fault());
        assert!(wait.is_invocation_fault());
        assert!(!Error::NonUniqueActionId("dns".to_string()).is_invocation_fault());
        assert!(!Error::ActionNotFound("nope".to_string()).is_invocation_fault());
    }

    #[test]
    fn test_launch_message_names_command() {
        let error = Error::launch("netsh.exe", ErrorKind::PermissionDenied.into());
        assert!(error.to_string().starts_with("Could not start `netsh.exe`"));
    }
}
