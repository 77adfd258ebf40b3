//! Process memory housekeeping.

use log::{debug, warn};

/// Asks the OS to page out as much of this process's working set as it can.
///
/// Returns false when the request failed or the platform has no such call.
pub fn trim_working_set() -> bool {
    let trimmed = platform::trim_working_set();
    if trimmed {
        debug!("Working set trimmed");
    } else {
        warn!("Working set could not be trimmed on this platform");
    }
    trimmed
}

#[cfg(windows)]
mod platform {
    use windows_sys::Win32::System::ProcessStatus::K32EmptyWorkingSet;
    use windows_sys::Win32::System::Threading::GetCurrentProcess;

    pub fn trim_working_set() -> bool {
        // SAFETY: the pseudo handle of the current process is always valid and
        // needs no closing.
        unsafe { K32EmptyWorkingSet(GetCurrentProcess()) != 0 }
    }
}

#[cfg(not(windows))]
mod platform {
    pub fn trim_working_set() -> bool {
        false
    }
}
