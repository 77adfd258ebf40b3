//! Configuration and path resolution for nhx-kit.
//!
//! This module holds the fixed tuning constants of the maintenance actions and
//! resolves every filesystem location an action touches. Nothing here is read
//! from or written to disk; the catalog is not user-configurable.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Text returned by a capturing invocation that produced no output at all.
pub const NO_OUTPUT_PLACEHOLDER: &str = "(sem saida)";

/// Number of entries processed between progress reports in bulk purges.
pub const PROGRESS_BATCH_SIZE: usize = 25;

/// Pause after killing the Windows shell, before relaunching it.
pub const SHELL_SETTLE_DELAY: Duration = Duration::from_millis(1200);

/// Pause after stopping a service, before touching its files.
pub const SERVICE_SETTLE_DELAY: Duration = Duration::from_millis(1200);

/// Pause after trimming the working set.
pub const MEMORY_SETTLE_DELAY: Duration = Duration::from_millis(400);

pub const THUMBNAIL_CACHE_PREFIX: &str = "thumbcache_";
pub const THUMBNAIL_CACHE_EXTENSION: &str = "db";

const WINDOWS_DIRECTORY_VARIABLE: &str = "$SystemRoot";
const FALLBACK_WINDOWS_DIRECTORY: &str = "C:\\Windows";

/// Resolves the Windows directory from `SystemRoot`, falling back to `C:\Windows`.
pub fn get_windows_directory() -> PathBuf {
    match shellexpand::env(WINDOWS_DIRECTORY_VARIABLE) {
        Ok(expanded) if !expanded.is_empty() => PathBuf::from(expanded.as_ref()),
        _ => PathBuf::from(FALLBACK_WINDOWS_DIRECTORY),
    }
}

/// Expands `~` and environment variables in a directory given on the command line.
///
/// Returns None if no directory is provided. Unknown variables leave the
/// string as it was, apart from tilde expansion.
///
/// # Examples
///
/// ```
/// use nhx_kit_core::config::expand_directory;
///
/// let expanded = expand_directory(&Some("~/scratch".to_string()));
/// assert!(expanded.is_some());
///
/// assert!(expand_directory(&None).is_none());
/// ```
pub fn expand_directory(directory: &Option<String>) -> Option<PathBuf> {
    let directory = directory.as_ref()?;
    let expanded = shellexpand::full(directory).unwrap_or_else(|_| shellexpand::tilde(directory));

    Some(PathBuf::from(expanded.as_ref()))
}

/// Every location the built-in actions read, purge or launch from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitPaths {
    /// Working directory of every launched process.
    pub system_directory: PathBuf,
    pub windows_directory: PathBuf,
    pub user_temp: PathBuf,
    /// Explorer's thumbnail cache folder, when the profile has a local app data folder.
    pub explorer_cache: Option<PathBuf>,
}

impl KitPaths {
    /// Resolves the paths of the current user and machine.
    pub fn from_environment() -> Self {
        let windows_directory = get_windows_directory();

        Self {
            system_directory: windows_directory.join("System32"),
            windows_directory,
            user_temp: std::env::temp_dir(),
            explorer_cache: dirs::data_local_dir().map(|local| explorer_cache_in(&local)),
        }
    }

    /// Lays out a Windows-like tree below `root`.
    ///
    /// Used to point every action at a scratch directory.
    pub fn rooted_at(root: &Path) -> Self {
        let windows_directory = root.join("Windows");

        Self {
            system_directory: windows_directory.join("System32"),
            windows_directory,
            user_temp: root.join("Temp"),
            explorer_cache: Some(explorer_cache_in(&root.join("LocalAppData"))),
        }
    }

    pub fn system_temp(&self) -> PathBuf {
        self.windows_directory.join("Temp")
    }

    pub fn prefetch(&self) -> PathBuf {
        self.windows_directory.join("Prefetch")
    }

    /// Windows Update download cache.
    pub fn update_cache(&self) -> PathBuf {
        self.windows_directory.join("SoftwareDistribution")
    }
}

fn explorer_cache_in(local_app_data: &Path) -> PathBuf {
    local_app_data
        .join("Microsoft")
        .join("Windows")
        .join("Explorer")
}

/// Runtime settings shared by every action of a session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub paths: KitPaths,
    pub shell_settle_delay: Duration,
    pub service_settle_delay: Duration,
    pub memory_settle_delay: Duration,
    pub progress_batch_size: usize,
}

impl Settings {
    pub fn with_paths(mut self, paths: KitPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_system_directory(mut self, system_directory: PathBuf) -> Self {
        self.paths.system_directory = system_directory;
        self
    }

    /// Drops every settle delay, for hosts that drive actions against stubs.
    pub fn without_delays(mut self) -> Self {
        self.shell_settle_delay = Duration::ZERO;
        self.service_settle_delay = Duration::ZERO;
        self.memory_settle_delay = Duration::ZERO;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: KitPaths::from_environment(),
            shell_settle_delay: SHELL_SETTLE_DELAY,
            service_settle_delay: SERVICE_SETTLE_DELAY,
            memory_settle_delay: MEMORY_SETTLE_DELAY,
            progress_batch_size: PROGRESS_BATCH_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_directory_is_never_empty() {
        let result = get_windows_directory();
        assert!(!result.as_os_str().is_empty());
    }

    #[test]
    fn test_expand_directory_with_tilde() {
        let result = expand_directory(&Some("~/system".to_string()));

        let expanded = result.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("system"));
    }

    #[test]
    fn test_expand_directory_with_none() {
        assert!(expand_directory(&None).is_none());
    }

    #[test]
    fn test_expand_directory_without_variables() {
        let result = expand_directory(&Some("/absolute/path".to_string()));
        assert_eq!(result.unwrap(), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_directory_with_unknown_variable() {
        let result = expand_directory(&Some("$NHX_KIT_UNSET_VARIABLE/dir".to_string()));
        assert_eq!(
            result.unwrap(),
            PathBuf::from("$NHX_KIT_UNSET_VARIABLE/dir")
        );
    }

    #[test]
    fn test_rooted_paths_layout() {
        let root = Path::new("/scratch");
        let paths = KitPaths::rooted_at(root);

        assert_eq!(paths.system_directory, root.join("Windows").join("System32"));
        assert_eq!(paths.user_temp, root.join("Temp"));
        assert_eq!(paths.system_temp(), root.join("Windows").join("Temp"));
        assert_eq!(paths.prefetch(), root.join("Windows").join("Prefetch"));
        assert_eq!(
            paths.update_cache(),
            root.join("Windows").join("SoftwareDistribution")
        );
        assert!(paths
            .explorer_cache
            .unwrap()
            .ends_with(Path::new("Microsoft").join("Windows").join("Explorer")));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.progress_batch_size, PROGRESS_BATCH_SIZE);
        assert_eq!(settings.shell_settle_delay, SHELL_SETTLE_DELAY);
        assert_eq!(settings.memory_settle_delay, MEMORY_SETTLE_DELAY);
    }

    #[test]
    fn test_settings_without_delays() {
        let settings = Settings::default()
            .with_system_directory(PathBuf::from("/sys"))
            .without_delays();

        assert_eq!(settings.paths.system_directory, PathBuf::from("/sys"));
        assert_eq!(settings.shell_settle_delay, Duration::ZERO);
        assert_eq!(settings.service_settle_delay, Duration::ZERO);
        assert_eq!(settings.memory_settle_delay, Duration::ZERO);
    }
}
