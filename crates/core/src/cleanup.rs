//! Best-effort bulk deletion.
//!
//! Purging temp folders and update caches always meets files that are locked
//! by a running program. Nothing here returns an error: every failure is
//! counted in a [`DeleteReport`] and the remaining entries are still
//! processed.

use std::cmp::Reverse;
use std::fs;
use std::io;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::{THUMBNAIL_CACHE_EXTENSION, THUMBNAIL_CACHE_PREFIX};

/// Attempted, deleted and failed removals of one or more delete calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReport {
    pub attempted: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl DeleteReport {
    fn record(&mut self, path: &Path, result: io::Result<()>) {
        self.attempted += 1;
        match result {
            Ok(()) => self.deleted += 1,
            Err(e) => {
                warn!("Could not delete `{}`: {}", path.display(), e);
                self.failed += 1;
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Whether something was attempted and every attempt succeeded.
    pub fn is_complete(&self) -> bool {
        self.attempted > 0 && self.is_clean()
    }
}

impl AddAssign for DeleteReport {
    fn add_assign(&mut self, other: Self) {
        self.attempted += other.attempted;
        self.deleted += other.deleted;
        self.failed += other.failed;
    }
}

/// Deletes a file, or a directory with everything below it.
///
/// Files are deleted first, read-only attributes cleared beforehand. The
/// emptied subdirectories follow, longest path first so children go before
/// their parents, and the root directory last. A path that does not exist
/// attempts nothing.
pub fn delete_tree(path: &Path) -> DeleteReport {
    delete_tree_with(path, |file| fs::remove_file(file))
}

fn delete_tree_with<F>(path: &Path, mut remove_file: F) -> DeleteReport
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut removals = Vec::new();
    plan_removals(path, &mut removals);

    let mut report = DeleteReport::default();
    for removal in &removals {
        report.record(removal.path(), removal.apply(&mut remove_file));
    }
    debug!("Deleted tree `{}`: {:?}", path.display(), report);

    report
}

/// One file or emptied directory to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Removal {
    File(PathBuf),
    Directory(PathBuf),
}

impl Removal {
    fn path(&self) -> &Path {
        match self {
            Removal::File(path) | Removal::Directory(path) => path,
        }
    }

    fn apply<F>(&self, remove_file: &mut F) -> io::Result<()>
    where
        F: FnMut(&Path) -> io::Result<()>,
    {
        match self {
            Removal::File(path) => {
                clear_read_only(path);
                remove_file(path)
            }
            Removal::Directory(path) => fs::remove_dir(path),
        }
    }
}

/// Appends the removals that delete `path`, in the order [`delete_tree`] performs them.
fn plan_removals(path: &Path, removals: &mut Vec<Removal>) {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return;
    };

    if !metadata.is_dir() {
        removals.push(Removal::File(path.to_path_buf()));
        return;
    }

    let mut files = Vec::new();
    let mut directories = Vec::new();
    collect_tree(path, &mut files, &mut directories);
    directories.sort_by_key(|directory| Reverse(directory.as_os_str().len()));

    removals.extend(files.into_iter().map(Removal::File));
    removals.extend(directories.into_iter().map(Removal::Directory));
    removals.push(Removal::Directory(path.to_path_buf()));
}

fn collect_tree(directory: &Path, files: &mut Vec<PathBuf>, directories: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not list `{}`: {}", directory.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => {
                collect_tree(&path, files, directories);
                directories.push(path);
            }
            _ => files.push(path),
        }
    }
}

#[allow(clippy::permissions_set_readonly_false)]
fn clear_read_only(path: &Path) {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return;
    };

    let mut permissions = metadata.permissions();
    if permissions.readonly() {
        permissions.set_readonly(false);
        let _ = fs::set_permissions(path, permissions);
    }
}

/// Progress of a [`PurgePlan`] after a batch, counted in single removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeProgress {
    pub processed: usize,
    pub total: usize,
    pub report: DeleteReport,
}

/// The entries of a directory, deleted a batch of removals at a time.
///
/// Every entry is expanded up front into the files and directories below it,
/// so one large subdirectory still spans many batches. The plan does no
/// waiting of its own; the caller decides what happens between batches, so
/// it can be driven synchronously or from a task that yields to the
/// scheduler.
#[derive(Debug)]
pub struct PurgePlan {
    entries: usize,
    removals: Vec<Removal>,
    processed: usize,
    report: DeleteReport,
}

impl PurgePlan {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        let mut removals = Vec::new();
        for entry in &entries {
            plan_removals(entry, &mut removals);
        }

        Self {
            entries: entries.len(),
            removals,
            processed: 0,
            report: DeleteReport::default(),
        }
    }

    /// Plans the deletion of every direct entry of `directory`, but not the directory itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn for_directory(directory: &Path) -> io::Result<Self> {
        let entries = fs::read_dir(directory)?
            .flatten()
            .map(|entry| entry.path())
            .collect();

        Ok(Self::new(entries))
    }

    /// Number of entries the plan was built from.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Number of single removals the entries expand to.
    pub fn total(&self) -> usize {
        self.removals.len()
    }

    pub fn is_finished(&self) -> bool {
        self.processed >= self.removals.len()
    }

    pub fn report(&self) -> DeleteReport {
        self.report
    }

    /// Performs up to `batch_size` further removals.
    ///
    /// Returns None once every removal has been processed.
    pub fn run_batch(&mut self, batch_size: usize) -> Option<PurgeProgress> {
        if self.is_finished() {
            return None;
        }

        let end = (self.processed + batch_size.max(1)).min(self.removals.len());
        let mut remove_file = |file: &Path| fs::remove_file(file);
        for removal in &self.removals[self.processed..end] {
            self.report
                .record(removal.path(), removal.apply(&mut remove_file));
        }
        self.processed = end;

        Some(PurgeProgress {
            processed: self.processed,
            total: self.total(),
            report: self.report,
        })
    }
}

/// Drives a plan to completion, yielding to the scheduler after every batch.
pub async fn purge<F>(mut plan: PurgePlan, batch_size: usize, mut on_batch: F) -> DeleteReport
where
    F: FnMut(PurgeProgress),
{
    while let Some(progress) = plan.run_batch(batch_size) {
        on_batch(progress);
        tokio::task::yield_now().await;
    }

    plan.report()
}

fn is_thumbnail_cache(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with(THUMBNAIL_CACHE_PREFIX)
        && Path::new(&name)
            .extension()
            .is_some_and(|extension| extension == THUMBNAIL_CACHE_EXTENSION)
}

/// Lists Explorer's `thumbcache_*.db` files in `directory`, sorted by name.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn thumbnail_cache_files(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(directory)?
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|file_type| file_type.is_file()))
        .filter(|entry| is_thumbnail_cache(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    files.sort();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("a").join("b").join("c")).unwrap();
        fs::create_dir_all(root.join("d")).unwrap();
        File::create(root.join("top.tmp")).unwrap();
        File::create(root.join("a").join("one.tmp")).unwrap();
        File::create(root.join("a").join("b").join("two.tmp")).unwrap();
        File::create(root.join("a").join("b").join("c").join("three.tmp")).unwrap();
        File::create(root.join("d").join("four.tmp")).unwrap();
    }

    #[test]
    fn test_delete_tree_removes_everything() {
        let scratch = tempdir().unwrap();
        let root = scratch.path().join("purge");
        build_tree(&root);

        let report = delete_tree(&root);

        assert!(!root.exists());
        // 5 files, 4 subdirectories and the root itself.
        assert_eq!(report.attempted, 10);
        assert_eq!(report.deleted, 10);
        assert!(report.is_clean());
    }

    #[test]
    fn test_delete_tree_clears_read_only_files() {
        let scratch = tempdir().unwrap();
        let file = scratch.path().join("readonly.tmp");
        File::create(&file).unwrap();
        let mut permissions = fs::metadata(&file).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&file, permissions).unwrap();

        let report = delete_tree(&file);

        assert!(!file.exists());
        assert_eq!(report.deleted, 1);
    }

    #[test]
    fn test_delete_tree_missing_path_attempts_nothing() {
        let scratch = tempdir().unwrap();
        let report = delete_tree(&scratch.path().join("missing"));
        assert_eq!(report, DeleteReport::default());
        assert!(report.is_clean());
        assert!(!report.is_complete());
    }

    #[test]
    fn test_delete_tree_continues_past_locked_file() {
        let scratch = tempdir().unwrap();
        let root = scratch.path().join("purge");
        build_tree(&root);
        let locked = root.join("a").join("b").join("two.tmp");

        let report = delete_tree_with(&root, |file| {
            if file == locked {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "in use"))
            } else {
                fs::remove_file(file)
            }
        });

        assert!(locked.exists());
        assert!(!root.join("top.tmp").exists());
        assert!(!root.join("d").exists());
        assert!(!root.join("a").join("b").join("c").exists());
        // The locked file keeps `b`, `a` and the root alive.
        assert_eq!(report.failed, 4);
        assert_eq!(report.deleted, 6);
        assert_eq!(report.attempted, 10);
    }

    #[cfg(windows)]
    #[test]
    fn test_delete_tree_skips_file_held_open() {
        use std::os::windows::fs::OpenOptionsExt;

        let scratch = tempdir().unwrap();
        let root = scratch.path().join("purge");
        build_tree(&root);
        let locked = root.join("d").join("four.tmp");
        let _handle = fs::OpenOptions::new()
            .read(true)
            .share_mode(0)
            .open(&locked)
            .unwrap();

        let report = delete_tree(&root);

        assert!(locked.exists());
        assert!(!root.join("a").exists());
        assert!(report.failed >= 1);
    }

    #[test]
    fn test_purge_plan_batches() {
        let scratch = tempdir().unwrap();
        for index in 0..7 {
            File::create(scratch.path().join(format!("{index}.tmp"))).unwrap();
        }
        fs::create_dir(scratch.path().join("nested")).unwrap();

        let mut plan = PurgePlan::for_directory(scratch.path()).unwrap();
        assert_eq!(plan.total(), 8);

        let processed: Vec<usize> =
            std::iter::from_fn(|| plan.run_batch(3).map(|progress| progress.processed)).collect();

        assert_eq!(processed, vec![3, 6, 8]);
        assert!(plan.is_finished());
        assert_eq!(plan.report().deleted, 8);
        assert!(scratch.path().exists());
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_purge_plan_zero_batch_still_progresses() {
        let scratch = tempdir().unwrap();
        File::create(scratch.path().join("only.tmp")).unwrap();

        let mut plan = PurgePlan::for_directory(scratch.path()).unwrap();
        let progress = plan.run_batch(0).unwrap();
        assert_eq!(progress.processed, 1);
        assert!(plan.run_batch(0).is_none());
    }

    #[test]
    fn test_purge_plan_skips_missing_entries() {
        let plan = PurgePlan::new(vec![PathBuf::from("/nhx-kit/missing")]);
        assert_eq!(plan.entries(), 1);
        assert_eq!(plan.total(), 0);
        assert!(plan.is_finished());
    }

    #[tokio::test]
    async fn test_purge_batches_inside_one_large_directory() {
        let scratch = tempdir().unwrap();
        let download = scratch.path().join("Download");
        fs::create_dir(&download).unwrap();
        for index in 0..200 {
            File::create(download.join(format!("{index:04}.cab"))).unwrap();
        }
        File::create(scratch.path().join("ReportingEvents.log")).unwrap();

        let plan = PurgePlan::for_directory(scratch.path()).unwrap();
        assert_eq!(plan.entries(), 2);
        // 200 files, the emptied `Download` and the log file.
        assert_eq!(plan.total(), 202);

        let mut batches = Vec::new();
        let report = purge(plan, 25, |progress| batches.push(progress.processed)).await;

        assert_eq!(batches.len(), 9);
        assert_eq!(batches.first(), Some(&25));
        assert_eq!(batches.last(), Some(&202));
        assert_eq!(report.deleted, 202);
        assert!(!download.exists());
    }

    #[tokio::test]
    async fn test_purge_reports_every_batch() {
        let scratch = tempdir().unwrap();
        for index in 0..60 {
            File::create(scratch.path().join(format!("{index}.tmp"))).unwrap();
        }

        let plan = PurgePlan::for_directory(scratch.path()).unwrap();
        let mut reports = Vec::new();
        let report = purge(plan, 25, |progress| reports.push(progress.processed)).await;

        assert_eq!(reports, vec![25, 50, 60]);
        assert_eq!(report.deleted, 60);
    }

    #[test]
    fn test_thumbnail_cache_files_match_pattern() {
        let scratch = tempdir().unwrap();
        for name in [
            "thumbcache_32.db",
            "thumbcache_idx.db",
            "ThumbCache_96.DB",
            "iconcache_32.db",
            "thumbcache_32.db.bak",
        ] {
            File::create(scratch.path().join(name)).unwrap();
        }
        fs::create_dir(scratch.path().join("thumbcache_dir.db")).unwrap();

        let names: Vec<String> = thumbnail_cache_files(scratch.path())
            .unwrap()
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            names,
            vec!["ThumbCache_96.DB", "thumbcache_32.db", "thumbcache_idx.db"]
        );
    }
}
