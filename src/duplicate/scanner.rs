//! Directory scanning
//!
//! Walks folders, loads every supported file and files it in a
//! [`DuplicateIndex`]. Loading and fingerprinting are pure and run in
//! parallel; insertion happens afterwards on the calling thread, in path
//! order, so the index only ever has one writer and results are
//! reproducible.

use crate::core::error::{DedupError, Result};
use crate::duplicate::index::{DuplicateIndex, InsertOutcome};
use crate::fingerprint::{Fingerprint, Fingerprinter};
use crate::loader::{self, SUPPORTED_EXTENSIONS};
use log::{info, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use walkdir::WalkDir;

/// Options controlling which files a scan picks up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Descend into subdirectories
    pub recursive: bool,

    /// Follow symbolic links while walking
    pub follow_symlinks: bool,

    /// Extensions to include (case-insensitive, without the dot)
    pub extensions: Vec<String>,

    /// Log and skip files the loaders reject instead of failing the scan
    pub skip_unreadable: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
            extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            skip_unreadable: true,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_skip_unreadable(mut self, skip: bool) -> Self {
        self.skip_unreadable = skip;
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        loader::extension_of(path)
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
            .unwrap_or(false)
    }
}

/// Progress information reported while fingerprinting
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Files fingerprinted so far
    pub current: usize,
    /// Total files to fingerprint
    pub total: usize,
    /// File just processed
    pub current_file: PathBuf,
    /// Files that failed to load or fingerprint so far
    pub errors: usize,
}

/// Outcome of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Files found by the walk
    pub files_seen: usize,
    /// Identities added to the index (new, appended or replacing)
    pub inserted: usize,
    /// Identities that were already stored under their fingerprint
    pub already_present: usize,
    /// Files skipped because they could not be loaded or fingerprinted
    pub skipped: usize,
    /// Inserts refused by the `reject` policy
    pub rejected: usize,
    /// The scan stopped early on a shutdown request
    pub interrupted: bool,
    /// Wall time in milliseconds
    pub elapsed_ms: u64,
}

/// Collect every accepted file below `folders`, sorted by name per folder
pub fn collect_files(folders: &[PathBuf], options: &ScanOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for folder in folders {
        if !folder.exists() {
            warn!("Folder does not exist: {}", folder.display());
            continue;
        }

        let walker = WalkDir::new(folder)
            .follow_links(options.follow_symlinks)
            .max_depth(if options.recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() && options.accepts(path) {
                files.push(path.to_path_buf());
            }
        }
    }

    files
}

/// Scan `folders` into `index`
///
/// `shutdown` is polled per file; once set, no further files are loaded
/// and nothing is inserted.
pub fn build_index<F, P>(
    index: &mut DuplicateIndex<F>,
    folders: &[PathBuf],
    options: &ScanOptions,
    shutdown: &AtomicBool,
    progress: P,
) -> Result<ScanReport>
where
    F: Fingerprinter + Sync,
    P: Fn(ScanProgress) + Send + Sync,
{
    let start_time = Instant::now();
    let files = collect_files(folders, options);
    let mut report = ScanReport {
        files_seen: files.len(),
        ..ScanReport::default()
    };

    if files.is_empty() {
        info!("No files found to fingerprint");
        return Ok(report);
    }

    info!(
        "Fingerprinting {} files with the {} algorithm",
        files.len(),
        index.algorithm().name()
    );

    let processed = AtomicUsize::new(0);
    let errors = AtomicUsize::new(0);
    let algorithm = index.algorithm();

    let mut results: Vec<Option<(String, Result<Fingerprint>)>> = files
        .par_iter()
        .map(|path| {
            if shutdown.load(Ordering::Relaxed) {
                return None;
            }

            let identity = loader::identity_of(path);
            let result = loader::load_pixels(path)
                .map_err(DedupError::from)
                .and_then(|buffer| algorithm.fingerprint(&buffer));

            if result.is_err() {
                errors.fetch_add(1, Ordering::Relaxed);
            }

            progress(ScanProgress {
                current: processed.fetch_add(1, Ordering::Relaxed) + 1,
                total: files.len(),
                current_file: path.clone(),
                errors: errors.load(Ordering::Relaxed),
            });

            Some((identity, result))
        })
        .collect();

    if shutdown.load(Ordering::SeqCst) {
        info!("Scan interrupted; index left unchanged");
        report.interrupted = true;
        report.elapsed_ms = start_time.elapsed().as_millis() as u64;
        return Ok(report);
    }

    // A strict scan fails as a whole, before the first insert
    if !options.skip_unreadable {
        if let Some(pos) = results.iter().position(|r| matches!(r, Some((_, Err(_))))) {
            if let Some((identity, Err(e))) = results.swap_remove(pos) {
                warn!("Aborting scan, {} could not be indexed: {}", identity, e);
                return Err(e);
            }
        }
    }

    for (identity, result) in results.into_iter().flatten() {
        let fingerprint = match result {
            Ok(fp) => fp,
            Err(e) if options.skip_unreadable => {
                warn!("Skipping {}: {}", identity, e);
                report.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        trace!("{} -> {}", identity, fingerprint);
        match index.insert_key(fingerprint, identity) {
            Ok(InsertOutcome::AlreadyPresent) => report.already_present += 1,
            Ok(_) => report.inserted += 1,
            Err(DedupError::DuplicateKey {
                fingerprint,
                identity,
                existing,
            }) => {
                info!(
                    "Rejected {}: fingerprint {} already held by {:?}",
                    identity, fingerprint, existing
                );
                report.rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    report.elapsed_ms = start_time.elapsed().as_millis() as u64;
    info!(
        "Scan complete: {} files, {} inserted, {} already present, {} skipped, {} rejected in {}ms",
        report.files_seen,
        report.inserted,
        report.already_present,
        report.skipped,
        report.rejected,
        report.elapsed_ms
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicate::index::DuplicatePolicy;
    use crate::fingerprint::Algorithm;
    use std::fs;
    use tempfile::TempDir;

    fn write_uniform(dir: &Path, name: &str, value: u8) -> PathBuf {
        let path = dir.join(name);
        let mut content = String::from("4 4 1\n");
        content.push_str(&vec![value.to_string(); 16].join(" "));
        fs::write(&path, content).unwrap();
        path
    }

    fn no_progress(_: ScanProgress) {}

    #[test]
    fn test_options_defaults_and_builder() {
        let options = ScanOptions::default();
        assert!(options.recursive);
        assert!(!options.follow_symlinks);
        assert!(options.skip_unreadable);
        assert_eq!(options.extensions, vec!["png", "jpg", "jpeg", "txt"]);

        let options = ScanOptions::new()
            .with_recursive(false)
            .with_extensions(vec!["txt".to_string()])
            .with_skip_unreadable(false);
        assert!(!options.recursive);
        assert!(options.accepts(Path::new("a.TXT")));
        assert!(!options.accepts(Path::new("a.png")));
    }

    #[test]
    fn test_collect_files_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        write_uniform(temp_dir.path(), "b.txt", 0);
        write_uniform(temp_dir.path(), "a.txt", 0);
        write_uniform(&sub, "c.txt", 0);
        fs::write(temp_dir.path().join("notes.md"), "ignored").unwrap();

        let folders = vec![temp_dir.path().to_path_buf()];
        let all = collect_files(&folders, &ScanOptions::default());
        let names: Vec<_> = all
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);

        let flat = collect_files(&folders, &ScanOptions::new().with_recursive(false));
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn test_collect_files_missing_folder() {
        let files = collect_files(&[PathBuf::from("/nonexistent/folder")], &ScanOptions::default());
        assert!(files.is_empty());
    }

    #[test]
    fn test_build_index_groups_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_uniform(temp_dir.path(), "a.txt", 7);
        let b = write_uniform(temp_dir.path(), "b.txt", 7);
        write_uniform(temp_dir.path(), "c.txt", 200);

        let mut index = DuplicateIndex::new(Algorithm::Mean, DuplicatePolicy::Append);
        let shutdown = AtomicBool::new(false);
        let report = build_index(
            &mut index,
            &[temp_dir.path().to_path_buf()],
            &ScanOptions::default(),
            &shutdown,
            no_progress,
        )
        .unwrap();

        assert_eq!(report.files_seen, 3);
        assert_eq!(report.inserted, 3);
        assert!(!report.interrupted);

        let groups = index.duplicate_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[&7],
            vec![a.to_string_lossy().into_owned(), b.to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn test_build_index_skips_or_fails_on_bad_files() {
        let temp_dir = TempDir::new().unwrap();
        write_uniform(temp_dir.path(), "good.txt", 0);
        fs::write(temp_dir.path().join("bad.txt"), "2 2 1 0").unwrap();
        let folders = vec![temp_dir.path().to_path_buf()];
        let shutdown = AtomicBool::new(false);

        let mut index = DuplicateIndex::new(Algorithm::Patch, DuplicatePolicy::Append);
        let report = build_index(&mut index, &folders, &ScanOptions::default(), &shutdown, no_progress)
            .unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.inserted, 1);

        let mut strict = DuplicateIndex::new(Algorithm::Patch, DuplicatePolicy::Append);
        let options = ScanOptions::new().with_skip_unreadable(false);
        let err = build_index(&mut strict, &folders, &options, &shutdown, no_progress).unwrap_err();
        assert!(matches!(err, DedupError::InvalidInput(_)));
    }

    #[test]
    fn test_strict_scan_failure_leaves_index_untouched() {
        let temp_dir = TempDir::new().unwrap();
        write_uniform(temp_dir.path(), "a.txt", 3);
        fs::write(temp_dir.path().join("z.txt"), "4 4 1\n0 0 0").unwrap();

        let mut index = DuplicateIndex::new(Algorithm::Mean, DuplicatePolicy::Append);
        index.insert_key(77, "earlier.png").unwrap();
        let shutdown = AtomicBool::new(false);
        let options = ScanOptions::new().with_skip_unreadable(false);

        let result = build_index(
            &mut index,
            &[temp_dir.path().to_path_buf()],
            &options,
            &shutdown,
            no_progress,
        );
        assert!(result.is_err());
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(77).unwrap(), ["earlier.png"]);
        assert!(!index.contains(3));
    }

    #[test]
    fn test_build_index_counts_rejections_and_repeats() {
        let temp_dir = TempDir::new().unwrap();
        write_uniform(temp_dir.path(), "a.txt", 9);
        write_uniform(temp_dir.path(), "b.txt", 9);
        let folders = vec![temp_dir.path().to_path_buf()];
        let shutdown = AtomicBool::new(false);

        let mut index = DuplicateIndex::new(Algorithm::Mean, DuplicatePolicy::Reject);
        let report = build_index(&mut index, &folders, &ScanOptions::default(), &shutdown, no_progress)
            .unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(index.lookup(9).unwrap().len(), 1);

        let again = build_index(&mut index, &folders, &ScanOptions::default(), &shutdown, no_progress)
            .unwrap();
        assert_eq!(again.already_present, 1);
        assert_eq!(again.rejected, 1);
    }

    #[test]
    fn test_build_index_honours_shutdown() {
        let temp_dir = TempDir::new().unwrap();
        write_uniform(temp_dir.path(), "a.txt", 1);

        let mut index = DuplicateIndex::new(Algorithm::Mean, DuplicatePolicy::Append);
        let shutdown = AtomicBool::new(true);
        let report = build_index(
            &mut index,
            &[temp_dir.path().to_path_buf()],
            &ScanOptions::default(),
            &shutdown,
            no_progress,
        )
        .unwrap();

        assert!(report.interrupted);
        assert!(index.is_empty());
    }
}
