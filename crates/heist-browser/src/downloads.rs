//! Download watcher — treats a new file in the downloads folder as the
//! completion signal of an export.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use heist_core::HeistConfig;
use tracing::{debug, info};

use crate::poll::Poll;

/// Header tokens that mark a file as an expense export.
const HEADER_TOKENS: &[&str] = &["Merchant", "Amount"];

/// Watches a directory for a freshly written export. Read-only: it never
/// moves or deletes anything it finds.
#[derive(Debug, Clone)]
pub struct DownloadWatcher {
    dir: PathBuf,
    extension: String,
    max_candidates: usize,
    name_marker: String,
    poll_interval: Duration,
    freshness_grace: Duration,
}

impl DownloadWatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "csv".into(),
            max_candidates: 10,
            name_marker: "Expensify".into(),
            poll_interval: Duration::from_millis(500),
            freshness_grace: Duration::from_secs(5),
        }
    }

    pub fn from_config(config: &HeistConfig) -> Self {
        Self {
            max_candidates: config.max_candidates,
            poll_interval: config.timings.download_poll(),
            freshness_grace: config.timings.freshness_grace(),
            ..Self::new(config.downloads_dir())
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// One pass over the directory.
    ///
    /// Candidates are the newest `max_candidates` files of the expected type.
    /// The first one (newest first) written after `since`, no older than
    /// `max_age` (inclusive), and looking like an export wins.
    pub fn scan(&self, since: SystemTime, max_age: Duration) -> Option<PathBuf> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) => {
                debug!("Cannot read {}: {}", self.dir.display(), e);
                return None;
            }
        };

        let mut candidates: Vec<(PathBuf, SystemTime)> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| self.has_extension(path))
            .filter_map(|path| {
                let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((path, modified))
            })
            .collect();

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        let now = SystemTime::now();

        candidates
            .into_iter()
            .take(self.max_candidates)
            .find(|(path, modified)| {
                is_fresh(*modified, since, now, max_age) && self.looks_like_export(path)
            })
            .map(|(path, _)| path)
    }

    /// Poll until an export written after `since` shows up, or `deadline`.
    ///
    /// The freshness window on each pass is the time elapsed since `since`
    /// plus the configured grace.
    pub fn await_export(&self, since: SystemTime, deadline: Instant) -> Option<PathBuf> {
        let found = Poll::every(self.poll_interval)
            .until(deadline)
            .run(|_| {
                let elapsed = SystemTime::now().duration_since(since).unwrap_or_default();
                self.scan(since, elapsed.saturating_add(self.freshness_grace))
            })
            .value();

        if let Some(path) = &found {
            info!("Export detected: {}", path.display());
        }
        found
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    fn looks_like_export(&self, path: &Path) -> bool {
        let named = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains(&self.name_marker));
        if named {
            return true;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => HEADER_TOKENS.iter().any(|t| content.contains(t)),
            Err(e) => {
                debug!("Skipping unreadable {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// Written strictly after `since` and at most `max_age` old at `now`.
fn is_fresh(modified: SystemTime, since: SystemTime, now: SystemTime, max_age: Duration) -> bool {
    if modified <= since {
        return false;
    }
    // a timestamp slightly in the future counts as brand new
    now.duration_since(modified).unwrap_or_default() <= max_age
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    const EXPORT: &str = "Timestamp,Merchant,Amount\n2024-03-14,Coffee Co,4.50\n";

    fn write_aged(dir: &Path, name: &str, content: &[u8], age: Duration) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    fn long_ago() -> SystemTime {
        SystemTime::now() - Duration::from_secs(3600)
    }

    #[test]
    fn test_most_recent_qualifying_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_aged(dir.path(), "older.csv", EXPORT.as_bytes(), Duration::from_secs(120));
        let newer = write_aged(dir.path(), "newer.csv", EXPORT.as_bytes(), Duration::from_secs(3));

        let watcher = DownloadWatcher::new(dir.path());
        let found = watcher.scan(long_ago(), Duration::from_secs(600));
        assert_eq!(found, Some(newer));
    }

    #[test]
    fn test_only_ten_newest_are_inspected() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            write_aged(
                dir.path(),
                &format!("notes-{}.csv", i),
                b"a,b\n1,2\n",
                Duration::from_secs(10 + i),
            );
        }
        write_aged(dir.path(), "report.csv", EXPORT.as_bytes(), Duration::from_secs(60));

        let watcher = DownloadWatcher::new(dir.path());
        assert_eq!(watcher.scan(long_ago(), Duration::from_secs(600)), None);
    }

    #[test]
    fn test_files_before_since_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_aged(dir.path(), "stale.csv", EXPORT.as_bytes(), Duration::from_secs(30));

        let watcher = DownloadWatcher::new(dir.path());
        let since = SystemTime::now() - Duration::from_secs(10);
        assert_eq!(watcher.scan(since, Duration::from_secs(600)), None);
    }

    #[test]
    fn test_freshness_window() {
        let dir = tempfile::tempdir().unwrap();
        write_aged(dir.path(), "report.csv", EXPORT.as_bytes(), Duration::from_secs(90));

        let watcher = DownloadWatcher::new(dir.path());
        assert_eq!(watcher.scan(long_ago(), Duration::from_secs(60)), None);
        assert!(watcher.scan(long_ago(), Duration::from_secs(120)).is_some());
    }

    #[test]
    fn test_freshness_boundary_is_inclusive() {
        let now = SystemTime::now();
        let since = now - Duration::from_secs(3600);
        let modified = now - Duration::from_secs(90);

        assert!(is_fresh(modified, since, now, Duration::from_secs(90)));
        assert!(!is_fresh(modified, since, now, Duration::from_secs(90) - Duration::from_millis(1)));
        assert!(is_fresh(modified, since, now, Duration::from_secs(91)));

        // written exactly at `since` is not new
        assert!(!is_fresh(since, since, now, Duration::from_secs(7200)));
        assert!(is_fresh(now + Duration::from_secs(2), since, now, Duration::ZERO));
    }

    #[test]
    fn test_freshness_window_either_side_of_file_age() {
        let dir = tempfile::tempdir().unwrap();
        write_aged(dir.path(), "report.csv", EXPORT.as_bytes(), Duration::from_secs(90));

        let watcher = DownloadWatcher::new(dir.path());
        assert_eq!(watcher.scan(long_ago(), Duration::from_secs(89)), None);
        assert!(watcher.scan(long_ago(), Duration::from_secs(92)).is_some());
    }

    #[test]
    fn test_name_marker_or_header_required() {
        let dir = tempfile::tempdir().unwrap();
        write_aged(dir.path(), "photos.csv", b"file,size\nx.jpg,3\n", Duration::from_secs(1));
        let watcher = DownloadWatcher::new(dir.path());
        assert_eq!(watcher.scan(long_ago(), Duration::from_secs(600)), None);

        let named = write_aged(
            dir.path(),
            "Expensify_Export.csv",
            b"unrelated\n",
            Duration::from_secs(2),
        );
        assert_eq!(watcher.scan(long_ago(), Duration::from_secs(600)), Some(named));
    }

    #[test]
    fn test_unreadable_candidate_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_aged(dir.path(), "binary.csv", &[0xff, 0xfe, 0x00, 0x9f], Duration::from_secs(1));
        let good = write_aged(dir.path(), "good.csv", EXPORT.as_bytes(), Duration::from_secs(5));

        let watcher = DownloadWatcher::new(dir.path());
        assert_eq!(watcher.scan(long_ago(), Duration::from_secs(600)), Some(good));
    }

    #[test]
    fn test_other_extensions_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_aged(dir.path(), "report.pdf", EXPORT.as_bytes(), Duration::from_secs(1));
        let upper = write_aged(dir.path(), "REPORT.CSV", EXPORT.as_bytes(), Duration::from_secs(2));

        let watcher = DownloadWatcher::new(dir.path());
        assert_eq!(watcher.scan(long_ago(), Duration::from_secs(600)), Some(upper));
    }

    #[test]
    fn test_await_export_gives_up_at_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let config = HeistConfig {
            downloads_dir: Some(dir.path().to_path_buf()),
            ..crate::testing::fast_config()
        };
        let watcher = DownloadWatcher::from_config(&config);
        let start = Instant::now();
        let found = watcher.await_export(SystemTime::now(), start + Duration::from_millis(30));
        assert_eq!(found, None);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        let watcher = DownloadWatcher::new("/nonexistent/heist-downloads");
        assert_eq!(watcher.scan(long_ago(), Duration::from_secs(600)), None);
    }
}
