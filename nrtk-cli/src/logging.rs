//! Tracing subscriber setup.
//!
//! Logs go to `.nrtk/sync.log` when that file already exists and is writable,
//! to stderr otherwise. The file is never created here: creating it is how an
//! operator opts in. `RUST_LOG`, when set, overrides the configured level.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Where log output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

/// Open `path` for appending if it exists and is writable.
pub fn open_log_file(path: &Path) -> Option<File> {
    OpenOptions::new().append(true).open(path).ok()
}

fn filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_tracing(level: Level, log_file: &Path) -> LogSink {
    match open_log_file(log_file) {
        Some(file) => {
            let _ = fmt()
                .with_env_filter(filter(level))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .try_init();
            LogSink::File(log_file.to_path_buf())
        }
        None => {
            let _ = fmt()
                .with_env_filter(filter(level))
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init();
            LogSink::Stderr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_log_file_is_not_created() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sync.log");
        assert!(open_log_file(&path).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn existing_log_file_is_opened_for_append() {
        use std::io::Write;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sync.log");
        std::fs::write(&path, "first\n").unwrap();
        let mut file = open_log_file(&path).expect("writable log file");
        writeln!(file, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
