//! Append-only audit trail with a best-effort mirror sink.
//!
//! Contract: logging must never fail the deletion it is reporting on. Both
//! sinks are written with explicitly ignored results — the swallow is the
//! intent, visible in code, not an accidental catch-all. The primary sink
//! gets a timestamped line; the mirror (a more visible location, when
//! configured) gets the bare text, and its failures are independent of the
//! primary write.
//!
//! For callers that must not block on log I/O, [`spawn_audit_logger`] puts
//! the sink writes on a dedicated thread behind a bounded channel with a
//! non-blocking send and a dropped-record counter.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::errors::{Result, RswError};

/// Default bounded channel capacity for audit records.
const CHANNEL_CAPACITY: usize = 1024;

/// Dual-sink append-only audit log.
#[derive(Debug, Clone)]
pub struct AuditLog {
    primary: PathBuf,
    mirror: Option<PathBuf>,
}

impl AuditLog {
    /// Log writing timestamped lines to `primary` and mirroring the bare
    /// text to `mirror` when given.
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>, mirror: Option<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            mirror,
        }
    }

    /// Append one record. Both sink failures are swallowed by contract.
    pub fn record(&self, text: &str) {
        let stamped = format!("{} - {}\n", chrono::Utc::now().timestamp_millis(), text);
        swallow(append_line(&self.primary, &stamped));
        if let Some(mirror) = &self.mirror {
            swallow(append_line(mirror, &format!("{text}\n")));
        }
    }
}

/// Result-ignoring wrapper: makes the swallow-on-failure contract explicit
/// at every call site.
fn swallow(result: io::Result<()>) {
    let _ = result;
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

// ──────────────────── background logger ────────────────────

#[derive(Debug)]
enum AuditCommand {
    Record(String),
    Shutdown,
}

/// Thread-safe, cheaply-cloneable handle for sending audit records.
///
/// `record` uses `try_send`, so callers are never blocked by logging
/// back-pressure; a full channel drops the record and counts it.
#[derive(Clone)]
pub struct AuditLogHandle {
    tx: Sender<AuditCommand>,
    dropped: Arc<AtomicU64>,
}

impl AuditLogHandle {
    /// Queue a record for the logger thread. Non-blocking.
    pub fn record(&self, text: impl Into<String>) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(AuditCommand::Record(text.into())) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        // Disconnected is fine during shutdown.
    }

    /// Number of records dropped due to channel back-pressure.
    #[must_use]
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Request graceful shutdown of the logger thread.
    pub fn shutdown(&self) {
        let _ = self.tx.send(AuditCommand::Shutdown);
    }
}

/// Spawn the audit logger thread and return a handle plus its join handle.
pub fn spawn_audit_logger(log: AuditLog) -> Result<(AuditLogHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<AuditCommand>(CHANNEL_CAPACITY);
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = Arc::clone(&dropped);

    let handle = AuditLogHandle { tx, dropped };
    let join = thread::Builder::new()
        .name("rsw-audit".to_string())
        .spawn(move || logger_thread_main(&rx, &log, &dropped_clone))
        .map_err(|e| RswError::Runtime {
            details: format!("failed to spawn audit logger thread: {e}"),
        })?;

    Ok((handle, join))
}

fn logger_thread_main(rx: &Receiver<AuditCommand>, log: &AuditLog, dropped: &AtomicU64) {
    while let Ok(command) = rx.recv() {
        let lost = dropped.swap(0, Ordering::Relaxed);
        if lost > 0 {
            log.record(&format!("{lost} audit records dropped under back-pressure"));
        }
        match command {
            AuditCommand::Record(text) => log.record(&text),
            AuditCommand::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_line_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.txt"), None);
        log.record("Deleted:2 Failed:0");

        let contents = fs::read_to_string(dir.path().join("audit.txt")).unwrap();
        let line = contents.lines().next().unwrap();
        let (stamp, rest) = line.split_once(" - ").unwrap();
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "Deleted:2 Failed:0");
    }

    #[test]
    fn mirror_gets_bare_text() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = dir.path().join("report.txt");
        let log = AuditLog::new(dir.path().join("audit.txt"), Some(mirror.clone()));
        log.record("Deleted:1 Failed:1");
        log.record("Deleted:4 Failed:0");

        let contents = fs::read_to_string(&mirror).unwrap();
        assert_eq!(contents, "Deleted:1 Failed:1\nDeleted:4 Failed:0\n");
    }

    #[test]
    fn mirror_failure_leaves_primary_intact() {
        let dir = tempfile::tempdir().unwrap();
        // Mirror parent is a regular file, so the mirror write must fail.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let log = AuditLog::new(
            dir.path().join("audit.txt"),
            Some(blocker.join("report.txt")),
        );

        log.record("Deleted:9 Failed:0");
        let contents = fs::read_to_string(dir.path().join("audit.txt")).unwrap();
        assert!(contents.contains("Deleted:9 Failed:0"));
    }

    #[test]
    fn primary_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let log = AuditLog::new(blocker.join("audit.txt"), None);

        // Must not panic or error.
        log.record("Deleted:0 Failed:3");
    }

    #[test]
    fn records_append_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.txt"), None);
        log.record("first");
        log.record("second");

        let contents = fs::read_to_string(dir.path().join("audit.txt")).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn background_logger_writes_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.txt"), None);
        let (handle, join) = spawn_audit_logger(log).unwrap();

        handle.record("Deleted:5 Failed:2");
        handle.record("Deleted:1 Failed:0");
        handle.shutdown();
        join.join().unwrap();

        let contents = fs::read_to_string(dir.path().join("audit.txt")).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("Deleted:5 Failed:2"));
        assert_eq!(handle.dropped_records(), 0);
    }

    #[test]
    fn handle_is_cloneable_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.txt"), None);
        let (handle, join) = spawn_audit_logger(log).unwrap();

        let h2 = handle.clone();
        let worker = thread::spawn(move || h2.record("from worker"));
        handle.record("from main");
        worker.join().unwrap();
        handle.shutdown();
        join.join().unwrap();

        let contents = fs::read_to_string(dir.path().join("audit.txt")).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
