/// Tails the host feed file, emitting each complete line as it is written.
///
/// Uses the `notify` crate to detect modifications, then reads from the last
/// known byte offset. A trailing partial line is left unread until the
/// writer finishes it.
///
/// Rotation handling: the plugin truncates or recreates the feed at game
/// start. If the file shrank below our offset we restart from byte 0.
///
/// Blocking: `follow` must run on a blocking thread (`spawn_blocking`).
use anyhow::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;

/// Re-check interval when no filesystem event arrives.
const IDLE_RECHECK: Duration = Duration::from_millis(500);

pub struct TailerState {
    path:     PathBuf,
    position: u64,
}

impl TailerState {
    fn new(path: PathBuf) -> Self {
        Self { path, position: 0 }
    }

    /// Returns `false` once the receiver is gone.
    fn read_new_lines(&mut self, tx: &Sender<String>) -> Result<bool> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(_) => return Ok(true), // Not created yet, wait
        };
        let file_len = metadata.len();

        if file_len < self.position {
            tracing::info!("Feed rotation detected, restarting from byte 0");
            self.position = 0;
        }

        if file_len == self.position {
            return Ok(true);
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.position))?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 || buf.last() != Some(&b'\n') {
                break; // EOF or partial line
            }
            self.position += n as u64;

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }
            if tx.blocking_send(line.to_owned()).is_err() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn is_feed_event(event: &Event, path: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| p == path)
}

/// Follow `feed_path` until the receiving side of `tx` is dropped.
pub fn follow(feed_path: PathBuf, tx: Sender<String>) -> Result<()> {
    tracing::info!("Tailer starting: {:?}", feed_path);

    let watch_dir = feed_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let (fs_tx, fs_rx) = std_mpsc::channel::<notify::Result<Event>>();
    let config = notify::Config::default().with_poll_interval(IDLE_RECHECK);
    let mut watcher = RecommendedWatcher::new(fs_tx, config)?;
    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

    let mut state = TailerState::new(feed_path.clone());

    // Pick up anything written before we started
    if !state.read_new_lines(&tx)? {
        return Ok(());
    }

    loop {
        let should_read = match fs_rx.recv_timeout(IDLE_RECHECK) {
            Ok(Ok(event)) => is_feed_event(&event, &feed_path),
            Ok(Err(e)) => {
                tracing::error!("Watcher error: {}", e);
                false
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => true,
            Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                tracing::warn!("Watcher channel closed, tailer exiting");
                break;
            }
        };
        if !should_read {
            continue;
        }
        match state.read_new_lines(&tx) {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("Feed consumer gone, tailer exiting");
                break;
            }
            Err(e) => tracing::warn!("Tailer read error: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::sync::mpsc;

    #[test]
    fn reads_initial_lines() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "line one").unwrap();
        writeln!(f, "line two").unwrap();
        f.flush().unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let mut state = TailerState::new(f.path().to_path_buf());
        assert!(state.read_new_lines(&tx).unwrap());

        assert_eq!(rx.try_recv().unwrap(), "line one");
        assert_eq!(rx.try_recv().unwrap(), "line two");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn holds_partial_line_until_complete() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{{\"type\":\"session_").unwrap();
        f.flush().unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let mut state = TailerState::new(f.path().to_path_buf());
        state.read_new_lines(&tx).unwrap();
        assert!(rx.try_recv().is_err());

        writeln!(f, "start\",\"at_ms\":0}}").unwrap();
        f.flush().unwrap();
        state.read_new_lines(&tx).unwrap();
        assert_eq!(rx.try_recv().unwrap(), r#"{"type":"session_start","at_ms":0}"#);
    }

    #[test]
    fn strips_crlf_and_skips_blank_lines() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "first\r\n\r\nsecond\n").unwrap();
        f.flush().unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let mut state = TailerState::new(f.path().to_path_buf());
        state.read_new_lines(&tx).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "first");
        assert_eq!(rx.try_recv().unwrap(), "second");
    }

    #[test]
    fn detects_rotation() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "first flight log").unwrap();
        f.flush().unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let mut state = TailerState::new(f.path().to_path_buf());
        state.read_new_lines(&tx).unwrap();
        let _ = rx.try_recv();

        // Rotation: overwrite with shorter content
        let mut f2 = std::fs::File::create(f.path()).unwrap();
        writeln!(f2, "new").unwrap();
        f2.flush().unwrap();

        state.read_new_lines(&tx).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "new");
    }

    #[test]
    fn missing_file_waits_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel(16);
        let mut state = TailerState::new(dir.path().join("feed.jsonl"));
        assert!(state.read_new_lines(&tx).unwrap());
    }

    #[test]
    fn reports_closed_receiver() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "line").unwrap();
        f.flush().unwrap();

        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        let mut state = TailerState::new(f.path().to_path_buf());
        assert!(!state.read_new_lines(&tx).unwrap());
    }
}
