/// Speech output: a single-slot audio channel in front of a TTS backend.
///
/// At most one utterance is audible at a time. `SpeechChannel::speak` always
/// cancels whatever is playing before starting the new request; there is no
/// queue. Sink failures are logged and swallowed: a missed announcement is
/// acceptable, a stalled monitoring loop is not.
use crate::{engine::Announcement, error::SpeechError};
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Fire-and-forget TTS backend. `cancel` must be safe to call when idle.
pub trait SpeechSink {
    fn announce(&mut self, text: &str) -> Result<(), SpeechError>;
    fn cancel(&mut self) -> Result<(), SpeechError>;
}

impl<S: SpeechSink + ?Sized> SpeechSink for Box<S> {
    fn announce(&mut self, text: &str) -> Result<(), SpeechError> {
        (**self).announce(text)
    }

    fn cancel(&mut self) -> Result<(), SpeechError> {
        (**self).cancel()
    }
}

// ---------------------------------------------------------------------------
// SpeechChannel
// ---------------------------------------------------------------------------

pub struct SpeechChannel<S> {
    sink: S,
}

impl<S: SpeechSink> SpeechChannel<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Interrupt the current utterance, if any.
    pub fn cancel(&mut self) {
        if let Err(e) = self.sink.cancel() {
            tracing::warn!("Speech cancel failed: {}", e);
        }
    }

    /// Replace whatever is playing with `text`.
    pub fn speak(&mut self, text: &str) {
        self.cancel();
        if let Err(e) = self.sink.announce(text) {
            tracing::warn!("Speech announce failed: {}", e);
        }
    }

    pub fn deliver(&mut self, announcement: &Announcement) {
        tracing::info!(
            "[{}] {} (at {}ms)",
            announcement.kind.display_name(),
            announcement.text,
            announcement.at_ms
        );
        if announcement.interrupt {
            self.cancel();
        }
        self.speak(&announcement.text);
    }

    pub fn deliver_all(&mut self, announcements: &[Announcement]) {
        for a in announcements {
            self.deliver(a);
        }
    }

    #[cfg(test)]
    pub(crate) fn sink(&self) -> &S {
        &self.sink
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Runs an external TTS program (`espeak`, `say`, ...) with the text as the
/// final argument. Cancelling kills the running child without waiting on it;
/// the child is also killed when the sink is dropped.
///
/// Must be used from within a tokio runtime.
pub struct CommandSink {
    program: String,
    args:    Vec<String>,
    current: Option<Child>,
}

impl CommandSink {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args, current: None }
    }
}

impl SpeechSink for CommandSink {
    fn announce(&mut self, text: &str) -> Result<(), SpeechError> {
        if self.program.trim().is_empty() {
            return Err(SpeechError::Unavailable("no speech command configured".into()));
        }
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpeechError::Spawn { command: self.program.clone(), source })?;
        self.current = Some(child);
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), SpeechError> {
        let Some(mut child) = self.current.take() else {
            return Ok(());
        };
        // Already finished: nothing to interrupt
        if let Ok(Some(_)) = child.try_wait() {
            return Ok(());
        }
        match child.start_kill() {
            Ok(()) => Ok(()),
            // Exited between try_wait and kill
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(SpeechError::Cancel(e)),
        }
    }
}

/// Writes utterances to the log instead of speaking them.
#[derive(Debug, Default)]
pub struct LogSink;

impl SpeechSink for LogSink {
    fn announce(&mut self, text: &str) -> Result<(), SpeechError> {
        tracing::info!("(speech) {}", text);
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SinkCall {
        Announce(String),
        Cancel,
    }

    /// Records every call; optionally fails them all.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub calls:   Vec<SinkCall>,
        pub failing: bool,
    }

    impl RecordingSink {
        pub fn spoken(&self) -> Vec<String> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    SinkCall::Announce(t) => Some(t.clone()),
                    SinkCall::Cancel => None,
                })
                .collect()
        }
    }

    impl SpeechSink for RecordingSink {
        fn announce(&mut self, text: &str) -> Result<(), SpeechError> {
            self.calls.push(SinkCall::Announce(text.to_owned()));
            if self.failing {
                return Err(SpeechError::Unavailable("test sink".into()));
            }
            Ok(())
        }

        fn cancel(&mut self) -> Result<(), SpeechError> {
            self.calls.push(SinkCall::Cancel);
            if self.failing {
                return Err(SpeechError::Unavailable("test sink".into()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordingSink, SinkCall};
    use super::*;
    use crate::engine::AlertKind;

    fn announcement(kind: AlertKind, text: &str, interrupt: bool) -> Announcement {
        Announcement { kind, text: text.to_owned(), interrupt, at_ms: 0 }
    }

    #[test]
    fn speak_cancels_before_announcing() {
        let mut ch = SpeechChannel::new(RecordingSink::default());
        ch.speak("5000 meters");
        assert_eq!(
            ch.sink().calls,
            vec![SinkCall::Cancel, SinkCall::Announce("5000 meters".into())]
        );
    }

    #[test]
    fn interrupting_delivery_cancels_redundantly() {
        let mut ch = SpeechChannel::new(RecordingSink::default());
        ch.deliver(&announcement(AlertKind::StageSeparated, "Stage 3 decoupled", true));
        assert_eq!(
            ch.sink().calls,
            vec![SinkCall::Cancel, SinkCall::Cancel, SinkCall::Announce("Stage 3 decoupled".into())]
        );
    }

    #[test]
    fn sink_failures_are_swallowed() {
        let mut ch = SpeechChannel::new(RecordingSink { failing: true, ..Default::default() });
        ch.deliver_all(&[
            announcement(AlertKind::Altitude, "2000 meters", false),
            announcement(AlertKind::Liftoff, "Liftoff!", true),
        ]);
        assert_eq!(ch.sink().spoken(), vec!["2000 meters", "Liftoff!"]);
    }

    #[tokio::test]
    async fn command_sink_cancel_when_idle_is_noop() {
        let mut sink = CommandSink::new("voice-alerts-no-such-tts", vec![]);
        assert!(sink.cancel().is_ok());
        assert!(sink.cancel().is_ok());
    }

    #[tokio::test]
    async fn command_sink_reports_missing_program() {
        let mut sink = CommandSink::new("voice-alerts-no-such-tts", vec![]);
        let err = sink.announce("hello").unwrap_err();
        assert!(matches!(err, SpeechError::Spawn { .. }));
    }

    #[tokio::test]
    async fn command_sink_without_program_is_unavailable() {
        let mut sink = CommandSink::new("  ", vec![]);
        let err = sink.announce("hello").unwrap_err();
        assert!(matches!(err, SpeechError::Unavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_sink_cancel_kills_running_utterance() {
        // `sleep 30` stands in for a long utterance
        let mut sink = CommandSink::new("sleep", vec![]);
        sink.announce("30").unwrap();
        assert!(sink.current.is_some());

        let started = std::time::Instant::now();
        assert!(sink.cancel().is_ok());
        assert!(sink.current.is_none());
        assert!(started.elapsed() < std::time::Duration::from_secs(5));

        assert!(sink.cancel().is_ok());
    }
}
