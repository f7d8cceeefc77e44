pub mod altitude;
pub mod flight_events;
pub mod heat;
pub mod orbit;
pub mod prelaunch;

use crate::{
    engine::{AlertKind, Announcement},
    telemetry::TelemetrySnapshot,
};

/// Read-only context passed to every per-tick rule.
pub struct RuleContext<'a> {
    pub snapshot: &'a TelemetrySnapshot,
    pub now_ms:   u64,
}

/// A rule fires at most once per tick; `None` means it stayed quiet.
pub type RuleOutput = Option<Announcement>;

// ---------------------------------------------------------------------------
// Convenience constructor so rules don't repeat boilerplate
// ---------------------------------------------------------------------------

pub fn announcement(kind: AlertKind, text: String, interrupt: bool, now_ms: u64) -> Announcement {
    Announcement {
        kind,
        text,
        interrupt,
        at_ms: now_ms,
    }
}
