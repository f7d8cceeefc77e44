/// Alert engine: the core of the pipeline.
///
/// Holds the session-scoped `AlertState`, evaluates the per-tick rules in a
/// fixed order (pre-launch, heat, altitude, orbit) behind an interval gate,
/// and answers host events immediately, bypassing the gate.
///
/// The engine only *produces* announcements. `run` hands them to the
/// single-slot `SpeechChannel`, where the most recent request wins.
///
/// Tick interval:
///   default     → 1s between evaluations
///   heat alarm  → 2s, so each overheat warning can finish before the next
use crate::{
    config::AppConfig,
    events::{EventBus, FlightEvent, Subscription},
    feed::FeedRecord,
    rules::{altitude, flight_events, heat, orbit, prelaunch, RuleContext},
    speech::{SpeechChannel, SpeechSink},
    state::{AlertState, AltitudeBands},
    telemetry::{FeedTelemetry, TelemetrySnapshot, TelemetrySource},
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Receiver;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SessionLoaded,
    PreLaunch,
    Overheat,
    Altitude,
    Apoapsis,
    OrbitReached,
    OrbitLeft,
    Liftoff,
    PartDestroyed,
    StageSeparated,
    SoiChanged,
}

impl AlertKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SessionLoaded  => "Session Loaded",
            Self::PreLaunch      => "Pre-launch",
            Self::Overheat       => "Overheat",
            Self::Altitude       => "Altitude",
            Self::Apoapsis       => "Apoapsis",
            Self::OrbitReached   => "Orbit Reached",
            Self::OrbitLeft      => "Orbit Left",
            Self::Liftoff        => "Liftoff",
            Self::PartDestroyed  => "Part Destroyed",
            Self::StageSeparated => "Stage Separated",
            Self::SoiChanged     => "SOI Changed",
        }
    }

    #[cfg(test)]
    pub(crate) fn all() -> &'static [AlertKind] {
        &[
            Self::SessionLoaded,
            Self::PreLaunch,
            Self::Overheat,
            Self::Altitude,
            Self::Apoapsis,
            Self::OrbitReached,
            Self::OrbitLeft,
            Self::Liftoff,
            Self::PartDestroyed,
            Self::StageSeparated,
            Self::SoiChanged,
        ]
    }
}

/// A request to speak. `interrupt` requests an explicit cancel of the
/// current utterance before speaking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub kind:      AlertKind,
    pub text:      String,
    pub interrupt: bool,
    pub at_ms:     u64,
}

// ---------------------------------------------------------------------------
// AlertEngine
// ---------------------------------------------------------------------------

pub struct AlertEngine {
    config:       AppConfig,
    state:        AlertState,
    subscription: Subscription,
}

impl AlertEngine {
    /// Begin monitoring a flight. Latches are seeded from `initial` when a
    /// vessel is under control, otherwise from the first valid sample.
    pub fn start_session(
        config:  &AppConfig,
        bus:     &EventBus,
        initial: Option<&TelemetrySnapshot>,
        now_ms:  u64,
    ) -> Self {
        let bands = AltitudeBands::new(&config.altitude_bands_m, config.altitude_band_width_m);
        let mut state = AlertState::new(bands, config.default_interval_ms);
        if let Some(snap) = initial {
            state.seed(snap.situation);
        }
        tracing::info!(
            "Flight session started at {}ms ({})",
            now_ms,
            initial.map(|s| s.vessel_name.as_str()).unwrap_or("no active vessel")
        );
        Self {
            config: config.clone(),
            state,
            subscription: bus.subscribe(),
        }
    }

    /// Releases the event subscription.
    pub fn end_session(self) {
        tracing::info!("Flight session ended");
        self.subscription.unsubscribe();
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn loaded_announcement(&self, now_ms: u64) -> Option<Announcement> {
        self.config.announce_on_load.then(|| Announcement {
            kind:      AlertKind::SessionLoaded,
            text:      "Voice alerts loaded!".to_owned(),
            interrupt: false,
            at_ms:     now_ms,
        })
    }

    /// One polling tick. Skipped entirely when there is no active subject or
    /// the tick interval has not yet elapsed.
    pub fn tick(&mut self, snapshot: Option<&TelemetrySnapshot>, now_ms: u64) -> Vec<Announcement> {
        let Some(snap) = snapshot else {
            return Vec::new();
        };
        if !self.state.is_due(now_ms) {
            return Vec::new();
        }
        self.state.begin_tick(now_ms, self.config.default_interval_ms);

        if !self.state.seeded {
            self.state.seed(snap.situation);
        }

        let ctx = RuleContext { snapshot: snap, now_ms };
        let mut out = Vec::new();

        out.extend(prelaunch::evaluate(&mut self.state.pre_launch_announced, &ctx));

        if let Some(alarm) = heat::evaluate(&ctx, self.config.heat_ratio_threshold) {
            self.state.tick_interval_ms = self.config.heat_alarm_interval_ms;
            out.push(alarm);
        }

        out.extend(altitude::evaluate(&mut self.state.altitude, &ctx));
        out.extend(orbit::evaluate(&mut self.state.orbit, &ctx));

        out
    }

    pub fn handle_event(
        &self,
        event:  &FlightEvent,
        active: Option<&TelemetrySnapshot>,
        now_ms: u64,
    ) -> Option<Announcement> {
        flight_events::evaluate(event, active, now_ms)
    }

    /// Answer every event delivered to this session since the last call.
    pub fn poll_events(&mut self, active: Option<&TelemetrySnapshot>, now_ms: u64) -> Vec<Announcement> {
        self.subscription
            .drain()
            .iter()
            .filter_map(|event| self.handle_event(event, active, now_ms))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Main engine task
// ---------------------------------------------------------------------------

/// Consume host feed records until the feed closes.
///
/// The engine task stands in for the host's collaborators: it keeps the
/// latest vessel reading as the telemetry source and publishes host events
/// on the bus the active session subscribes to.
pub async fn run<S: SpeechSink>(
    mut feed_rx: Receiver<FeedRecord>,
    speech:      &mut SpeechChannel<S>,
    config:      &AppConfig,
) -> Result<()> {
    let bus = EventBus::new();
    let mut telemetry = FeedTelemetry::new();
    let mut session: Option<AlertEngine> = None;

    while let Some(record) = feed_rx.recv().await {
        tracing::trace!("Feed record at {}ms: {:?}", record.at_ms(), record);
        match record {
            FeedRecord::SessionStart { at_ms } => {
                if let Some(previous) = session.take() {
                    tracing::warn!("Session start without session end, closing previous session");
                    previous.end_session();
                }
                let engine = AlertEngine::start_session(config, &bus, telemetry.sample().as_ref(), at_ms);
                if let Some(loaded) = engine.loaded_announcement(at_ms) {
                    speech.deliver(&loaded);
                }
                session = Some(engine);
            }

            FeedRecord::SessionEnd { .. } => {
                if let Some(engine) = session.take() {
                    engine.end_session();
                }
                telemetry.update(None);
            }

            FeedRecord::Sample { at_ms, vessel } => {
                telemetry.update(vessel);
                if let Some(engine) = session.as_mut() {
                    let out = engine.tick(telemetry.sample().as_ref(), at_ms);
                    speech.deliver_all(&out);
                }
            }

            FeedRecord::Event { at_ms, event } => {
                bus.publish(event);
                if let Some(engine) = session.as_mut() {
                    let out = engine.poll_events(telemetry.sample().as_ref(), at_ms);
                    speech.deliver_all(&out);
                }
            }
        }
    }

    if let Some(engine) = session.take() {
        engine.end_session();
    }
    tracing::info!("Feed closed, engine exiting");
    Ok(())
}
