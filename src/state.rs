/// Session-scoped alert state: owned by the engine, mutated by the rules.
///
/// All state lives in a single `AlertState` created at session start and
/// dropped at session end. No locking: the engine is single-threaded.
use crate::telemetry::{Situation, TelemetrySnapshot};

// ---------------------------------------------------------------------------
// Altitude bands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AltitudeBand {
    pub threshold_m: f64,
    /// Set once the band has been called out; cleared to re-arm it.
    pub announced:   bool,
}

/// Ascending altitude thresholds, each with its own "already announced" flag.
#[derive(Debug, Clone)]
pub struct AltitudeBands {
    bands:   Vec<AltitudeBand>,
    width_m: f64,
}

impl AltitudeBands {
    /// `thresholds` must be strictly ascending (checked by config validation).
    pub fn new(thresholds: &[f64], width_m: f64) -> Self {
        Self {
            bands: thresholds
                .iter()
                .map(|&threshold_m| AltitudeBand { threshold_m, announced: false })
                .collect(),
            width_m,
        }
    }

    pub fn bands(&self) -> &[AltitudeBand] {
        &self.bands
    }

    /// Feed one height reading. Returns the threshold of the band that was
    /// just entered, if any.
    ///
    /// A band fires when `height` is in `[threshold, threshold + width)` and
    /// it has not been announced. Firing band `i` re-arms band `i - 1`.
    /// Any announced band above the current height is re-armed, so a descent
    /// below a band followed by a climb back into it announces again.
    pub fn observe(&mut self, height_m: f64) -> Option<f64> {
        for band in self.bands.iter_mut().filter(|b| height_m < b.threshold_m) {
            band.announced = false;
        }

        let idx = self.bands.iter().position(|b| {
            !b.announced && height_m >= b.threshold_m && height_m < b.threshold_m + self.width_m
        })?;

        if idx > 0 {
            self.bands[idx - 1].announced = false;
        }
        self.bands[idx].announced = true;
        Some(self.bands[idx].threshold_m)
    }
}

// ---------------------------------------------------------------------------
// Orbit phase
// ---------------------------------------------------------------------------

/// Coarse flight phase derived from orbit figures every tick. Never stored.
/// The orbit rule uses it to pick the silent re-arm on landing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitPhase {
    SubOrbitalAscent,
    StableOrbit,
    Landed,
}

impl OrbitPhase {
    pub fn classify(snap: &TelemetrySnapshot) -> Self {
        if snap.landed_or_splashed {
            Self::Landed
        } else if snap.apoapsis > snap.atmosphere_depth && snap.periapsis > snap.atmosphere_depth {
            Self::StableOrbit
        } else {
            Self::SubOrbitalAscent
        }
    }
}

/// One-shot latches for the orbit milestones. `orbit_reached` and
/// `orbit_left` are a mutual-exclusion pair: setting one clears the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrbitLatches {
    pub apoapsis_reached: bool,
    pub orbit_reached:    bool,
    pub orbit_left:       bool,
}

impl OrbitLatches {
    /// Pre-arm latches for a vessel that may already be past some milestones
    /// when monitoring begins.
    pub fn seeded(situation: Situation) -> Self {
        let mut latches = Self::default();
        if !situation.is_grounded() {
            latches.apoapsis_reached = true;
            if situation != Situation::SubOrbital {
                latches.orbit_reached = true;
            }
        }
        if situation.is_grounded() || matches!(situation, Situation::SubOrbital | Situation::Flying) {
            latches.orbit_left = true;
        }
        latches
    }
}

// ---------------------------------------------------------------------------
// Top-level AlertState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AlertState {
    pub tick_interval_ms:     u64,
    /// Game-clock time of the last evaluated tick. None until the first one.
    pub last_tick_ms:         Option<u64>,
    pub altitude:             AltitudeBands,
    pub orbit:                OrbitLatches,
    pub pre_launch_announced: bool,
    /// False until latches have been seeded from a real situation.
    pub seeded:               bool,
}

impl AlertState {
    pub fn new(altitude: AltitudeBands, tick_interval_ms: u64) -> Self {
        Self {
            tick_interval_ms,
            last_tick_ms: None,
            altitude,
            orbit: OrbitLatches::default(),
            pre_launch_announced: false,
            seeded: false,
        }
    }

    pub fn seed(&mut self, situation: Situation) {
        self.orbit = OrbitLatches::seeded(situation);
        self.seeded = true;
        tracing::debug!("Alert latches seeded for {:?}: {:?}", situation, self.orbit);
    }

    /// Has at least `tick_interval_ms` of game time passed since the last tick?
    /// A clock that went backwards (reverted flight, quickload) is always due.
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_tick_ms {
            None => true,
            Some(last) if now_ms < last => {
                tracing::debug!("Game clock went back from {}ms to {}ms", last, now_ms);
                true
            }
            Some(last) => now_ms - last >= self.tick_interval_ms,
        }
    }

    pub fn begin_tick(&mut self, now_ms: u64, default_interval_ms: u64) {
        self.tick_interval_ms = default_interval_ms;
        self.last_tick_ms = Some(now_ms);
    }
}
