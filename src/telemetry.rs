/// Sampler: turns a raw vessel reading from the host into the snapshot the
/// alert engine evaluates.
///
/// The host reports raw figures (altitude above sea level, terrain height,
/// skin temperatures). The sampler derives height above terrain, per-part
/// heat ratios and the situation enum. It is a pure read: no state, no side
/// effects.
///
/// "No active subject" (nothing under control, or the controlled vessel is
/// an EVA kerbal) is reported as `None`; the engine skips its tick entirely.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw host types (deserialised from the feed)
// ---------------------------------------------------------------------------

/// Flight phase exactly as the game names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Situation {
    Prelaunch,
    Landed,
    Splashed,
    Flying,
    SubOrbital,
    Orbiting,
    Escaping,
    Docked,
}

impl Situation {
    /// Sitting on a surface (launchpad included).
    pub fn is_grounded(self) -> bool {
        matches!(self, Self::Prelaunch | Self::Landed | Self::Splashed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyReading {
    pub name:             String,
    /// Altitude (m) above which the atmosphere is negligible. 0 for airless bodies.
    pub atmosphere_depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartReading {
    pub name:                 String,
    pub skin_temperature:     f64,
    pub skin_max_temperature: f64,
    #[serde(default = "default_true")]
    pub active:               bool,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselReading {
    pub id:                 String,
    pub name:               String,
    #[serde(default)]
    pub is_eva:             bool,
    pub situation:          Situation,
    /// Altitude above sea level (m).
    pub altitude:           f64,
    /// Terrain height below the vessel (m above sea level).
    #[serde(default)]
    pub terrain_altitude:   f64,
    pub apoapsis:           f64,
    pub periapsis:          f64,
    pub body:               BodyReading,
    #[serde(default)]
    pub landed_or_splashed: bool,
    #[serde(default)]
    pub parts:              Vec<PartReading>,
    /// Name of the currently selected mission target, if any.
    #[serde(default)]
    pub target:             Option<String>,
}

// ---------------------------------------------------------------------------
// Snapshot consumed by the engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PartHeat {
    pub part:  String,
    /// skin temperature / max skin temperature; may exceed 1.0
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub vessel_id:          String,
    pub vessel_name:        String,
    pub situation:          Situation,
    /// Whole metres above local terrain, never negative.
    pub height_m:           f64,
    pub apoapsis:           f64,
    pub periapsis:          f64,
    pub body_name:          String,
    pub atmosphere_depth:   f64,
    /// Active parts only.
    pub part_heat:          Vec<PartHeat>,
    pub landed_or_splashed: bool,
    pub target_name:        Option<String>,
}

/// Height above local terrain, floored to whole metres and clamped at 0.
pub fn altitude_from_terrain(altitude: f64, terrain_altitude: f64) -> f64 {
    (altitude - terrain_altitude).floor().max(0.0)
}

pub fn sample_vessel(reading: &VesselReading) -> Option<TelemetrySnapshot> {
    if reading.is_eva {
        return None;
    }

    let part_heat = reading
        .parts
        .iter()
        .filter(|p| p.active && p.skin_max_temperature > 0.0)
        .map(|p| PartHeat {
            part:  p.name.clone(),
            ratio: p.skin_temperature / p.skin_max_temperature,
        })
        .collect();

    Some(TelemetrySnapshot {
        vessel_id:          reading.id.clone(),
        vessel_name:        reading.name.clone(),
        situation:          reading.situation,
        height_m:           altitude_from_terrain(reading.altitude, reading.terrain_altitude),
        apoapsis:           reading.apoapsis,
        periapsis:          reading.periapsis,
        body_name:          reading.body.name.clone(),
        atmosphere_depth:   reading.body.atmosphere_depth,
        part_heat,
        landed_or_splashed: reading.landed_or_splashed,
        target_name:        reading.target.clone(),
    })
}

// ---------------------------------------------------------------------------
// Telemetry source
// ---------------------------------------------------------------------------

/// Read-only access to the host's current vessel state.
pub trait TelemetrySource {
    /// `None` when there is no active subject to monitor.
    fn sample(&self) -> Option<TelemetrySnapshot>;
}

/// Telemetry source backed by the most recent reading seen on the host feed.
#[derive(Debug, Default)]
pub struct FeedTelemetry {
    latest: Option<VesselReading>,
}

impl FeedTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, reading: Option<VesselReading>) {
        self.latest = reading;
    }
}

impl TelemetrySource for FeedTelemetry {
    fn sample(&self) -> Option<TelemetrySnapshot> {
        self.latest.as_ref().and_then(sample_vessel)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Kerbin-like vessel sitting on the pad.
    pub fn reading(situation: Situation) -> VesselReading {
        VesselReading {
            id:                 "vessel-1".to_owned(),
            name:               "Kerbal X".to_owned(),
            is_eva:             false,
            situation,
            altitude:           75.0,
            terrain_altitude:   70.0,
            apoapsis:           600.0,
            periapsis:          -600_000.0,
            body:               BodyReading { name: "Kerbin".to_owned(), atmosphere_depth: 70_000.0 },
            landed_or_splashed: situation.is_grounded(),
            parts:              vec![PartReading {
                name:                 "mk1pod".to_owned(),
                skin_temperature:     300.0,
                skin_max_temperature: 2400.0,
                active:               true,
            }],
            target:             None,
        }
    }

    pub fn snapshot(situation: Situation) -> TelemetrySnapshot {
        sample_vessel(&reading(situation)).expect("non-EVA fixture")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::reading;
    use super::*;

    #[test]
    fn height_is_floored_and_non_negative() {
        assert_eq!(altitude_from_terrain(2_150.9, 100.2), 2_050.0);
        assert_eq!(altitude_from_terrain(65.0, 70.0), 0.0);
    }

    #[test]
    fn eva_has_no_active_subject() {
        let mut r = reading(Situation::Landed);
        r.is_eva = true;
        assert!(sample_vessel(&r).is_none());
    }

    #[test]
    fn heat_ratio_only_for_active_parts() {
        let mut r = reading(Situation::Flying);
        r.parts = vec![
            PartReading { name: "nose".into(),   skin_temperature: 2_200.0, skin_max_temperature: 2_000.0, active: true },
            PartReading { name: "spare".into(),  skin_temperature: 1_900.0, skin_max_temperature: 2_000.0, active: false },
            PartReading { name: "broken".into(), skin_temperature: 100.0,   skin_max_temperature: 0.0,     active: true },
        ];
        let snap = sample_vessel(&r).unwrap();
        assert_eq!(snap.part_heat.len(), 1);
        assert_eq!(snap.part_heat[0].part, "nose");
        assert!((snap.part_heat[0].ratio - 1.1).abs() < 1e-9);
    }

    #[test]
    fn feed_telemetry_tracks_latest_reading() {
        let mut source = FeedTelemetry::new();
        assert!(source.sample().is_none());

        source.update(Some(reading(Situation::Prelaunch)));
        assert_eq!(source.sample().unwrap().situation, Situation::Prelaunch);

        source.update(None);
        assert!(source.sample().is_none());
    }

    #[test]
    fn situation_uses_game_names() {
        let s: Situation = serde_json::from_str("\"SUB_ORBITAL\"").unwrap();
        assert_eq!(s, Situation::SubOrbital);
        assert!(Situation::Splashed.is_grounded());
        assert!(!Situation::Flying.is_grounded());
    }
}
