/// Orbit milestones: a single phase machine evaluated as an if/else chain,
/// so at most one branch fires per tick:
///
///   a. apoapsis above the atmosphere            → "apoapsis reached"
///   b. apoapsis and periapsis above it          → "stable orbit"   (re-arms c)
///   c. apoapsis or periapsis below it           → "left orbit"     (re-arms b)
///   d. landed or splashed                       → re-arm a, silently
///
/// Comparisons are strict: a figure exactly on the boundary counts as
/// neither above nor below.
use super::{announcement, RuleContext, RuleOutput};
use crate::{
    engine::AlertKind,
    state::{OrbitLatches, OrbitPhase},
};

pub fn evaluate(latches: &mut OrbitLatches, ctx: &RuleContext) -> RuleOutput {
    let snap = ctx.snapshot;
    let boundary = snap.atmosphere_depth;
    let apo_above = snap.apoapsis > boundary;
    let peri_above = snap.periapsis > boundary;
    let any_below = snap.apoapsis < boundary || snap.periapsis < boundary;

    tracing::trace!("Orbit phase {:?}, latches {:?}", OrbitPhase::classify(snap), latches);

    if apo_above && !latches.apoapsis_reached {
        latches.apoapsis_reached = true;
        Some(announcement(
            AlertKind::Apoapsis,
            format!("Apoapsis reached {:.0} meters", boundary),
            false,
            ctx.now_ms,
        ))
    } else if apo_above && peri_above && !latches.orbit_reached {
        latches.orbit_reached = true;
        latches.orbit_left = false;
        Some(announcement(
            AlertKind::OrbitReached,
            format!("{} reached a stable orbit around {}", snap.vessel_name, snap.body_name),
            false,
            ctx.now_ms,
        ))
    } else if any_below && !latches.orbit_left {
        latches.orbit_left = true;
        latches.orbit_reached = false;
        Some(announcement(
            AlertKind::OrbitLeft,
            format!("Warning! {} left its orbit around {}", snap.vessel_name, snap.body_name),
            false,
            ctx.now_ms,
        ))
    } else {
        if OrbitPhase::classify(snap) == OrbitPhase::Landed {
            latches.apoapsis_reached = false;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{fixtures::snapshot, Situation, TelemetrySnapshot};

    fn in_flight(apoapsis: f64, periapsis: f64) -> TelemetrySnapshot {
        let mut snap = snapshot(Situation::Flying);
        snap.landed_or_splashed = false;
        snap.apoapsis = apoapsis;
        snap.periapsis = periapsis;
        snap
    }

    fn kind(latches: &mut OrbitLatches, snap: &TelemetrySnapshot) -> Option<AlertKind> {
        evaluate(latches, &RuleContext { snapshot: snap, now_ms: 0 }).map(|a| a.kind)
    }

    #[test]
    fn ascent_to_orbit_and_decay() {
        let mut l = OrbitLatches::seeded(Situation::Landed);

        // Apoapsis crosses while periapsis is still low: only (a)
        assert_eq!(kind(&mut l, &in_flight(75_000.0, -400_000.0)), Some(AlertKind::Apoapsis));
        assert!(l.orbit_left && !l.orbit_reached);

        // Periapsis follows: only (b)
        assert_eq!(kind(&mut l, &in_flight(80_000.0, 71_000.0)), Some(AlertKind::OrbitReached));
        assert!(l.orbit_reached && !l.orbit_left);

        // Stable: nothing
        assert_eq!(kind(&mut l, &in_flight(80_000.0, 71_000.0)), None);

        // Periapsis drops back into the atmosphere: only (c)
        assert_eq!(kind(&mut l, &in_flight(80_000.0, 45_000.0)), Some(AlertKind::OrbitLeft));
        assert!(l.orbit_left && !l.orbit_reached);

        // Re-circularise: announces stable orbit again
        assert_eq!(kind(&mut l, &in_flight(82_000.0, 72_000.0)), Some(AlertKind::OrbitReached));
    }

    #[test]
    fn landing_rearms_apoapsis() {
        let mut l = OrbitLatches::seeded(Situation::Landed);
        assert_eq!(kind(&mut l, &in_flight(75_000.0, -400_000.0)), Some(AlertKind::Apoapsis));

        let mut landed = snapshot(Situation::Landed);
        landed.apoapsis = 10.0;
        assert_eq!(kind(&mut l, &landed), None);
        assert!(!l.apoapsis_reached);

        assert_eq!(kind(&mut l, &in_flight(75_000.0, -400_000.0)), Some(AlertKind::Apoapsis));
    }

    #[test]
    fn orbiting_at_start_is_silent() {
        let mut l = OrbitLatches::seeded(Situation::Orbiting);
        assert_eq!(kind(&mut l, &in_flight(90_000.0, 85_000.0)), None);
    }

    #[test]
    fn boundary_value_is_neither_side() {
        let mut l = OrbitLatches { apoapsis_reached: true, orbit_reached: false, orbit_left: false };
        assert_eq!(kind(&mut l, &in_flight(70_000.0, 70_000.0)), None);
    }

    #[test]
    fn messages_name_vessel_and_body() {
        let mut l = OrbitLatches { apoapsis_reached: true, ..Default::default() };
        let snap = in_flight(80_000.0, 71_000.0);
        let a = evaluate(&mut l, &RuleContext { snapshot: &snap, now_ms: 0 }).unwrap();
        assert_eq!(a.text, "Kerbal X reached a stable orbit around Kerbin");
    }
}
