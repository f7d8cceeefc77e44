/// Event-driven announcements: these bypass the tick interval and speak the
/// moment the host reports the event.
///
/// Launch, destroyed part and stage separation interrupt whatever is playing.
/// A sphere-of-influence change is only announced for the active vessel and
/// does not interrupt.
use super::{announcement, RuleOutput};
use crate::{engine::AlertKind, events::FlightEvent, telemetry::TelemetrySnapshot};

pub fn evaluate(event: &FlightEvent, active: Option<&TelemetrySnapshot>, now_ms: u64) -> RuleOutput {
    match event {
        FlightEvent::Launch => {
            let Some(vessel) = active else {
                tracing::debug!("Launch reported with no active vessel, ignored");
                return None;
            };
            let text = match vessel.target_name.as_deref() {
                Some(target) => format!(
                    "Liftoff! {} starts its mission to {}!",
                    vessel.vessel_name, target
                ),
                None => format!("Liftoff! {} starts its mission!", vessel.vessel_name),
            };
            Some(announcement(AlertKind::Liftoff, text, true, now_ms))
        }

        FlightEvent::Overheat { part } => Some(announcement(
            AlertKind::PartDestroyed,
            format!("{} destroyed", part),
            true,
            now_ms,
        )),

        FlightEvent::StageSeparation { stage } => Some(announcement(
            AlertKind::StageSeparated,
            format!("Stage {} decoupled", stage),
            true,
            now_ms,
        )),

        FlightEvent::SoiChanged { vessel_id, body } => {
            let vessel = active.filter(|v| &v.vessel_id == vessel_id)?;
            Some(announcement(
                AlertKind::SoiChanged,
                format!("{} is now orbiting {}", vessel.vessel_name, body),
                false,
                now_ms,
            ))
        }
    }
}
