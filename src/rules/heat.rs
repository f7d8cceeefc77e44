/// Overheat alarm: level-triggered, no latch.
///
/// Fires on every evaluated tick while any active part's skin heat ratio is
/// above the threshold, and goes quiet as soon as all parts are back under
/// it. While the alarm is sounding the engine switches to the heat re-poll
/// period (`heat_alarm_interval_ms`) in place of the default tick interval.
///
/// First part over the threshold wins; the spoken warning does not name it.
use super::{announcement, RuleContext, RuleOutput};
use crate::engine::AlertKind;

pub fn evaluate(ctx: &RuleContext, threshold: f64) -> RuleOutput {
    let hot = ctx.snapshot.part_heat.iter().find(|p| p.ratio > threshold)?;

    tracing::debug!("Overheat: {} at {:.2} of max skin temperature", hot.part, hot.ratio);

    Some(announcement(
        AlertKind::Overheat,
        "Warning, overheat!".to_owned(),
        true,
        ctx.now_ms,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{fixtures::snapshot, PartHeat, Situation};

    fn with_ratios(ratios: &[f64]) -> crate::telemetry::TelemetrySnapshot {
        let mut snap = snapshot(Situation::Flying);
        snap.part_heat = ratios
            .iter()
            .enumerate()
            .map(|(i, &ratio)| PartHeat { part: format!("part{}", i), ratio })
            .collect();
        snap
    }

    #[test]
    fn fires_above_threshold_only() {
        let at = with_ratios(&[0.5, 0.85]);
        assert!(evaluate(&RuleContext { snapshot: &at, now_ms: 0 }, 0.85).is_none());

        let over = with_ratios(&[0.5, 0.86, 1.4]);
        let a = evaluate(&RuleContext { snapshot: &over, now_ms: 7 }, 0.85).unwrap();
        assert_eq!(a.kind, AlertKind::Overheat);
        assert!(a.interrupt);
        assert_eq!(a.at_ms, 7);
    }

    #[test]
    fn no_parts_no_alarm() {
        let snap = with_ratios(&[]);
        assert!(evaluate(&RuleContext { snapshot: &snap, now_ms: 0 }, 0.85).is_none());
    }
}
