/// Altitude callouts: one announcement per band as the vessel climbs
/// through it, re-armed by descending below it.
use super::{announcement, RuleContext, RuleOutput};
use crate::{engine::AlertKind, state::AltitudeBands};

pub fn evaluate(bands: &mut AltitudeBands, ctx: &RuleContext) -> RuleOutput {
    let height = ctx.snapshot.height_m;
    let threshold = bands.observe(height)?;

    tracing::debug!("Altitude band {}m entered at {}m", threshold, height);

    Some(announcement(
        AlertKind::Altitude,
        format!("{:.0} meters", height),
        false,
        ctx.now_ms,
    ))
}
