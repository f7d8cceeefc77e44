/// Fires once per session when the vessel first reports PRELAUNCH.
///
/// The latch never re-arms: reverting to the pad within the same flight does
/// not repeat the readiness call.
use super::{announcement, RuleContext, RuleOutput};
use crate::{engine::AlertKind, telemetry::Situation};

pub fn evaluate(announced: &mut bool, ctx: &RuleContext) -> RuleOutput {
    if ctx.snapshot.situation != Situation::Prelaunch || *announced {
        return None;
    }
    *announced = true;

    Some(announcement(
        AlertKind::PreLaunch,
        format!("{} is on the launchpad and ready to launch", ctx.snapshot.vessel_name),
        false,
        ctx.now_ms,
    ))
}
