//! One agent's turn within a tick

use rand::Rng;

use crate::agent::{execute, Agent};
use crate::core::types::Vec2;
use crate::decision::decide;
use crate::perception::perceive;
use crate::simulation::context::{Outbox, TickContext};

/// Upkeep, perception, decision and execution for a single agent.
///
/// Downed agents only bleed; dead agents are skipped until the orchestrator
/// removes them.
pub fn update_agent<R: Rng + ?Sized>(
    agent: &mut Agent,
    ctx: &TickContext,
    rng: &mut R,
    outbox: &mut Outbox,
) {
    if agent.state.dead {
        return;
    }
    if agent.upkeep(ctx.now, ctx.dt, ctx.config) {
        tracing::debug!("{} bled out", agent.id);
        return;
    }
    if agent.state.downed {
        agent.velocity = Vec2::ZERO;
        return;
    }

    perceive(agent, ctx, outbox);
    decide(agent, ctx, rng, outbox);
    execute(agent, ctx, rng, outbox);
    agent.state.sanitize();
}
