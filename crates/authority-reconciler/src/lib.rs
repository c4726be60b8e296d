//! # authority-reconciler: first-fit offer matching
//!
//! `reconcile` matches a broker offer against the authority's latest
//! snapshot and decides which `Scheduled` instances to launch on it. It
//! is pure — no I/O, no broker calls — and deterministic: the same
//! `(State, Offer)` pair always produces the same resulting state and
//! effect sequence, since it reduces a single `ReservePlacements`
//! command through `authority_kernel::apply_command` rather than
//! mutating anything of its own.

mod candidates;
mod config;

pub use candidates::select_candidates;
pub use config::ReconcileConfig;

use authority_broker::Offer;
use authority_kernel::kernel::CommandOutcome;
use authority_kernel::{Command, Effect, JournalDelta, State};
use authority_types::{Goal, OfferId, Timestamp};

/// The result of matching one offer against the snapshot: the new
/// state, the durable deltas describing every transition applied (the
/// incarnation bump for any replacement scheduled this pass, followed by
/// the reservation itself), and every effect implied — both the
/// command-level effects (`LaunchTask`, `Notify`) and the broker-facing
/// accept/decline effect this function derives from them.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub state: State,
    pub deltas: Vec<JournalDelta>,
    pub effects: Vec<Effect>,
}

/// Scans for goal=Running instances whose condition just reached a
/// terminal state and schedules a replacement at `incarnation + 1` for
/// each, oldest first. This is the "next reconciliation iteration"
/// replacement pass: every call to `reconcile` runs it before matching
/// the offer, so a terminated instance never waits longer than one offer
/// cycle to be rescheduled.
fn replace_terminated_running_instances(state: State, now: Timestamp) -> (State, Vec<JournalDelta>, Vec<Effect>) {
    let due: Vec<_> = state
        .instances_oldest_first()
        .into_iter()
        .filter(|i| i.goal == Goal::Running && i.condition.is_terminal())
        .map(|i| i.id)
        .collect();

    let mut state = state;
    let mut deltas = Vec::with_capacity(due.len());
    let mut effects = Vec::with_capacity(due.len());
    for id in due {
        let CommandOutcome {
            state: next_state,
            delta,
            effects: command_effects,
        } = authority_kernel::apply_command(state, Command::ReplaceTerminatedInstance { id }, now)
            .expect("ReplaceTerminatedInstance is infallible for a terminated goal=Running instance");
        state = next_state;
        deltas.push(delta);
        effects.extend(command_effects);
    }
    (state, deltas, effects)
}

/// Matches `offer` against `state` and reduces the resulting
/// `ReservePlacements` command: oldest-first candidates, first-fit
/// packing, accept with a 0s refuse filter if anything launched,
/// otherwise decline with `config.refuse_offer_seconds`. Before matching,
/// schedules a replacement for any goal=Running instance that just went
/// terminal, so the offer can be matched against its freshly-rescheduled
/// incarnation in the same pass.
pub fn reconcile(state: State, offer: &Offer, now: Timestamp, config: &ReconcileConfig) -> ReconcileOutcome {
    let (state, mut deltas, mut effects) = replace_terminated_running_instances(state, now);

    let selected = select_candidates(&state, offer);

    let command = Command::ReservePlacements {
        offer_id: offer.id.clone(),
        agent_id: offer.agent_id.clone(),
        instance_ids: selected,
    };

    // ReservePlacements has no rejection path (see authority_kernel::kernel) —
    // it always accepts, filtering non-candidates rather than failing.
    let CommandOutcome {
        state,
        delta,
        effects: reserve_effects,
    } = authority_kernel::apply_command(state, command, now).expect("ReservePlacements is infallible");
    deltas.push(delta);
    effects.extend(reserve_effects);

    let launched = effects.iter().any(|e| matches!(e, Effect::LaunchTask { .. }));
    effects.push(if launched {
        Effect::AcceptOffer {
            offer_id: offer.id.clone(),
            refuse_seconds: 0.0,
        }
    } else {
        Effect::DeclineOffer {
            offer_id: offer.id.clone(),
            refuse_seconds: config.refuse_offer_seconds,
        }
    });

    ReconcileOutcome { state, deltas, effects }
}

/// Rolls back a prior reservation after the broker rescinds or rejects
/// the offer it was made against (`offerRescinded`, broker-call
/// batching). Reduces a `ReleasePlacement` command, which is also
/// infallible.
pub fn release_offer(state: State, offer_id: OfferId, now: Timestamp) -> CommandOutcome {
    authority_kernel::apply_command(state, Command::ReleasePlacement { offer_id }, now)
        .expect("ReleasePlacement is infallible")
}
