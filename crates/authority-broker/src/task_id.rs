//! Encoding between the authority's `(InstanceId, Incarnation)` pair and
//! the opaque task-id string the broker SDK deals in.
//!
//! The Instance Tracker uses [`decode`] to recognize which broker tasks
//! back a known Instance; a task id the broker reports that fails to
//! decode is an orphan, reaped with a best-effort `KillTask`.

use authority_types::{Incarnation, InstanceId};
use uuid::Uuid;

const SEPARATOR: char = ':';

/// Encodes `(instance_id, incarnation)` as the task id string handed to
/// the broker's `launchTasks` call.
pub fn encode(instance_id: InstanceId, incarnation: Incarnation) -> String {
    format!("{}{SEPARATOR}{}", instance_id, incarnation.as_u64())
}

/// Decodes a broker-reported task id back into `(InstanceId, Incarnation)`.
/// Returns `None` for any string not produced by [`encode`] — the signal
/// the Instance Tracker uses to identify an orphaned task.
pub fn decode(task_id: &str) -> Option<(InstanceId, Incarnation)> {
    let (uuid_part, incarnation_part) = task_id.rsplit_once(SEPARATOR)?;
    let uuid = Uuid::parse_str(uuid_part).ok()?;
    let incarnation = incarnation_part.parse::<u64>().ok()?;
    Some((InstanceId::from(uuid), Incarnation::new(incarnation)))
}
