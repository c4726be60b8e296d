//! Kernel state management.
//!
//! The authority's in-memory state tracks RunSpecs, Instances, and the
//! framework registration singleton. State is value-semantic: a mutation
//! takes ownership of `self` and returns a new `State`, sharing structure
//! with its predecessor via `BTreeMap`'s persistent-on-clone behavior.
//! Only the pipeline (`authority-runtime`) publishes new snapshots;
//! readers elsewhere observe the most recently published one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use authority_types::{AgentId, Condition, FrameworkId, Goal, InstanceId, OfferId, RunSpecRef, Timestamp};

use crate::domain::{FrameworkRegistration, Instance, RunSpec};

/// The authority's in-memory state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct State {
    run_specs: BTreeMap<RunSpecRef, RunSpec>,
    instances: BTreeMap<InstanceId, Instance>,
    framework: Option<FrameworkRegistration>,
    /// Instances provisioned against a still-unconfirmed offer, kept so
    /// `ReleasePlacement` can revert exactly the right set if the broker
    /// rejects the accept-offer call.
    pending_reservations: BTreeMap<OfferId, (AgentId, Vec<InstanceId>)>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // RunSpecs
    // ------------------------------------------------------------------

    pub fn get_run_spec(&self, run_spec_ref: &RunSpecRef) -> Option<&RunSpec> {
        self.run_specs.get(run_spec_ref)
    }

    pub fn run_spec_exists(&self, run_spec_ref: &RunSpecRef) -> bool {
        self.run_specs.contains_key(run_spec_ref)
    }

    pub fn run_specs(&self) -> impl Iterator<Item = &RunSpec> {
        self.run_specs.values()
    }

    pub(crate) fn with_run_spec(mut self, run_spec: RunSpec) -> Self {
        self.run_specs.insert(run_spec.run_spec_ref.clone(), run_spec);
        self
    }

    pub(crate) fn without_run_spec(mut self, run_spec_ref: &RunSpecRef) -> Self {
        self.run_specs.remove(run_spec_ref);
        self
    }

    /// Whether any Instance still references `run_spec_ref` (used to
    /// enforce `DeleteRunSpec`'s `RunSpecInUse` precondition).
    pub fn has_instances_referencing(&self, run_spec_ref: &RunSpecRef) -> bool {
        self.instances.values().any(|i| &i.run_spec_ref == run_spec_ref)
    }

    // ------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------

    pub fn get_instance(&self, id: &InstanceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn instance_exists(&self, id: &InstanceId) -> bool {
        self.instances.contains_key(id)
    }

    /// Iterates instances in creation order (oldest first), the order
    /// the Offer Reconciler's first-fit packing requires.
    pub fn instances_oldest_first(&self) -> Vec<&Instance> {
        let mut all: Vec<&Instance> = self.instances.values().collect();
        all.sort_by_key(|i| (i.created_at, i.id));
        all
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub(crate) fn with_new_instance(
        mut self,
        id: InstanceId,
        run_spec_ref: RunSpecRef,
        goal: Goal,
    ) -> Self {
        let instance = Instance {
            id,
            run_spec_ref,
            incarnation: authority_types::Incarnation::FIRST,
            goal,
            condition: Condition::Scheduled,
            agent_id: None,
            last_status_update: None,
            created_at: Timestamp::ZERO,
        };
        self.instances.insert(id, instance);
        self
    }

    /// Like [`Self::with_new_instance`] but stamps `created_at`, used by
    /// the reducer (which has access to the event's timestamp) rather
    /// than by journal replay (which must be deterministic without a
    /// clock and so defers to the delta's own ordering).
    pub(crate) fn with_new_instance_at(
        self,
        id: InstanceId,
        run_spec_ref: RunSpecRef,
        goal: Goal,
        created_at: Timestamp,
    ) -> Self {
        let mut state = self.with_new_instance(id, run_spec_ref, goal);
        if let Some(instance) = state.instances.get_mut(&id) {
            instance.created_at = created_at;
        }
        state
    }

    pub(crate) fn with_instance_goal(mut self, id: InstanceId, goal: Goal) -> Self {
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.goal = goal;
        }
        self
    }

    pub(crate) fn with_instance_condition(
        mut self,
        id: InstanceId,
        condition: Condition,
        agent_id: Option<AgentId>,
        timestamp: Timestamp,
    ) -> Self {
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.condition = condition;
            instance.last_status_update = Some(timestamp);
            if agent_id.is_some() {
                instance.agent_id = agent_id;
            }
        }
        self
    }

    pub(crate) fn without_instance(mut self, id: &InstanceId) -> Self {
        self.instances.remove(id);
        self
    }

    pub(crate) fn with_instances_provisioned(
        mut self,
        offer_id: OfferId,
        ids: &[InstanceId],
        agent_id: AgentId,
    ) -> Self {
        for id in ids {
            if let Some(instance) = self.instances.get_mut(id) {
                instance.condition = Condition::Provisioned;
                instance.agent_id = Some(agent_id.clone());
            }
        }
        if !ids.is_empty() {
            self.pending_reservations
                .insert(offer_id, (agent_id, ids.to_vec()));
        }
        self
    }

    /// Reverts every instance reserved under `offer_id` back to
    /// `Scheduled` and forgets the pending reservation. A no-op if the
    /// offer has no recorded reservation (e.g. it was already released).
    pub(crate) fn with_reservation_released(mut self, offer_id: &OfferId) -> Self {
        if let Some((_, ids)) = self.pending_reservations.remove(offer_id) {
            for id in &ids {
                if let Some(instance) = self.instances.get_mut(id) {
                    instance.condition = Condition::Scheduled;
                    instance.agent_id = None;
                }
            }
        }
        self
    }

    pub fn pending_reservation(&self, offer_id: &OfferId) -> Option<&(AgentId, Vec<InstanceId>)> {
        self.pending_reservations.get(offer_id)
    }

    /// Next incarnation to use when a replacement is scheduled for a
    /// goal=Running instance whose condition just went terminal.
    pub fn next_incarnation(&self, id: &InstanceId) -> Option<authority_types::Incarnation> {
        self.instances.get(id).map(|i| i.incarnation.next())
    }

    /// Bumps an instance to `incarnation`, resetting it to a fresh
    /// placement cycle: condition back to `Scheduled`, agent assignment
    /// cleared, so the next reconciliation pass can match it against an
    /// offer again.
    pub(crate) fn with_instance_replaced(
        mut self,
        id: InstanceId,
        incarnation: authority_types::Incarnation,
        timestamp: Timestamp,
    ) -> Self {
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.incarnation = incarnation;
            instance.condition = Condition::Scheduled;
            instance.agent_id = None;
            instance.last_status_update = Some(timestamp);
        }
        self
    }

    // ------------------------------------------------------------------
    // Framework registration
    // ------------------------------------------------------------------

    pub fn framework_registration(&self) -> Option<&FrameworkRegistration> {
        self.framework.as_ref()
    }

    pub(crate) fn with_framework_registration(
        mut self,
        framework_id: FrameworkId,
        master_id: String,
        broker_version: String,
    ) -> Self {
        self.framework = Some(FrameworkRegistration {
            framework_id,
            last_known_master_id: master_id,
            last_known_broker_version: broker_version,
        });
        self
    }

    pub(crate) fn with_last_known_master_id(mut self, master_id: String, broker_version: String) -> Self {
        if let Some(registration) = self.framework.as_mut() {
            registration.last_known_master_id = master_id;
            registration.last_known_broker_version = broker_version;
        }
        self
    }

    pub(crate) fn without_framework_registration(mut self) -> Self {
        self.framework = None;
        self
    }

    // ------------------------------------------------------------------
    // Invariant checking (used in tests and property checks)
    // ------------------------------------------------------------------

    /// Every Instance.ref must resolve to a present RunSpec: the data
    /// model invariant.
    pub fn check_referential_integrity(&self) -> bool {
        self.instances
            .values()
            .all(|i| self.run_specs.contains_key(&i.run_spec_ref))
    }
}
