use std::sync::Mutex;

use authority_types::OfferId;
use tracing::info;

use crate::error::BrokerError;
use crate::offer::{AcceptOperation, Filters};
use crate::task_status::TaskStatus;

/// Outbound calls the authority drives against the broker. Every call
/// is serialized per offer by the Offer Reconciler; this trait itself
/// makes no ordering guarantee of its own.
pub trait BrokerDriver: Send + Sync {
    fn accept_offers(
        &self,
        offer_id: &OfferId,
        operations: &[AcceptOperation],
        filters: Filters,
    ) -> Result<(), BrokerError>;

    fn decline_offer(&self, offer_id: &OfferId, filters: Filters) -> Result<(), BrokerError>;

    fn kill_task(&self, task_id: &str) -> Result<(), BrokerError>;

    fn reconcile_tasks(&self, statuses: &[TaskStatus]) -> Result<(), BrokerError>;
}

/// A driver that logs every call and always succeeds. Used for
/// `highly-available: false` local operation where there is no real
/// broker connection and the Offer Reconciler's decisions are only
/// observed through logs.
#[derive(Debug, Default)]
pub struct LoggingBrokerDriver;

impl BrokerDriver for LoggingBrokerDriver {
    fn accept_offers(
        &self,
        offer_id: &OfferId,
        operations: &[AcceptOperation],
        filters: Filters,
    ) -> Result<(), BrokerError> {
        info!(%offer_id, count = operations.len(), refuse_seconds = filters.refuse_seconds, "accept_offers");
        Ok(())
    }

    fn decline_offer(&self, offer_id: &OfferId, filters: Filters) -> Result<(), BrokerError> {
        info!(%offer_id, refuse_seconds = filters.refuse_seconds, "decline_offer");
        Ok(())
    }

    fn kill_task(&self, task_id: &str) -> Result<(), BrokerError> {
        info!(task_id, "kill_task");
        Ok(())
    }

    fn reconcile_tasks(&self, statuses: &[TaskStatus]) -> Result<(), BrokerError> {
        info!(count = statuses.len(), "reconcile_tasks");
        Ok(())
    }
}

/// A call recorded by [`RecordingBrokerDriver`], for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    AcceptOffers {
        offer_id: OfferId,
        operations: Vec<AcceptOperation>,
        filters: Filters,
    },
    DeclineOffer {
        offer_id: OfferId,
        filters: Filters,
    },
    KillTask {
        task_id: String,
    },
    ReconcileTasks {
        statuses: Vec<TaskStatus>,
    },
}

/// A driver that records every call instead of executing it, for
/// assertions in reconciler and pipeline tests.
#[derive(Debug, Default)]
pub struct RecordingBrokerDriver {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingBrokerDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl BrokerDriver for RecordingBrokerDriver {
    fn accept_offers(
        &self,
        offer_id: &OfferId,
        operations: &[AcceptOperation],
        filters: Filters,
    ) -> Result<(), BrokerError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(RecordedCall::AcceptOffers {
                offer_id: offer_id.clone(),
                operations: operations.to_vec(),
                filters,
            });
        Ok(())
    }

    fn decline_offer(&self, offer_id: &OfferId, filters: Filters) -> Result<(), BrokerError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(RecordedCall::DeclineOffer {
                offer_id: offer_id.clone(),
                filters,
            });
        Ok(())
    }

    fn kill_task(&self, task_id: &str) -> Result<(), BrokerError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(RecordedCall::KillTask {
                task_id: task_id.to_string(),
            });
        Ok(())
    }

    fn reconcile_tasks(&self, statuses: &[TaskStatus]) -> Result<(), BrokerError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(RecordedCall::ReconcileTasks {
                statuses: statuses.to_vec(),
            });
        Ok(())
    }
}
