//! # authority-broker: resource-broker adapter and driver boundary
//!
//! This crate defines only the shape of the broker integration — it
//! holds no connection of its own. The runtime wires a
//! concrete broker SDK's callbacks into [`BrokerEvent`]s and drives the
//! reconciler's decisions out through a [`BrokerDriver`] implementation.
//!
//! - [`event::BrokerEvent`]: every inbound callback the broker can
//!   deliver.
//! - [`driver::BrokerDriver`]: the four outbound calls the authority
//!   makes.
//! - [`task_id`]: the wire encoding linking a broker task id back to an
//!   `(InstanceId, Incarnation)` pair.

mod driver;
mod error;
mod event;
mod offer;
pub mod task_id;
mod task_status;

pub use driver::{BrokerDriver, LoggingBrokerDriver, RecordedCall, RecordingBrokerDriver};
pub use error::BrokerError;
pub use event::BrokerEvent;
pub use offer::{AcceptOperation, Filters, Offer};
pub use task_status::{MasterInfo, TaskStatus};
