//! The pipeline's single input stream.
//!
//! Every external trigger the authority reacts to — an operator command,
//! a broker callback, a leadership change — is translated into an
//! [`InputEvent`] before it reaches the bounded queue. The pipeline
//! worker drains these one at a time, so there is never more than one
//! event being reduced at once ("single-writer").

use authority_broker::Offer;
use authority_kernel::kernel::{FrameworkEvent, StatusUpdate};
use authority_kernel::Command;
use authority_types::{OfferId, RequestId};

/// One unit of work for the pipeline worker.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// An operator- or API-submitted command, tagged with the id its
    /// eventual `CommandAccepted`/`CommandFailure` response must carry.
    CommandRequest { request_id: RequestId, command: Command },

    /// A broker-reported task condition change, already translated by
    /// the Instance Tracker.
    StatusUpdate(StatusUpdate),

    /// A framework registration handshake.
    FrameworkEvent(FrameworkEvent),

    /// A resource offer to match against the current snapshot.
    OfferReceived(Offer),

    /// The broker withdrew an offer before it was accepted or declined;
    /// any reservation made against it must be released.
    OfferRescinded { offer_id: OfferId },

    /// This process became leader: the snapshot must be rebuilt from the
    /// journal and broker reconciliation kicked off before accepting new
    /// commands.
    LeadershipAcquired,

    /// Leadership was lost mid-operation. In-flight and subsequently
    /// queued commands are drained with `CommandFailure{LeadershipLost}`
    /// until leadership is reacquired.
    LeadershipLost,

    /// Graceful shutdown: stop the worker loop after the queue drains.
    Shutdown,
}
