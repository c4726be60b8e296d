//! Crash strategy: what the pipeline does when something goes wrong
//! below the level the kernel's `Rejection` type can express.
//!
//! Two kinds of failure reach this module:
//!
//! - **Transient**: the journal or broker call failed but the in-memory
//!   state is still sound (e.g. a disk write error). The pipeline keeps
//!   running and surfaces `CommandFailure` for the request that hit it.
//! - **Terminal**: an invariant the kernel assumes can never be broken
//!   was broken anyway (a reducer panic, a torn snapshot). Continuing to
//!   serve commands from state that might be corrupt is worse than
//!   stopping, so the authority releases leadership, notifies observers,
//!   and exits the process — mirroring the asynchronous-exit /
//!   shutdown-hook pattern other JVM-hosted schedulers use, translated
//!   to an injectable exit function so tests can observe it without
//!   tearing down the test process itself.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::error;

use authority_kernel::{Effect, NotifyEvent};

use crate::pipeline::EffectSink;

/// A failure severe enough that the pipeline cannot continue serving
/// commands from its current in-memory state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
    pub reason: String,
}

impl FatalError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Runs `f`, catching any panic and turning it into a [`FatalError`]
/// rather than unwinding through the worker thread. The kernel is
/// assumed panic-free; this exists for the failure mode where that
/// assumption turns out to be wrong.
pub fn catch_reducer_panic<T>(f: impl FnOnce() -> T) -> Result<T, FatalError> {
    std::panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "reducer panicked with a non-string payload".to_string());
        FatalError::new(message)
    })
}

/// Handles a [`FatalError`]: logs it, runs `on_fatal` (releasing
/// leadership and notifying observers is the caller's job, done before
/// this is invoked so it can still use a sound snapshot), then exits the
/// process through the injected `exit` function.
///
/// `exit` defaults to [`std::process::exit`] in production; tests inject
/// a closure that records the call instead of actually terminating.
pub struct CrashStrategy {
    exit: Arc<dyn Fn(i32) + Send + Sync>,
}

impl std::fmt::Debug for CrashStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrashStrategy").finish_non_exhaustive()
    }
}

/// Exit code used when the authority terminates after a fatal error.
/// Distinct from a clean shutdown (0) and a configuration error (1), the
/// way `kill -9`-adjacent termination is conventionally distinguished at
/// 128+signal; 137 here instead marks "the process chose to stop itself
/// because its state could no longer be trusted".
pub const EXIT_CODE_FATAL: i32 = 137;

/// How long `escalate` waits, off the calling thread, before actually
/// exiting — long enough for the response already queued for the
/// request that triggered the crash to reach its sink.
const EXIT_DELAY: Duration = Duration::from_millis(50);

impl CrashStrategy {
    pub fn new() -> Self {
        Self {
            exit: Arc::new(|code| std::process::exit(code)),
        }
    }

    /// Builds a strategy with an injected exit function, for tests that
    /// need to observe termination without killing the test process.
    pub fn with_exit(exit: Arc<dyn Fn(i32) + Send + Sync>) -> Self {
        Self { exit }
    }

    /// Escalates a fatal error: logs it, releases leadership, notifies
    /// observers that the scheduler is going away, then exits from a
    /// detached thread after [`EXIT_DELAY`] so the response already
    /// queued for whatever triggered the crash has a chance to drain
    /// before the process goes down. Returns immediately; the exit
    /// itself always happens off the calling thread.
    pub fn escalate(&self, error: &FatalError, is_leader: &AtomicBool, sink: &dyn EffectSink) {
        error!(reason = %error.reason, "fatal error, terminating");
        is_leader.store(false, Ordering::SeqCst);
        sink.effect(Effect::Notify {
            event: NotifyEvent::SchedulerDisconnected,
        });

        let exit = Arc::clone(&self.exit);
        thread::spawn(move || {
            thread::sleep(EXIT_DELAY);
            exit(EXIT_CODE_FATAL);
        });
    }
}

impl Default for CrashStrategy {
    fn default() -> Self {
        Self::new()
    }
}
