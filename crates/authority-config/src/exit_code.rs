//! Process exit codes the authority binary returns.

/// The three exit codes the authority ever returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Clean shutdown after processing a `Shutdown` input event.
    Graceful,
    /// The crash strategy escalated a fatal error and the process
    /// terminated itself.
    CrashStrategyTerminal,
    /// Configuration failed to load or validate; the authority never
    /// started.
    Misconfiguration,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ExitCode::Graceful => 0,
            ExitCode::CrashStrategyTerminal => 137,
            ExitCode::Misconfiguration => 1,
        }
    }
}
