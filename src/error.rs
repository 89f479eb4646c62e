//! Fault taxonomy shared by the components.
//!
//! Nothing here propagates to the caller of the interpreter: every fault is
//! turned into a reply where it happens and only logged under its kind.

/// Coarse classification used when logging a recovered fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Malformed reminder expression or out-of-range numbers.
    Parse,
    /// A capability grant the operation needs is missing.
    PermissionDenied,
    /// The platform did not apply or confirm a requested change.
    PlatformRejected,
    /// No intent matched the utterance.
    Unrecognized,
}

impl FaultKind {
    pub fn label(self) -> &'static str {
        match self {
            FaultKind::Parse => "parse",
            FaultKind::PermissionDenied => "permission_denied",
            FaultKind::PlatformRejected => "platform_rejected",
            FaultKind::Unrecognized => "unrecognized",
        }
    }
}
