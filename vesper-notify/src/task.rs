use std::time::Duration;

/// Identity of one pending join notification.
///
/// The member is part of the identity: after the first occupant leaves, a
/// different member joining the same channel creates an independent task that
/// must never be conflated with its predecessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub guild_id: u64,
    pub channel_id: u64,
    pub user_id: u64,
}

/// Lifecycle of a ledger entry. `Sent` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Scheduled,
    Sent,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Scheduled => "scheduled",
            TaskStatus::Sent => "sent",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// Why a task ended up `Cancelled`, recorded alongside the status so a
/// config-suppressed fire stays distinguishable from an early leave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    MemberLeft,
    ConfigSuppressed,
    Shutdown,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::MemberLeft => "member_left",
            CancelReason::ConfigSuppressed => "config_suppressed",
            CancelReason::Shutdown => "shutdown",
        }
    }
}

/// One in-flight delayed join notification, created on a 0→1 transition.
#[derive(Clone, Copy, Debug)]
pub struct PendingJoinTask {
    pub key: TaskKey,
    pub joined_at: u64,
    pub delay: Duration,
    /// Destination configured at scheduling time. Dispatch re-reads the
    /// settings at fire time; this is kept for the audit record only.
    pub notification_channel_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::{CancelReason, TaskStatus};

    #[test]
    fn status_labels_match_ledger_values() {
        assert_eq!(TaskStatus::Scheduled.as_str(), "scheduled");
        assert_eq!(TaskStatus::Sent.as_str(), "sent");
        assert_eq!(TaskStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn cancel_reasons_are_stable() {
        assert_eq!(CancelReason::MemberLeft.as_str(), "member_left");
        assert_eq!(CancelReason::ConfigSuppressed.as_str(), "config_suppressed");
        assert_eq!(CancelReason::Shutdown.as_str(), "shutdown");
    }
}
