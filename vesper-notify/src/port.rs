use std::future::Future;

use crate::config::GuildSettings;
use crate::task::{CancelReason, PendingJoinTask};

/// Row id handed back by the task ledger on creation.
pub type LedgerId = i64;

/// Payload for a delayed join notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinNotice {
    pub destination_channel_id: u64,
    pub guild_id: u64,
    pub voice_channel_id: u64,
    pub user_id: u64,
    pub joined_at: u64,
    pub delay_seconds: u64,
}

/// Payload for an immediate leave notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeaveNotice {
    pub destination_channel_id: u64,
    pub guild_id: u64,
    pub voice_channel_id: u64,
    pub user_id: u64,
    /// When the member entered the channel, if the engine saw the join.
    pub joined_at: Option<u64>,
    pub left_at: u64,
}

/// Interface to the engine's collaborators: the settings store, the durable
/// task ledger, and message dispatch.
///
/// Ledger writes are synchronous-contracted: a method returns only once the
/// record is durable, and dispatch never runs ahead of its `scheduled` row.
pub trait NotifierPort: Send + Sync + 'static {
    /// Latest committed settings for a guild, `None` when never configured.
    fn guild_settings(
        &self,
        guild_id: u64,
    ) -> impl Future<Output = anyhow::Result<Option<GuildSettings>>> + Send;

    /// Persist a new task in `scheduled` state and return its ledger id.
    fn record_scheduled(
        &self,
        task: &PendingJoinTask,
    ) -> impl Future<Output = anyhow::Result<LedgerId>> + Send;

    /// Transition a ledger row to `sent`.
    fn record_sent(
        &self,
        ledger_id: LedgerId,
        notified_at: u64,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Transition a ledger row to `cancelled` with a reason code.
    fn record_cancelled(
        &self,
        ledger_id: LedgerId,
        reason: CancelReason,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn send_join_notification(
        &self,
        notice: JoinNotice,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn send_leave_notification(
        &self,
        notice: LeaveNotice,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}
