use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{DelayBounds, GuildSettings};
use crate::occupancy::OccupancyTracker;
use crate::port::{JoinNotice, LeaveNotice, LedgerId, NotifierPort};
use crate::scheduler::DelayScheduler;
use crate::task::{CancelReason, PendingJoinTask, TaskKey};

/// One raw gateway voice-state change, reduced to what classification needs.
#[derive(Clone, Copy, Debug)]
pub struct VoicePresenceUpdate {
    pub guild_id: u64,
    pub user_id: u64,
    pub old_channel_id: Option<u64>,
    pub new_channel_id: Option<u64>,
    pub is_automated: bool,
}

#[derive(Clone, Copy, Debug)]
struct MemberLocation {
    channel_id: u64,
    joined_at: u64,
}

#[derive(Clone, Copy, Debug)]
struct PendingRecord {
    ledger_id: LedgerId,
    joined_at: u64,
    delay_seconds: u64,
}

#[derive(Debug, Default)]
struct EngineState {
    occupancy: OccupancyTracker,
    locations: HashMap<(u64, u64), MemberLocation>,
    pending: HashMap<TaskKey, PendingRecord>,
}

/// Classifies voice-presence transitions and drives the occupancy tracker,
/// the task ledger, and the delay scheduler.
///
/// One mutex guards the shared state (counts, member locations, pending
/// table) and is held only for in-memory bookkeeping; settings reads, ledger
/// writes and dispatch all run outside it. The fire and cancel paths race
/// through removal from the pending table under that lock, so each task
/// reaches exactly one terminal state under any interleaving.
#[derive(Debug)]
pub struct TransitionEngine<P> {
    port: Arc<P>,
    bounds: DelayBounds,
    scheduler: DelayScheduler,
    state: Mutex<EngineState>,
}

impl<P: NotifierPort> TransitionEngine<P> {
    pub fn new(port: Arc<P>, bounds: DelayBounds) -> Arc<Self> {
        Arc::new(Self {
            port,
            bounds,
            scheduler: DelayScheduler::new(),
            state: Mutex::new(EngineState::default()),
        })
    }

    pub fn bounds(&self) -> DelayBounds {
        self.bounds
    }

    /// Process one gateway voice-state update.
    ///
    /// A move is decomposed into leave(origin) then join(destination), in
    /// that fixed order; the two channels are evaluated independently.
    pub async fn handle_update(self: &Arc<Self>, update: VoicePresenceUpdate) {
        if update.is_automated {
            return;
        }

        match (update.old_channel_id, update.new_channel_id) {
            (None, Some(destination)) => {
                self.handle_join(update.guild_id, update.user_id, destination)
                    .await;
            }
            (Some(origin), None) => {
                self.handle_leave(update.guild_id, update.user_id, origin)
                    .await;
            }
            (Some(origin), Some(destination)) if origin != destination => {
                self.handle_leave(update.guild_id, update.user_id, origin)
                    .await;
                self.handle_join(update.guild_id, update.user_id, destination)
                    .await;
            }
            // Mute/deafen-only updates carry identical channels.
            _ => {}
        }
    }

    async fn handle_join(self: &Arc<Self>, guild_id: u64, user_id: u64, channel_id: u64) {
        let joined_at = now_unix_secs();

        let (previous, current) = {
            let mut state = self.state.lock().await;
            state.locations.insert(
                (guild_id, user_id),
                MemberLocation {
                    channel_id,
                    joined_at,
                },
            );
            state.occupancy.record(guild_id, channel_id, true)
        };
        debug!(guild_id, channel_id, user_id, previous, current, "voice join");

        if !(previous == 0 && current == 1) {
            debug!(guild_id, channel_id, "channel already occupied; no join task");
            return;
        }

        let settings = self.settings_for(guild_id).await;
        let delay_seconds = self.bounds.clamp(settings.delay_seconds);
        let key = TaskKey {
            guild_id,
            channel_id,
            user_id,
        };
        let task = PendingJoinTask {
            key,
            joined_at,
            delay: Duration::from_secs(delay_seconds),
            notification_channel_id: settings.notification_channel_id,
        };

        // No durable record means no timer: a ledger failure aborts
        // scheduling for this task instead of leaving an orphaned timer.
        let ledger_id = match self.port.record_scheduled(&task).await {
            Ok(ledger_id) => ledger_id,
            Err(source) => {
                error!(
                    ?source,
                    guild_id,
                    channel_id,
                    user_id,
                    "task ledger write failed; join notification not scheduled"
                );
                return;
            }
        };

        {
            let mut state = self.state.lock().await;
            let still_here = state
                .locations
                .get(&(guild_id, user_id))
                .is_some_and(|location| location.channel_id == channel_id);
            if !still_here {
                drop(state);
                debug!(?key, "member left during ledger write; task not scheduled");
                self.mark_cancelled(ledger_id, CancelReason::MemberLeft).await;
                return;
            }

            state.pending.insert(
                key,
                PendingRecord {
                    ledger_id,
                    joined_at,
                    delay_seconds,
                },
            );

            // Timer installed under the same lock so a concurrent leave
            // cannot slip between bookkeeping and scheduling.
            let engine = Arc::clone(self);
            self.scheduler
                .schedule(key, Duration::from_secs(delay_seconds), move || {
                    engine.fire(key)
                });
        }

        info!(
            guild_id,
            channel_id, user_id, delay_seconds, "join notification scheduled"
        );
    }

    async fn handle_leave(&self, guild_id: u64, user_id: u64, channel_id: u64) {
        let left_at = now_unix_secs();
        let key = TaskKey {
            guild_id,
            channel_id,
            user_id,
        };

        let (cancelled, previous, current, joined_at) = {
            let mut state = self.state.lock().await;

            let cancelled = state.pending.remove(&key);
            if cancelled.is_some() {
                self.scheduler.cancel(key);
            }

            let owns_location = state
                .locations
                .get(&(guild_id, user_id))
                .is_some_and(|location| location.channel_id == channel_id);
            let joined_at = if owns_location {
                state
                    .locations
                    .remove(&(guild_id, user_id))
                    .map(|location| location.joined_at)
            } else {
                None
            };

            let (previous, current) = state.occupancy.record(guild_id, channel_id, false);
            (cancelled, previous, current, joined_at)
        };
        debug!(guild_id, channel_id, user_id, previous, current, "voice leave");

        // Resolve the pending task before the 1→0 notification is evaluated.
        if let Some(record) = cancelled {
            info!(
                guild_id,
                channel_id, user_id, "pending join task cancelled by early leave"
            );
            self.mark_cancelled(record.ledger_id, CancelReason::MemberLeft)
                .await;
        }

        if !(previous == 1 && current == 0) {
            debug!(guild_id, channel_id, "channel still occupied; no leave notification");
            return;
        }

        let settings = self.settings_for(guild_id).await;
        let Some(destination_channel_id) = settings.dispatch_target() else {
            debug!(guild_id, "leave dispatch suppressed by configuration");
            return;
        };

        let notice = LeaveNotice {
            destination_channel_id,
            guild_id,
            voice_channel_id: channel_id,
            user_id,
            joined_at,
            left_at,
        };
        if let Err(source) = self.port.send_leave_notification(notice).await {
            error!(
                ?source,
                guild_id, channel_id, "leave notification dispatch failed"
            );
        }
    }

    /// Timer callback: re-validate presence and configuration, then dispatch.
    async fn fire(self: Arc<Self>, key: TaskKey) {
        self.scheduler.forget(key);

        let (claimed, still_present) = {
            let mut state = self.state.lock().await;
            let claimed = state.pending.remove(&key);
            let still_present = state
                .locations
                .get(&(key.guild_id, key.user_id))
                .is_some_and(|location| location.channel_id == key.channel_id);
            (claimed, still_present)
        };

        let Some(record) = claimed else {
            debug!(?key, "timer fired after cancellation; nothing to do");
            return;
        };

        if !still_present {
            // Cancellation normally wins this race; this guards the
            // interleaving where it does not.
            warn!(?key, "member absent at fire time with task still pending");
            self.mark_cancelled(record.ledger_id, CancelReason::MemberLeft)
                .await;
            return;
        }

        // The settings may have changed during the delay window.
        let settings = self.settings_for(key.guild_id).await;
        let Some(destination_channel_id) = settings.dispatch_target() else {
            info!(
                guild_id = key.guild_id,
                channel_id = key.channel_id,
                "join dispatch suppressed by configuration at fire time"
            );
            self.mark_cancelled(record.ledger_id, CancelReason::ConfigSuppressed)
                .await;
            return;
        };

        let notice = JoinNotice {
            destination_channel_id,
            guild_id: key.guild_id,
            voice_channel_id: key.channel_id,
            user_id: key.user_id,
            joined_at: record.joined_at,
            delay_seconds: record.delay_seconds,
        };
        if let Err(source) = self.port.send_join_notification(notice).await {
            // The attempt was made; retry belongs to the dispatch side.
            error!(
                ?source,
                guild_id = key.guild_id,
                channel_id = key.channel_id,
                "join notification dispatch failed"
            );
        }

        self.mark_sent(record.ledger_id, now_unix_secs()).await;
        info!(
            guild_id = key.guild_id,
            channel_id = key.channel_id,
            user_id = key.user_id,
            "join notification fired"
        );
    }

    /// Rebuild a guild's occupancy and member locations from gateway cache
    /// state. `occupants` holds (user, voice channel) pairs with automated
    /// members already filtered out.
    pub async fn seed_presence(&self, guild_id: u64, occupants: &[(u64, u64)]) {
        let seeded_at = now_unix_secs();

        let mut state = self.state.lock().await;
        state.occupancy.clear_guild(guild_id);
        state.locations.retain(|(guild, _), _| *guild != guild_id);
        for &(user_id, channel_id) in occupants {
            state.locations.insert(
                (guild_id, user_id),
                MemberLocation {
                    channel_id,
                    joined_at: seeded_at,
                },
            );
            state.occupancy.record(guild_id, channel_id, true);
        }
        drop(state);

        info!(
            guild_id,
            occupants = occupants.len(),
            "seeded voice presence from gateway state"
        );
    }

    /// Cancel every pending task, recording each as shutdown-cancelled.
    pub async fn shutdown(&self) {
        let drained: Vec<(TaskKey, PendingRecord)> = {
            let mut state = self.state.lock().await;
            state.pending.drain().collect()
        };
        self.scheduler.cancel_all();

        for (key, record) in drained {
            info!(?key, "cancelling pending join task at shutdown");
            self.mark_cancelled(record.ledger_id, CancelReason::Shutdown)
                .await;
        }
    }

    /// Number of scheduled-but-not-yet-fired tasks for a guild.
    pub async fn pending_count(&self, guild_id: u64) -> usize {
        let state = self.state.lock().await;
        state
            .pending
            .keys()
            .filter(|key| key.guild_id == guild_id)
            .count()
    }

    async fn settings_for(&self, guild_id: u64) -> GuildSettings {
        match self.port.guild_settings(guild_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => GuildSettings::defaults(&self.bounds),
            Err(source) => {
                error!(?source, guild_id, "failed to read guild settings; using defaults");
                GuildSettings::defaults(&self.bounds)
            }
        }
    }

    async fn mark_sent(&self, ledger_id: LedgerId, notified_at: u64) {
        if let Err(source) = self.port.record_sent(ledger_id, notified_at).await {
            error!(?source, ledger_id, "failed to record sent status");
        }
    }

    async fn mark_cancelled(&self, ledger_id: LedgerId, reason: CancelReason) {
        if let Err(source) = self.port.record_cancelled(ledger_id, reason).await {
            error!(?source, ledger_id, reason = reason.as_str(), "failed to record cancelled status");
        }
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    use super::*;

    const GUILD: u64 = 7;
    const VOICE_X: u64 = 100;
    const VOICE_Y: u64 = 101;
    const DEST: u64 = 900;

    #[derive(Default)]
    struct MockPort {
        settings: StdMutex<Option<GuildSettings>>,
        fail_ledger: AtomicBool,
        next_id: AtomicI64,
        scheduled: StdMutex<Vec<PendingJoinTask>>,
        sent: StdMutex<Vec<LedgerId>>,
        cancelled: StdMutex<Vec<(LedgerId, CancelReason)>>,
        joins: StdMutex<Vec<JoinNotice>>,
        leaves: StdMutex<Vec<LeaveNotice>>,
    }

    impl MockPort {
        fn configured() -> Arc<Self> {
            let port = Self::default();
            port.set_settings(Some(GuildSettings {
                notification_channel_id: Some(DEST),
                delay_seconds: 30,
                enabled: true,
            }));
            Arc::new(port)
        }

        fn set_settings(&self, settings: Option<GuildSettings>) {
            *self.settings.lock().unwrap() = settings;
        }

        fn scheduled(&self) -> Vec<PendingJoinTask> {
            self.scheduled.lock().unwrap().clone()
        }

        fn sent(&self) -> Vec<LedgerId> {
            self.sent.lock().unwrap().clone()
        }

        fn cancelled(&self) -> Vec<(LedgerId, CancelReason)> {
            self.cancelled.lock().unwrap().clone()
        }

        fn joins(&self) -> Vec<JoinNotice> {
            self.joins.lock().unwrap().clone()
        }

        fn leaves(&self) -> Vec<LeaveNotice> {
            self.leaves.lock().unwrap().clone()
        }
    }

    impl NotifierPort for MockPort {
        async fn guild_settings(&self, _guild_id: u64) -> anyhow::Result<Option<GuildSettings>> {
            Ok(*self.settings.lock().unwrap())
        }

        async fn record_scheduled(&self, task: &PendingJoinTask) -> anyhow::Result<LedgerId> {
            if self.fail_ledger.load(Ordering::SeqCst) {
                anyhow::bail!("ledger unavailable");
            }
            self.scheduled.lock().unwrap().push(*task);
            Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
        }

        async fn record_sent(&self, ledger_id: LedgerId, _notified_at: u64) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(ledger_id);
            Ok(())
        }

        async fn record_cancelled(
            &self,
            ledger_id: LedgerId,
            reason: CancelReason,
        ) -> anyhow::Result<()> {
            self.cancelled.lock().unwrap().push((ledger_id, reason));
            Ok(())
        }

        async fn send_join_notification(&self, notice: JoinNotice) -> anyhow::Result<()> {
            self.joins.lock().unwrap().push(notice);
            Ok(())
        }

        async fn send_leave_notification(&self, notice: LeaveNotice) -> anyhow::Result<()> {
            self.leaves.lock().unwrap().push(notice);
            Ok(())
        }
    }

    fn engine(port: &Arc<MockPort>) -> Arc<TransitionEngine<MockPort>> {
        TransitionEngine::new(Arc::clone(port), DelayBounds::new(5, 600, 60))
    }

    fn join(user_id: u64, channel_id: u64) -> VoicePresenceUpdate {
        VoicePresenceUpdate {
            guild_id: GUILD,
            user_id,
            old_channel_id: None,
            new_channel_id: Some(channel_id),
            is_automated: false,
        }
    }

    fn leave(user_id: u64, channel_id: u64) -> VoicePresenceUpdate {
        VoicePresenceUpdate {
            guild_id: GUILD,
            user_id,
            old_channel_id: Some(channel_id),
            new_channel_id: None,
            is_automated: false,
        }
    }

    fn move_channels(user_id: u64, origin: u64, destination: u64) -> VoicePresenceUpdate {
        VoicePresenceUpdate {
            guild_id: GUILD,
            user_id,
            old_channel_id: Some(origin),
            new_channel_id: Some(destination),
            is_automated: false,
        }
    }

    async fn advance(seconds: u64) {
        tokio::time::sleep(Duration::from_secs(seconds)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_join_schedules_and_sends_after_delay() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        let scheduled = port.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].delay, Duration::from_secs(30));
        assert_eq!(engine.pending_count(GUILD).await, 1);
        assert!(port.joins().is_empty());

        advance(31).await;
        let joins = port.joins();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].destination_channel_id, DEST);
        assert_eq!(joins[0].voice_channel_id, VOICE_X);
        assert_eq!(joins[0].user_id, 1);
        assert_eq!(port.sent(), vec![1]);
        assert!(port.cancelled().is_empty());
        assert_eq!(engine.pending_count(GUILD).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn join_into_occupied_channel_is_silent() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        engine.handle_update(join(2, VOICE_X)).await;
        assert_eq!(port.scheduled().len(), 1);

        advance(31).await;
        assert_eq!(port.joins().len(), 1);
        assert_eq!(port.joins()[0].user_id, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn early_leave_cancels_task_and_still_sends_leave_notice() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        advance(10).await;
        engine.handle_update(leave(1, VOICE_X)).await;

        assert_eq!(port.cancelled(), vec![(1, CancelReason::MemberLeft)]);
        assert_eq!(engine.pending_count(GUILD).await, 0);

        // The 1→0 leave notification is evaluated independently of the
        // join task's fate.
        let leaves = port.leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].voice_channel_id, VOICE_X);
        assert!(leaves[0].joined_at.is_some());

        advance(120).await;
        assert!(port.joins().is_empty());
        assert!(port.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn leave_with_remaining_occupants_is_silent() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        engine.handle_update(join(2, VOICE_X)).await;
        engine.handle_update(leave(2, VOICE_X)).await;

        assert!(port.leaves().is_empty());
        assert!(port.cancelled().is_empty());

        advance(31).await;
        assert_eq!(port.joins().len(), 1);
        assert_eq!(port.sent(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn move_fires_leave_for_origin_and_schedules_for_destination() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        advance(5).await;
        engine.handle_update(move_channels(1, VOICE_X, VOICE_Y)).await;

        assert_eq!(port.cancelled(), vec![(1, CancelReason::MemberLeft)]);
        let leaves = port.leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].voice_channel_id, VOICE_X);
        assert_eq!(port.scheduled().len(), 2);
        assert_eq!(port.scheduled()[1].key.channel_id, VOICE_Y);

        advance(31).await;
        let joins = port.joins();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].voice_channel_id, VOICE_Y);
        assert_eq!(port.sent(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn mute_only_update_is_noop() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        engine.handle_update(move_channels(1, VOICE_X, VOICE_X)).await;

        assert_eq!(port.scheduled().len(), 1);
        assert!(port.cancelled().is_empty());
        assert!(port.leaves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn automated_members_never_count() {
        let port = MockPort::configured();
        let engine = engine(&port);

        let bot = VoicePresenceUpdate {
            is_automated: true,
            ..join(50, VOICE_X)
        };
        engine.handle_update(bot).await;
        assert!(port.scheduled().is_empty());

        // The human join is still a 0→1 transition.
        engine.handle_update(join(1, VOICE_X)).await;
        assert_eq!(port.scheduled().len(), 1);

        engine.handle_update(leave(1, VOICE_X)).await;
        assert_eq!(port.leaves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_guild_still_bookkeeps_and_suppresses_at_fire() {
        let port = MockPort::configured();
        port.set_settings(Some(GuildSettings {
            notification_channel_id: Some(DEST),
            delay_seconds: 30,
            enabled: false,
        }));
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        // Bookkeeping still happens for disabled guilds.
        assert_eq!(port.scheduled().len(), 1);

        advance(31).await;
        assert!(port.joins().is_empty());
        assert_eq!(port.cancelled(), vec![(1, CancelReason::ConfigSuppressed)]);
    }

    #[tokio::test(start_paused = true)]
    async fn config_disabled_during_delay_suppresses_dispatch() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        advance(10).await;
        port.set_settings(Some(GuildSettings {
            notification_channel_id: None,
            delay_seconds: 30,
            enabled: true,
        }));

        advance(25).await;
        assert!(port.joins().is_empty());
        assert_eq!(port.cancelled(), vec![(1, CancelReason::ConfigSuppressed)]);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_delay_is_clamped_to_bounds() {
        let port = MockPort::configured();
        port.set_settings(Some(GuildSettings {
            notification_channel_id: Some(DEST),
            delay_seconds: 10_000,
            enabled: true,
        }));
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        assert_eq!(port.scheduled()[0].delay, Duration::from_secs(600));

        advance(599).await;
        assert!(port.joins().is_empty());
        advance(2).await;
        assert_eq!(port.joins().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_reconfiguration_does_not_reschedule_pending_timer() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        port.set_settings(Some(GuildSettings {
            notification_channel_id: Some(DEST),
            delay_seconds: 5,
            enabled: true,
        }));

        // Past the new delay but short of the originally scheduled one.
        advance(10).await;
        assert!(port.joins().is_empty());

        advance(25).await;
        assert_eq!(port.joins().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ledger_failure_aborts_scheduling() {
        let port = MockPort::configured();
        port.fail_ledger.store(true, Ordering::SeqCst);
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        assert_eq!(engine.pending_count(GUILD).await, 0);

        advance(120).await;
        assert!(port.joins().is_empty());
        assert!(port.sent().is_empty());
        assert!(port.cancelled().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn leave_after_sent_keeps_single_terminal_state() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        advance(31).await;
        assert_eq!(port.sent(), vec![1]);

        engine.handle_update(leave(1, VOICE_X)).await;
        assert_eq!(port.leaves().len(), 1);
        assert!(port.cancelled().is_empty());
        assert_eq!(port.sent(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn successor_member_gets_independent_task() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        advance(10).await;
        engine.handle_update(leave(1, VOICE_X)).await;
        engine.handle_update(join(2, VOICE_X)).await;

        assert_eq!(port.scheduled().len(), 2);
        assert_eq!(port.cancelled(), vec![(1, CancelReason::MemberLeft)]);

        advance(31).await;
        let joins = port.joins();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].user_id, 2);
        assert_eq!(port.sent(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfigured_guild_uses_default_delay_and_suppresses_dispatch() {
        let port = Arc::new(MockPort::default());
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        let scheduled = port.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].delay, Duration::from_secs(60));

        advance(61).await;
        assert!(port.joins().is_empty());
        assert_eq!(port.cancelled(), vec![(1, CancelReason::ConfigSuppressed)]);
    }

    #[tokio::test(start_paused = true)]
    async fn seeded_presence_counts_toward_transitions() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.seed_presence(GUILD, &[(1, VOICE_X)]).await;

        // The seeded member already occupies the channel, so this join is
        // not a 0→1 transition.
        engine.handle_update(join(2, VOICE_X)).await;
        assert!(port.scheduled().is_empty());

        engine.handle_update(leave(2, VOICE_X)).await;
        assert!(port.leaves().is_empty());

        engine.handle_update(leave(1, VOICE_X)).await;
        assert_eq!(port.leaves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_all_pending_tasks() {
        let port = MockPort::configured();
        let engine = engine(&port);

        engine.handle_update(join(1, VOICE_X)).await;
        engine.handle_update(join(2, VOICE_Y)).await;
        assert_eq!(engine.pending_count(GUILD).await, 2);

        engine.shutdown().await;
        assert_eq!(engine.pending_count(GUILD).await, 0);

        let cancelled = port.cancelled();
        assert_eq!(cancelled.len(), 2);
        assert!(cancelled
            .iter()
            .all(|(_, reason)| *reason == CancelReason::Shutdown));

        advance(120).await;
        assert!(port.joins().is_empty());
    }
}
