use std::sync::Arc;

use poise::serenity_prelude as serenity;

use vesper_database::Database;
use vesper_database::impls::{guild_settings, notification_log};
use vesper_notify::config::GuildSettings;
use vesper_notify::port::{JoinNotice, LeaveNotice, LedgerId, NotifierPort};
use vesper_notify::task::{CancelReason, PendingJoinTask};
use vesper_utils::embed::{JOIN_EMBED_COLOR, LEAVE_EMBED_COLOR};
use vesper_utils::formatting::{
    format_compact_duration, format_delay_setting, relative_timestamp,
};

/// Production collaborator wiring: settings and the task ledger live in
/// Postgres, dispatch goes through the Discord REST API.
#[derive(Clone, Debug)]
pub struct GatewayNotifier {
    http: Arc<serenity::Http>,
    db: Database,
}

impl GatewayNotifier {
    pub fn new(http: Arc<serenity::Http>, db: Database) -> Self {
        Self { http, db }
    }
}

impl NotifierPort for GatewayNotifier {
    async fn guild_settings(&self, guild_id: u64) -> anyhow::Result<Option<GuildSettings>> {
        guild_settings::get_guild_settings(&self.db, guild_id).await
    }

    async fn record_scheduled(&self, task: &PendingJoinTask) -> anyhow::Result<LedgerId> {
        notification_log::insert_scheduled(&self.db, task).await
    }

    async fn record_sent(&self, ledger_id: LedgerId, notified_at: u64) -> anyhow::Result<()> {
        notification_log::mark_sent(&self.db, ledger_id, notified_at).await?;
        Ok(())
    }

    async fn record_cancelled(
        &self,
        ledger_id: LedgerId,
        reason: CancelReason,
    ) -> anyhow::Result<()> {
        notification_log::mark_cancelled(&self.db, ledger_id, reason.as_str()).await?;
        Ok(())
    }

    async fn send_join_notification(&self, notice: JoinNotice) -> anyhow::Result<()> {
        serenity::ChannelId::new(notice.destination_channel_id)
            .send_message(
                &self.http,
                serenity::CreateMessage::new().embed(join_embed(&notice)),
            )
            .await?;
        Ok(())
    }

    async fn send_leave_notification(&self, notice: LeaveNotice) -> anyhow::Result<()> {
        serenity::ChannelId::new(notice.destination_channel_id)
            .send_message(
                &self.http,
                serenity::CreateMessage::new().embed(leave_embed(&notice)),
            )
            .await?;
        Ok(())
    }
}

fn join_embed(notice: &JoinNotice) -> serenity::CreateEmbed {
    let fields = [
        format!("**Member :** <@{}>", notice.user_id),
        format!("**Channel :** <#{}>", notice.voice_channel_id),
        format!("**Joined :** {}", relative_timestamp(notice.joined_at)),
    ];

    serenity::CreateEmbed::new()
        .color(JOIN_EMBED_COLOR)
        .title("Voice Channel Join")
        .description(fields.join("\n"))
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Delay: {}",
            format_delay_setting(notice.delay_seconds)
        )))
}

fn leave_embed(notice: &LeaveNotice) -> serenity::CreateEmbed {
    let mut fields = vec![
        format!("**Member :** <@{}>", notice.user_id),
        format!("**Channel :** <#{}>", notice.voice_channel_id),
    ];
    if let Some(joined_at) = notice.joined_at {
        let stayed = notice.left_at.saturating_sub(joined_at);
        fields.push(format!("**Stayed :** {}", format_compact_duration(stayed)));
    }
    fields.push(format!("**Left :** {}", relative_timestamp(notice.left_at)));

    serenity::CreateEmbed::new()
        .color(LEAVE_EMBED_COLOR)
        .title("Voice Channel Leave")
        .description(fields.join("\n"))
}
