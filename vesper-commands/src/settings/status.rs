use poise::serenity_prelude as serenity;

use crate::CommandMeta;
use crate::settings::{guild_only_message, require_manage_channels};
use vesper_core::{Context, Error};
use vesper_database::impls::guild_settings::get_guild_settings;
use vesper_database::impls::notification_log::guild_activity_since;
use vesper_utils::embed::DEFAULT_EMBED_COLOR;
use vesper_utils::formatting::format_delay_setting;
use vesper_utils::time::now_unix_secs;

pub const META: CommandMeta = CommandMeta {
    name: "status",
    desc: "Show the current notification settings and recent activity.",
    category: "settings",
    usage: "!status",
};

const ACTIVITY_WINDOW_SECONDS: u64 = 7 * 86_400;

#[poise::command(prefix_command, slash_command, category = "Settings")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    if !require_manage_channels(&ctx, guild_id).await? {
        return Ok(());
    }

    let data = ctx.data();
    let settings = get_guild_settings(&data.db, guild_id.get()).await?;
    let pending = data.notifier.pending_count(guild_id.get()).await;

    let since = now_unix_secs().saturating_sub(ACTIVITY_WINDOW_SECONDS);
    let activity = guild_activity_since(&data.db, guild_id.get(), since).await?;

    let mut fields = Vec::new();
    match settings {
        Some(settings) => {
            fields.push(format!(
                "**Notifications :** {}",
                if settings.enabled { "Enabled" } else { "Disabled" }
            ));
            fields.push(format!(
                "**Delay :** {}",
                format_delay_setting(settings.delay_seconds)
            ));
            fields.push(match settings.notification_channel_id {
                Some(channel_id) => format!("**Channel :** <#{}>", channel_id),
                None => "**Channel :** not set (run `/setchannel`)".to_owned(),
            });
        }
        None => {
            fields.push("Not configured yet. Run `/setchannel` to get started.".to_owned());
        }
    }

    fields.push(String::new());
    fields.push(format!("**Pending notifications :** {}", pending));
    fields.push(format!(
        "**Last 7 days :** {} sent, {} cancelled",
        activity.sent, activity.cancelled
    ));

    let embed = serenity::CreateEmbed::new()
        .color(DEFAULT_EMBED_COLOR)
        .title("Voice Notification Status")
        .description(fields.join("\n"));

    ctx.send(poise::CreateReply::default().ephemeral(true).embed(embed))
        .await?;
    Ok(())
}
