use poise::serenity_prelude as serenity;
use tracing::info;

use crate::CommandMeta;
use crate::settings::{guild_only_message, require_manage_channels};
use vesper_core::{Context, Error};
use vesper_database::impls::guild_settings::set_notification_channel;

pub const META: CommandMeta = CommandMeta {
    name: "setchannel",
    desc: "Set the channel join/leave notifications are sent to.",
    category: "settings",
    usage: "!setchannel <#channel|channel_id>",
};

#[poise::command(prefix_command, slash_command, category = "Settings")]
pub async fn setchannel(
    ctx: Context<'_>,
    #[description = "Channel mention or id"]
    #[rest]
    input: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    if !require_manage_channels(&ctx, guild_id).await? {
        return Ok(());
    }

    let Some(channel_id) = input
        .as_deref()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .and_then(parse_channel_id)
    else {
        ctx.say(format!("Usage: `{}`", META.usage)).await?;
        return Ok(());
    };

    let channels = guild_id.channels(ctx.http()).await?;
    let Some(channel) = channels.get(&serenity::ChannelId::new(channel_id)) else {
        ctx.say("That channel does not exist in this server.").await?;
        return Ok(());
    };

    if channel.kind != serenity::ChannelType::Text {
        ctx.say("Notifications can only be sent to a text channel.")
            .await?;
        return Ok(());
    }

    // The bot must be able to post embeds there before the setting is saved.
    let bot_id = { ctx.cache().current_user().id };
    let guild = guild_id.to_partial_guild(ctx.http()).await?;
    let bot_member = guild_id.member(ctx.http(), bot_id).await?;
    let perms = guild.user_permissions_in(channel, &bot_member);
    if !perms.send_messages() || !perms.embed_links() {
        ctx.say(format!(
            "I cannot send embeds in <#{}>. Grant Send Messages and Embed Links there first.",
            channel_id
        ))
        .await?;
        return Ok(());
    }

    set_notification_channel(&ctx.data().db, guild_id.get(), channel_id).await?;
    info!(guild_id = guild_id.get(), channel_id, "notification channel updated");

    ctx.say(format!("Notification channel set to <#{}>.", channel_id))
        .await?;
    Ok(())
}

fn parse_channel_id(raw: &str) -> Option<u64> {
    if let Ok(id) = raw.parse::<u64>() {
        return Some(id);
    }

    if raw.starts_with("<#") && raw.ends_with('>') {
        return raw
            .trim_start_matches("<#")
            .trim_end_matches('>')
            .parse::<u64>()
            .ok();
    }

    None
}
