use tracing::info;

use crate::CommandMeta;
use crate::settings::{guild_only_message, require_manage_channels};
use vesper_core::{Context, Error};
use vesper_database::impls::guild_settings::set_delay_seconds;
use vesper_utils::formatting::format_delay_setting;

pub const META: CommandMeta = CommandMeta {
    name: "setdelay",
    desc: "Set how long a join notification is held back.",
    category: "settings",
    usage: "!setdelay <seconds>",
};

#[poise::command(prefix_command, slash_command, category = "Settings")]
pub async fn setdelay(
    ctx: Context<'_>,
    #[description = "Delay in seconds"] seconds: Option<u64>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    if !require_manage_channels(&ctx, guild_id).await? {
        return Ok(());
    }

    let Some(seconds) = seconds else {
        ctx.say(format!("Usage: `{}`", META.usage)).await?;
        return Ok(());
    };

    let bounds = ctx.data().bounds;
    if !bounds.contains(seconds) {
        ctx.say(format!(
            "Delay must be between {}s and {}s.",
            bounds.min_seconds, bounds.max_seconds
        ))
        .await?;
        return Ok(());
    }

    set_delay_seconds(&ctx.data().db, guild_id.get(), seconds).await?;
    info!(guild_id = guild_id.get(), seconds, "notification delay updated");

    // Already-scheduled notifications keep their original fire time.
    ctx.say(format!(
        "Notification delay set to {}. Applies to newly scheduled notifications.",
        format_delay_setting(seconds)
    ))
    .await?;
    Ok(())
}
