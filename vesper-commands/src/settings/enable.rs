use tracing::info;

use crate::CommandMeta;
use crate::settings::{guild_only_message, require_manage_channels};
use vesper_core::{Context, Error};
use vesper_database::impls::guild_settings::set_enabled;

pub const META: CommandMeta = CommandMeta {
    name: "enable",
    desc: "Enable voice channel notifications.",
    category: "settings",
    usage: "!enable",
};

#[poise::command(prefix_command, slash_command, category = "Settings")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    if !require_manage_channels(&ctx, guild_id).await? {
        return Ok(());
    }

    set_enabled(&ctx.data().db, guild_id.get(), true).await?;
    info!(guild_id = guild_id.get(), "notifications enabled");

    ctx.say("Voice channel notifications enabled.").await?;
    Ok(())
}
