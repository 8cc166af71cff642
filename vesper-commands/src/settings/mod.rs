pub mod disable;
pub mod enable;
pub mod setchannel;
pub mod setdelay;
pub mod status;

use poise::serenity_prelude as serenity;

use vesper_core::Context;

pub(crate) fn guild_only_message() -> &'static str {
    "This command only works in servers."
}

pub(crate) fn not_permitted_message() -> &'static str {
    "You are not permitted to use this command."
}

/// Gate a settings command behind `MANAGE_CHANNELS`, replying when denied.
pub(crate) async fn require_manage_channels(
    ctx: &Context<'_>,
    guild_id: serenity::GuildId,
) -> anyhow::Result<bool> {
    let allowed = vesper_utils::permissions::has_user_permission(
        ctx.http(),
        guild_id,
        ctx.author().id,
        serenity::Permissions::MANAGE_CHANNELS,
    )
    .await?;

    if !allowed {
        ctx.say(not_permitted_message()).await?;
    }

    Ok(allowed)
}
