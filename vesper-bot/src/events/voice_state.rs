use poise::serenity_prelude as serenity;
use tracing::debug;

use vesper_core::Data;
use vesper_notify::engine::VoicePresenceUpdate;

/// Reduce a raw gateway voice-state update to the engine's input and hand it
/// over. Mute/deafen-only changes fall out as no-ops inside the engine.
pub async fn handle_voice_state_update(
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) {
    let Some(guild_id) = new.guild_id.or_else(|| old.and_then(|state| state.guild_id)) else {
        return;
    };

    let is_automated = new
        .member
        .as_ref()
        .map(|member| member.user.bot)
        .unwrap_or(false);

    let update = VoicePresenceUpdate {
        guild_id: guild_id.get(),
        user_id: new.user_id.get(),
        old_channel_id: old.and_then(|state| state.channel_id).map(|id| id.get()),
        new_channel_id: new.channel_id.map(|id| id.get()),
        is_automated,
    };
    debug!(?update, "voice state update");

    data.notifier.handle_update(update).await;
}

/// Rebuild the engine's occupancy for a guild from the voice states the
/// gateway delivers with `GUILD_CREATE`. Bots never count.
pub async fn seed_guild_presence(data: &Data, guild: &serenity::Guild) {
    let occupants: Vec<(u64, u64)> = guild
        .voice_states
        .values()
        .filter(|state| {
            !state
                .member
                .as_ref()
                .map(|member| member.user.bot)
                .unwrap_or(false)
        })
        .filter_map(|state| {
            state
                .channel_id
                .map(|channel_id| (state.user_id.get(), channel_id.get()))
        })
        .collect();

    data.notifier.seed_presence(guild.id.get(), &occupants).await;
}
