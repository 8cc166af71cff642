use anyhow::Context as _;

use vesper_notify::config::GuildSettings;

use crate::database::Database;
use crate::impls::now_unix_secs;

#[derive(sqlx::FromRow)]
struct GuildSettingsRow {
    notification_channel_id: Option<i64>,
    delay_seconds: i64,
    enabled: bool,
}

/// Load a guild's notification settings, `None` when never configured.
pub async fn get_guild_settings(
    db: &Database,
    guild_id: u64,
) -> anyhow::Result<Option<GuildSettings>> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    let row: Option<GuildSettingsRow> = sqlx::query_as(
        "SELECT notification_channel_id, delay_seconds, enabled
         FROM guild_settings
         WHERE guild_id = $1",
    )
    .bind(guild_id_i64)
    .fetch_optional(db.pool())
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let notification_channel_id = row
        .notification_channel_id
        .map(u64::try_from)
        .transpose()
        .context("notification_channel_id out of u64 range")?;
    let delay_seconds =
        u64::try_from(row.delay_seconds).context("delay_seconds out of u64 range")?;

    Ok(Some(GuildSettings {
        notification_channel_id,
        delay_seconds,
        enabled: row.enabled,
    }))
}

pub async fn set_notification_channel(
    db: &Database,
    guild_id: u64,
    channel_id: u64,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let channel_id_i64 = i64::try_from(channel_id).context("channel_id out of i64 range")?;
    let now_i64 = i64::try_from(now_unix_secs()).context("timestamp out of i64 range")?;

    sqlx::query(
        "INSERT INTO guild_settings (guild_id, notification_channel_id, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         ON CONFLICT (guild_id) DO UPDATE
         SET notification_channel_id = EXCLUDED.notification_channel_id,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(guild_id_i64)
    .bind(channel_id_i64)
    .bind(now_i64)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn set_delay_seconds(
    db: &Database,
    guild_id: u64,
    delay_seconds: u64,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let delay_i64 = i64::try_from(delay_seconds).context("delay_seconds out of i64 range")?;
    let now_i64 = i64::try_from(now_unix_secs()).context("timestamp out of i64 range")?;

    sqlx::query(
        "INSERT INTO guild_settings (guild_id, delay_seconds, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         ON CONFLICT (guild_id) DO UPDATE
         SET delay_seconds = EXCLUDED.delay_seconds,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(guild_id_i64)
    .bind(delay_i64)
    .bind(now_i64)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn set_enabled(db: &Database, guild_id: u64, enabled: bool) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let now_i64 = i64::try_from(now_unix_secs()).context("timestamp out of i64 range")?;

    sqlx::query(
        "INSERT INTO guild_settings (guild_id, enabled, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         ON CONFLICT (guild_id) DO UPDATE
         SET enabled = EXCLUDED.enabled,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(guild_id_i64)
    .bind(enabled)
    .bind(now_i64)
    .execute(db.pool())
    .await?;

    Ok(())
}
