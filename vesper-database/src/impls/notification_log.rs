use anyhow::Context as _;

use vesper_notify::port::LedgerId;
use vesper_notify::task::PendingJoinTask;

use crate::database::Database;
use crate::impls::now_unix_secs;
use crate::model::notification_log::LedgerActivity;

/// Insert a new ledger row in `scheduled` state and return its id.
///
/// The insert is awaited before any timer exists for the task, so dispatch
/// can never run ahead of its audit record.
pub async fn insert_scheduled(db: &Database, task: &PendingJoinTask) -> anyhow::Result<LedgerId> {
    let guild_id_i64 = i64::try_from(task.key.guild_id).context("guild_id out of i64 range")?;
    let channel_id_i64 =
        i64::try_from(task.key.channel_id).context("channel_id out of i64 range")?;
    let user_id_i64 = i64::try_from(task.key.user_id).context("user_id out of i64 range")?;
    let joined_at_i64 = i64::try_from(task.joined_at).context("joined_at out of i64 range")?;
    let delay_i64 =
        i64::try_from(task.delay.as_secs()).context("delay_seconds out of i64 range")?;
    let destination_i64 = task
        .notification_channel_id
        .map(i64::try_from)
        .transpose()
        .context("notification_channel_id out of i64 range")?;
    let now_i64 = i64::try_from(now_unix_secs()).context("timestamp out of i64 range")?;

    let ledger_id: i64 = sqlx::query_scalar(
        "INSERT INTO notification_log
         (guild_id, channel_id, user_id, joined_at, delay_seconds,
          notification_channel_id, status, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, 'scheduled', $7)
         RETURNING id",
    )
    .bind(guild_id_i64)
    .bind(channel_id_i64)
    .bind(user_id_i64)
    .bind(joined_at_i64)
    .bind(delay_i64)
    .bind(destination_i64)
    .bind(now_i64)
    .fetch_one(db.pool())
    .await?;

    Ok(ledger_id)
}

/// Transition a `scheduled` row to `sent`.
///
/// The `status = 'scheduled'` guard makes terminal states write-once at the
/// SQL level; returns whether a row actually transitioned.
pub async fn mark_sent(
    db: &Database,
    ledger_id: LedgerId,
    notified_at: u64,
) -> anyhow::Result<bool> {
    let notified_at_i64 = i64::try_from(notified_at).context("notified_at out of i64 range")?;

    let updated = sqlx::query(
        "UPDATE notification_log
         SET status = 'sent', notified_at = $2
         WHERE id = $1 AND status = 'scheduled'",
    )
    .bind(ledger_id)
    .bind(notified_at_i64)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// Transition a `scheduled` row to `cancelled` with a reason code.
pub async fn mark_cancelled(
    db: &Database,
    ledger_id: LedgerId,
    reason: &str,
) -> anyhow::Result<bool> {
    let updated = sqlx::query(
        "UPDATE notification_log
         SET status = 'cancelled', status_reason = $2
         WHERE id = $1 AND status = 'scheduled'",
    )
    .bind(ledger_id)
    .bind(reason)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// Delete ledger rows created before `cutoff` and return the removed count.
pub async fn purge_older_than(db: &Database, cutoff: u64) -> anyhow::Result<u64> {
    let cutoff_i64 = i64::try_from(cutoff).context("cutoff out of i64 range")?;

    let deleted = sqlx::query("DELETE FROM notification_log WHERE created_at < $1")
        .bind(cutoff_i64)
        .execute(db.pool())
        .await?
        .rows_affected();

    Ok(deleted)
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    status: String,
    total: i64,
}

/// Per-status ledger counts for a guild since `since`, for the status command.
pub async fn guild_activity_since(
    db: &Database,
    guild_id: u64,
    since: u64,
) -> anyhow::Result<LedgerActivity> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let since_i64 = i64::try_from(since).context("since out of i64 range")?;

    let rows: Vec<ActivityRow> = sqlx::query_as(
        "SELECT status, COUNT(*) AS total
         FROM notification_log
         WHERE guild_id = $1 AND created_at >= $2
         GROUP BY status",
    )
    .bind(guild_id_i64)
    .bind(since_i64)
    .fetch_all(db.pool())
    .await?;

    let mut activity = LedgerActivity::default();
    for row in rows {
        let total = u64::try_from(row.total).context("status count out of u64 range")?;
        match row.status.as_str() {
            "scheduled" => activity.scheduled = total,
            "sent" => activity.sent = total,
            "cancelled" => activity.cancelled = total,
            other => tracing::warn!(status = other, "unknown ledger status in activity query"),
        }
    }

    Ok(activity)
}
