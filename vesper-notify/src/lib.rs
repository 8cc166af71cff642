/// Delay bounds and per-guild notification settings.
pub mod config;
/// Voice-presence transition classification and task lifecycle orchestration.
pub mod engine;
/// In-memory per-channel occupancy counts.
pub mod occupancy;
/// Collaborator interfaces for settings, the task ledger, and dispatch.
pub mod port;
/// Cancelable one-shot timers for pending join tasks.
pub mod scheduler;
/// Pending-task identity and status types.
pub mod task;
