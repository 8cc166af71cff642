/// Embed colors shared across the bot UI.
pub mod embed;
/// Duration and timestamp formatting helpers.
pub mod formatting;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Permission helper utilities.
pub mod permissions;
/// Shared time helpers.
pub mod time;
