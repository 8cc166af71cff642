/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0x4A_5D_8A;
/// Color for join notification embeds.
pub const JOIN_EMBED_COLOR: u32 = 0x43_B5_81;
/// Color for leave notification embeds.
pub const LEAVE_EMBED_COLOR: u32 = 0xC6_4B_4B;
