/// Fallback delay when a guild has no stored setting.
pub const DEFAULT_DELAY_SECONDS: u64 = 60;
/// Smallest accepted notification delay.
pub const DEFAULT_MIN_DELAY_SECONDS: u64 = 5;
/// Largest accepted notification delay.
pub const DEFAULT_MAX_DELAY_SECONDS: u64 = 600;

/// Inclusive delay range every configured value is clamped into before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayBounds {
    pub min_seconds: u64,
    pub max_seconds: u64,
    pub default_seconds: u64,
}

impl DelayBounds {
    pub const fn new(min_seconds: u64, max_seconds: u64, default_seconds: u64) -> Self {
        Self {
            min_seconds,
            max_seconds,
            default_seconds,
        }
    }

    /// Reject inverted or out-of-range bounds at startup rather than
    /// silently clamping the defaults themselves.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_seconds > self.max_seconds {
            anyhow::bail!(
                "minimum delay ({}s) exceeds maximum delay ({}s)",
                self.min_seconds,
                self.max_seconds
            );
        }

        if !self.contains(self.default_seconds) {
            anyhow::bail!(
                "default delay ({}s) is outside [{}s, {}s]",
                self.default_seconds,
                self.min_seconds,
                self.max_seconds
            );
        }

        Ok(())
    }

    pub fn contains(&self, seconds: u64) -> bool {
        (self.min_seconds..=self.max_seconds).contains(&seconds)
    }

    /// Constrain a configured delay into the accepted range.
    pub fn clamp(&self, seconds: u64) -> u64 {
        seconds.clamp(self.min_seconds, self.max_seconds)
    }
}

impl Default for DelayBounds {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_DELAY_SECONDS,
            DEFAULT_MAX_DELAY_SECONDS,
            DEFAULT_DELAY_SECONDS,
        )
    }
}

/// Per-guild notification settings as stored by the settings collaborator.
///
/// A missing destination channel or a cleared enabled flag suppresses
/// dispatch only; occupancy tracking and ledger bookkeeping are unaffected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuildSettings {
    pub notification_channel_id: Option<u64>,
    pub delay_seconds: u64,
    pub enabled: bool,
}

impl GuildSettings {
    /// Settings used for guilds that never ran the setup commands.
    pub fn defaults(bounds: &DelayBounds) -> Self {
        Self {
            notification_channel_id: None,
            delay_seconds: bounds.default_seconds,
            enabled: true,
        }
    }

    /// The channel to dispatch to, or `None` when dispatch is suppressed.
    pub fn dispatch_target(&self) -> Option<u64> {
        if self.enabled {
            self.notification_channel_id
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DelayBounds, GuildSettings};

    #[test]
    fn clamps_into_bounds() {
        let bounds = DelayBounds::new(5, 600, 60);
        assert_eq!(bounds.clamp(0), 5);
        assert_eq!(bounds.clamp(5), 5);
        assert_eq!(bounds.clamp(90), 90);
        assert_eq!(bounds.clamp(601), 600);
        assert_eq!(bounds.clamp(u64::MAX), 600);
    }

    #[test]
    fn validates_ordering_and_default() {
        assert!(DelayBounds::new(5, 600, 60).validate().is_ok());
        assert!(DelayBounds::new(600, 5, 60).validate().is_err());
        assert!(DelayBounds::new(5, 600, 601).validate().is_err());
        assert!(DelayBounds::new(5, 600, 4).validate().is_err());
    }

    #[test]
    fn dispatch_target_requires_enabled_and_channel() {
        let configured = GuildSettings {
            notification_channel_id: Some(42),
            delay_seconds: 60,
            enabled: true,
        };
        assert_eq!(configured.dispatch_target(), Some(42));

        let disabled = GuildSettings {
            enabled: false,
            ..configured
        };
        assert_eq!(disabled.dispatch_target(), None);

        let unset = GuildSettings {
            notification_channel_id: None,
            ..configured
        };
        assert_eq!(unset.dispatch_target(), None);
    }
}
