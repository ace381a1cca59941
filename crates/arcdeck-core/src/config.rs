// ── Console runtime settings ──
//
// Built by the UI host (usually from `arcdeck-config`). The core never
// reads files or the environment itself.

use std::time::Duration;

/// Behavior knobs for a [`Console`](crate::Console).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    /// Allow password prompts. When `false`, a missing or rejected
    /// password fails the login instead.
    pub interactive: bool,
    /// Period for [`Console::spawn_auto_refresh`](crate::Console::spawn_auto_refresh).
    /// Zero disables periodic refresh.
    pub refresh_interval: Duration,
    /// Buffered events per controller before slow subscribers lag.
    pub event_capacity: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            interactive: true,
            refresh_interval: Duration::ZERO,
            event_capacity: 256,
        }
    }
}
