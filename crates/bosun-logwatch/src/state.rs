//! Player state derived from the netlog.

use serde::Serialize;

/// System id used before any system line has been seen.
pub const UNSET_SYSTEM_ID: i64 = 0;

/// The last star system the player entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StarSystem {
    /// Client-side numeric id ([`UNSET_SYSTEM_ID`] until the first arrival).
    pub id: i64,
    /// System display name (empty until the first arrival).
    pub name: String,
}

impl StarSystem {
    /// Whether a system has been recorded yet.
    pub const fn is_known(&self) -> bool {
        self.id != UNSET_SYSTEM_ID
    }
}

/// Everything the tailer knows about the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerState {
    /// The current (most recently entered) star system.
    pub system: StarSystem,
    /// The commander's display name, once seen.
    pub commander: Option<String>,
    /// Set when docking permission is granted, cleared on the next arrival.
    pub recently_near_station: bool,
}

impl PlayerState {
    /// Name of the last system entered, if any.
    pub fn last_system_name(&self) -> Option<&str> {
        self.system
            .is_known()
            .then_some(self.system.name.as_str())
    }
}
