//! Game mode definitions. The controller owns the authoritative mode; Bevy's `State<GameMode>`
//! mirrors it one frame later so presentation plugins can hook `OnEnter`/`OnExit` schedules.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Mutually exclusive gameplay modes. `Idle` is the menu.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States, Serialize, Deserialize,
)]
pub enum GameMode {
    #[default]
    Idle,
    ObjectSearch,
    PlatformGame,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Idle, GameMode::ObjectSearch, GameMode::PlatformGame];

    /// Modes that run a scored session.
    pub fn is_session(self) -> bool {
        !matches!(self, GameMode::Idle)
    }

    pub fn label(self) -> &'static str {
        match self {
            GameMode::Idle => "Idle",
            GameMode::ObjectSearch => "ObjectSearch",
            GameMode::PlatformGame => "PlatformGame",
        }
    }
}

/// Named system sets to structure the Update schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Modes,
    Presentation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_the_only_sessionless_mode() {
        let sessions: Vec<_> = GameMode::ALL.into_iter().filter(|m| m.is_session()).collect();
        assert_eq!(sessions, vec![GameMode::ObjectSearch, GameMode::PlatformGame]);
        assert_eq!(GameMode::default(), GameMode::Idle);
    }
}
