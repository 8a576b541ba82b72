use serde::{Deserialize, Serialize};
use std::fmt;

/// Which game a user wants to play. Each kind has its own waiting
/// queue; cross-kind matching never happens.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    Chess,
    TicTacToe,
}

impl GameKind {
    pub const ALL: [GameKind; 2] = [GameKind::Chess, GameKind::TicTacToe];
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Chess => write!(f, "chess"),
            GameKind::TicTacToe => write!(f, "tic-tac-toe"),
        }
    }
}
