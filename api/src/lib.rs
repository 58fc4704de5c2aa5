pub mod cache;
pub mod client;
pub mod codec;
pub mod github;
pub mod league;
pub mod ranking;
pub mod repository;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// League constants
// ---------------------------------------------------------------------------

/// Roster used when nothing has been persisted yet, and after a reset.
pub const DEFAULT_PLAYERS: [&str; 6] = ["Moti", "Chen", "Uri", "Baki", "Nir", "Asaf"];

pub const GAMES_FILE: &str = "data/games.csv";
pub const PLAYERS_FILE: &str = "data/players.csv";

/// Bounds of a single team's score, as accepted by the entry form.
pub const MAX_SCORE: u32 = 20;

pub fn default_players() -> Vec<String> {
    DEFAULT_PLAYERS.iter().map(|p| p.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Domain types, independent of the CSV layout in the remote store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Team {
    pub player1: String,
    pub player2: String,
}

impl Team {
    pub fn new(player1: impl Into<String>, player2: impl Into<String>) -> Self {
        Self { player1: player1.into(), player2: player2.into() }
    }

    pub fn players(&self) -> [&str; 2] {
        [&self.player1, &self.player2]
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.player1, self.player2)
    }
}

/// One recorded two-on-two result. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub team1: Team,
    pub team2: Team,
    pub team1_score: u32,
    pub team2_score: u32,
    pub date: NaiveDateTime,
}

impl Game {
    /// Both sides as `(team, own score, opponent score)`.
    pub fn sides(&self) -> [(&Team, u32, u32); 2] {
        [
            (&self.team1, self.team1_score, self.team2_score),
            (&self.team2, self.team2_score, self.team1_score),
        ]
    }

    pub fn players(&self) -> [&str; 4] {
        let [a, b] = self.team1.players();
        let [c, d] = self.team2.players();
        [a, b, c, d]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerStats {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Percentage of games won, rounded to one decimal.
    pub win_rate: f64,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub player: String,
    pub stats: PlayerStats,
}
