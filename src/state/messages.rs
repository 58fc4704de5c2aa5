use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use foosball_api::{Game, RankingEntry, Team};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    /// Create missing tables, then load everything.
    Init,
    /// Drop cached tables and load everything again.
    Reload,
    AddGame { team1: Team, team2: Team, team1_score: u32, team2_score: u32 },
    AddPlayer { name: String },
    RemovePlayer { name: String },
    ResetAll,
}

/// Everything the screens render, read in one pass after each request.
#[derive(Debug, Clone, Default)]
pub struct LeagueSnapshot {
    pub players: Vec<String>,
    pub recent_games: Vec<Game>,
    pub rankings: Vec<RankingEntry>,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    DataLoaded { snapshot: LeagueSnapshot },
    /// A write went through; `message` is shown in the status line.
    Updated { message: String, snapshot: LeagueSnapshot },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
