use crate::client::{RemoteStore, StoreError};
use crate::ranking::compute_rankings;
use crate::repository::LeagueRepository;
use crate::{Game, MAX_SCORE, RankingEntry, Team, default_players};
use chrono::{Local, NaiveDateTime, SubsecRound};
use log::{error, info, warn};
use std::collections::HashSet;
use std::fmt;

pub type LeagueResult<T> = Result<T, LeagueError>;

#[derive(Debug)]
pub enum LeagueError {
    /// The request was rejected before anything was written.
    Validation(String),
    DuplicatePlayer(String),
    UnknownPlayer(String),
    Store(StoreError),
    /// At least one of the two reset writes failed.
    PartialReset(String),
}

impl fmt::Display for LeagueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeagueError::Validation(msg) => write!(f, "{msg}"),
            LeagueError::DuplicatePlayer(name) => write!(f, "Player {name} already exists"),
            LeagueError::UnknownPlayer(name) => write!(f, "Player {name} not found"),
            LeagueError::Store(e) => write!(f, "{e}"),
            LeagueError::PartialReset(msg) => write!(f, "Failed to reset some data: {msg}"),
        }
    }
}

impl std::error::Error for LeagueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LeagueError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for LeagueError {
    fn from(e: StoreError) -> Self {
        LeagueError::Store(e)
    }
}

/// League operations: each one reads the current table, changes it in
/// memory and writes the whole table back.
#[derive(Debug)]
pub struct League<S> {
    repo: LeagueRepository<S>,
}

impl<S: RemoteStore> League<S> {
    pub fn new(repo: LeagueRepository<S>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &LeagueRepository<S> {
        &self.repo
    }

    pub async fn init(&mut self) -> LeagueResult<()> {
        Ok(self.repo.init().await?)
    }

    /// Drop cached tables so the next query goes to the store.
    pub fn reload(&mut self) {
        self.repo.invalidate_players();
        self.repo.invalidate_games();
    }

    pub async fn players(&mut self) -> LeagueResult<Vec<String>> {
        Ok(self.repo.load_players().await?)
    }

    pub async fn games(&mut self) -> LeagueResult<Vec<Game>> {
        Ok(self.repo.load_games().await?)
    }

    /// The `limit` most recently added games.
    pub async fn recent_games(&mut self, limit: usize) -> LeagueResult<Vec<Game>> {
        let mut games = self.repo.load_games().await?;
        games.truncate(limit);
        Ok(games)
    }

    pub async fn rankings(&mut self) -> LeagueResult<Vec<RankingEntry>> {
        let games = self.repo.load_games().await?;
        Ok(compute_rankings(&games))
    }

    /// Record a result stamped with the current local time.
    pub async fn add_game(
        &mut self,
        team1: Team,
        team2: Team,
        team1_score: u32,
        team2_score: u32,
    ) -> LeagueResult<Game> {
        let date = Local::now().naive_local().trunc_subsecs(0);
        self.add_game_at(team1, team2, team1_score, team2_score, date).await
    }

    async fn add_game_at(
        &mut self,
        team1: Team,
        team2: Team,
        team1_score: u32,
        team2_score: u32,
        date: NaiveDateTime,
    ) -> LeagueResult<Game> {
        let roster = self.repo.load_players().await?;
        let game = Game { team1, team2, team1_score, team2_score, date };
        if let Err(e) = validate_game(&game, &roster) {
            warn!("rejected game {} vs {}: {e}", game.team1.label(), game.team2.label());
            return Err(e);
        }

        info!("adding new game: {} vs {}", game.team1.label(), game.team2.label());
        let mut games = self.repo.load_games().await?;
        games.insert(0, game.clone());

        let message = format!("Add game: {} vs {}", game.team1.label(), game.team2.label());
        match self.repo.save_games(&games, &message).await {
            Ok(()) => {
                info!("successfully added new game");
                Ok(game)
            }
            Err(e) => {
                error!("failed to add new game: {e}");
                Err(e.into())
            }
        }
    }

    pub async fn add_player(&mut self, name: &str) -> LeagueResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeagueError::Validation("Please enter a player name".into()));
        }
        info!("adding new player: {name}");

        let mut players = self.repo.load_players().await?;
        if players.iter().any(|p| p == name) {
            warn!("player {name} already exists");
            return Err(LeagueError::DuplicatePlayer(name.to_owned()));
        }
        players.push(name.to_owned());

        match self.repo.save_players(&players, &format!("Add player: {name}")).await {
            Ok(()) => {
                info!("successfully added player: {name}");
                Ok(name.to_owned())
            }
            Err(e) => {
                error!("failed to add player {name}: {e}");
                Err(e.into())
            }
        }
    }

    pub async fn remove_player(&mut self, name: &str) -> LeagueResult<()> {
        let name = name.trim();
        info!("removing player: {name}");
        let mut players = self.repo.load_players().await?;
        let Some(index) = players.iter().position(|p| p == name) else {
            warn!("player {name} not found");
            return Err(LeagueError::UnknownPlayer(name.to_owned()));
        };
        players.remove(index);

        match self.repo.save_players(&players, &format!("Remove player: {name}")).await {
            Ok(()) => {
                info!("successfully removed player: {name}");
                Ok(())
            }
            Err(e) => {
                error!("failed to remove player {name}: {e}");
                Err(e.into())
            }
        }
    }

    /// Restore the default roster and clear every recorded game.
    pub async fn reset_all(&mut self) -> LeagueResult<()> {
        warn!("resetting all data");
        if let Err(e) = self.repo.refresh_revisions().await {
            warn!("could not read current revisions before reset: {e}");
        }

        let players = self
            .repo
            .save_players(&default_players(), "Reset players data")
            .await;
        let games = self.repo.save_games(&[], "Reset games data").await;

        self.repo.invalidate_players();
        self.repo.invalidate_games();

        let failures: Vec<String> = [("players", players), ("games", games)]
            .into_iter()
            .filter_map(|(table, result)| result.err().map(|e| format!("{table}: {e}")))
            .collect();
        if failures.is_empty() {
            info!("successfully reset all data");
            Ok(())
        } else {
            let msg = failures.join("; ");
            error!("failed to reset some data: {msg}");
            Err(LeagueError::PartialReset(msg))
        }
    }
}

/// Four distinct players, all on the roster, and scores within range.
fn validate_game(game: &Game, roster: &[String]) -> LeagueResult<()> {
    let names = game.players();
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(LeagueError::Validation("Every position needs a player".into()));
    }
    let distinct: HashSet<&str> = names.iter().copied().collect();
    if distinct.len() != names.len() {
        return Err(LeagueError::Validation(
            "Please select different players for each position".into(),
        ));
    }
    if let Some(missing) = names.iter().find(|n| !roster.iter().any(|p| p == *n)) {
        return Err(LeagueError::UnknownPlayer((*missing).to_owned()));
    }
    if game.team1_score > MAX_SCORE || game.team2_score > MAX_SCORE {
        return Err(LeagueError::Validation(format!(
            "Scores must be between 0 and {MAX_SCORE}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::client::MemoryStore;
    use crate::{GAMES_FILE, PLAYERS_FILE};
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn league_with(roster: &[&str]) -> League<MemoryStore> {
        let repo = LeagueRepository::with_clock(MemoryStore::new(), Arc::new(ManualClock::default()));
        let mut league = League::new(repo);
        let roster: Vec<String> = roster.iter().map(|s| s.to_string()).collect();
        league.repo.save_players(&roster, "Set roster").await.unwrap();
        league
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn add_game_prepends_and_feeds_rankings() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        league
            .add_game_at(Team::new("A", "B"), Team::new("C", "D"), 5, 3, at(10))
            .await
            .unwrap();

        let rankings = league.rankings().await.unwrap();
        let names: Vec<&str> = rankings.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(names.len(), 4);
        assert!(names[..2].contains(&"A") && names[..2].contains(&"B"));
        assert!(names[2..].contains(&"C") && names[2..].contains(&"D"));

        let second = league
            .add_game_at(Team::new("A", "C"), Team::new("B", "D"), 2, 2, at(11))
            .await
            .unwrap();
        let games = league.games().await.unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0], second, "newest game must come first");

        let rankings = league.rankings().await.unwrap();
        let a = rankings.iter().find(|e| e.player == "A").unwrap().stats;
        assert_eq!((a.games, a.wins, a.losses, a.draws, a.points), (2, 1, 0, 1, 4));
    }

    #[tokio::test]
    async fn add_game_rejects_repeated_players_without_writing() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        let writes = league.repository().store().write_count();
        let err = league
            .add_game(Team::new("A", "B"), Team::new("A", "D"), 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, LeagueError::Validation(_)));
        assert_eq!(league.repository().store().write_count(), writes);
    }

    #[tokio::test]
    async fn add_game_rejects_players_off_the_roster() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        let err = league
            .add_game(Team::new("A", "B"), Team::new("C", "Zed"), 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, LeagueError::UnknownPlayer(ref n) if n == "Zed"));
        assert!(league.games().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_game_rejects_out_of_range_scores() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        let err = league
            .add_game(Team::new("A", "B"), Team::new("C", "D"), 21, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, LeagueError::Validation(_)));
    }

    #[tokio::test]
    async fn add_game_reports_store_failure() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        league.repository().store().set_failing(GAMES_FILE, true);
        let err = league
            .add_game(Team::new("A", "B"), Team::new("C", "D"), 3, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LeagueError::Store(_)));

        league.repository().store().set_failing(GAMES_FILE, false);
        assert!(league.games().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_player_appends_once() {
        let mut league = league_with(&["A", "B"]).await;
        assert_eq!(league.add_player("  Nir ").await.unwrap(), "Nir");
        let players = league.players().await.unwrap();
        assert_eq!(players.iter().filter(|p| *p == "Nir").count(), 1);
        assert_eq!(players.last().map(String::as_str), Some("Nir"));

        let err = league.add_player("Nir").await.unwrap_err();
        assert!(matches!(err, LeagueError::DuplicatePlayer(_)));
        assert_eq!(league.players().await.unwrap(), players);
    }

    #[tokio::test]
    async fn add_player_is_case_sensitive_and_rejects_blank_names() {
        let mut league = league_with(&["Nir"]).await;
        league.add_player("nir").await.unwrap();
        assert!(matches!(league.add_player("   ").await, Err(LeagueError::Validation(_))));
        assert_eq!(league.players().await.unwrap(), vec!["Nir", "nir"]);
    }

    #[tokio::test]
    async fn remove_player_removes_exactly_that_entry() {
        let mut league = league_with(&["A", "B", "C"]).await;
        league.remove_player("B").await.unwrap();
        assert_eq!(league.players().await.unwrap(), vec!["A", "C"]);

        let writes = league.repository().store().write_count();
        let err = league.remove_player("B").await.unwrap_err();
        assert!(matches!(err, LeagueError::UnknownPlayer(_)));
        assert_eq!(league.players().await.unwrap(), vec!["A", "C"]);
        assert_eq!(league.repository().store().write_count(), writes);
    }

    #[tokio::test]
    async fn remove_player_trims_the_name_like_add_player() {
        let mut league = league_with(&["A", "B"]).await;
        league.add_player("  Nir ").await.unwrap();
        league.remove_player(" Nir  ").await.unwrap();
        league.remove_player("B\t").await.unwrap();
        assert_eq!(league.players().await.unwrap(), vec!["A"]);
    }

    #[tokio::test]
    async fn removed_players_keep_their_history_in_rankings() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        league
            .add_game_at(Team::new("A", "B"), Team::new("C", "D"), 5, 3, at(9))
            .await
            .unwrap();
        league.remove_player("D").await.unwrap();
        let rankings = league.rankings().await.unwrap();
        assert!(rankings.iter().any(|e| e.player == "D"));
    }

    #[tokio::test]
    async fn reset_restores_defaults_and_clears_games() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        league
            .add_game_at(Team::new("A", "B"), Team::new("C", "D"), 5, 3, at(9))
            .await
            .unwrap();
        league.add_player("E").await.unwrap();

        league.reset_all().await.unwrap();
        assert_eq!(league.players().await.unwrap(), default_players());
        assert!(league.games().await.unwrap().is_empty());
        assert!(league.rankings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_overwrites_changes_made_by_other_writers() {
        let mut league = league_with(&["A", "B"]).await;
        league.players().await.unwrap();
        league.repository().store().overwrite(PLAYERS_FILE, "name\nZed\n");
        league.reset_all().await.unwrap();
        assert_eq!(league.players().await.unwrap(), default_players());
    }

    #[tokio::test]
    async fn partial_reset_is_reported_but_caches_are_dropped() {
        let mut league = league_with(&["A", "B"]).await;
        league.players().await.unwrap();
        league.repository().store().set_failing(GAMES_FILE, true);

        let err = league.reset_all().await.unwrap_err();
        assert!(matches!(err, LeagueError::PartialReset(ref msg) if msg.starts_with("games")));
        // The players write went through and is visible immediately.
        assert_eq!(league.players().await.unwrap(), default_players());
    }

    const OTHER_GAME: &str = "team1_player1,team1_player2,team2_player1,team2_player2,team1_score,team2_score,date\n\
                              A,B,C,D,5,3,2025-05-20 09:00:00\n";

    #[tokio::test]
    async fn failed_reset_write_still_drops_the_games_cache() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        assert!(league.games().await.unwrap().is_empty());
        league.repository().store().set_failing(GAMES_FILE, true);

        let err = league.reset_all().await.unwrap_err();
        assert!(matches!(err, LeagueError::PartialReset(_)));

        league.repository().store().overwrite(GAMES_FILE, OTHER_GAME);
        let games = league.games().await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].team1, Team::new("A", "B"));
    }

    #[tokio::test]
    async fn reload_drops_both_caches() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        assert!(league.games().await.unwrap().is_empty());
        assert_eq!(league.players().await.unwrap(), vec!["A", "B", "C", "D"]);

        league.repository().store().overwrite(GAMES_FILE, OTHER_GAME);
        league.repository().store().overwrite(PLAYERS_FILE, "name\nZed\n");
        assert!(league.games().await.unwrap().is_empty());
        assert_eq!(league.players().await.unwrap(), vec!["A", "B", "C", "D"]);

        league.reload();
        assert_eq!(league.games().await.unwrap().len(), 1);
        assert_eq!(league.players().await.unwrap(), vec!["Zed"]);
    }

    #[tokio::test]
    async fn recent_games_are_limited_and_newest_first() {
        let mut league = league_with(&["A", "B", "C", "D"]).await;
        for hour in 1..=7 {
            league
                .add_game_at(Team::new("A", "B"), Team::new("C", "D"), hour, 0, at(hour))
                .await
                .unwrap();
        }
        let recent = league.recent_games(5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].date, at(7));
        assert_eq!(recent[4].date, at(3));
    }
}
