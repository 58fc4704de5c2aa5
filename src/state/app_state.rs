use crate::app::MenuItem;
use crate::state::messages::LeagueSnapshot;
use chrono::Local;
use foosball_api::{Game, MAX_SCORE, RankingEntry, Team};

// ---------------------------------------------------------------------------
// League data as last read from the store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LeagueState {
    pub players: Vec<String>,
    pub recent_games: Vec<Game>,
    pub rankings: Vec<RankingEntry>,
    pub loaded: bool,
}

impl LeagueState {
    pub fn load(&mut self, snapshot: LeagueSnapshot) {
        self.players = snapshot.players;
        self.recent_games = snapshot.recent_games;
        self.rankings = snapshot.rankings;
        self.loaded = true;
    }
}

// ---------------------------------------------------------------------------
// Add-game form
// ---------------------------------------------------------------------------

/// Position labels in form order: both players of team 1, then team 2.
pub const PLAYER_SLOTS: [&str; 4] = ["Team 1 Player 1", "Team 1 Player 2", "Team 2 Player 1", "Team 2 Player 2"];
pub const SCORE_FIELDS: [&str; 2] = ["Team 1 Score", "Team 2 Score"];
pub const FORM_FIELDS: usize = PLAYER_SLOTS.len() + SCORE_FIELDS.len();

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GameForm {
    pub picks: [Option<String>; 4],
    pub scores: [u32; 2],
    /// 0..4 are player slots, 4..6 the two scores.
    pub focus: usize,
}

impl GameForm {
    /// Drop picks that left the roster and fill empty slots with the first
    /// player nobody else has taken.
    pub fn sync_roster(&mut self, roster: &[String]) {
        for pick in &mut self.picks {
            if pick.as_ref().is_some_and(|p| !roster.contains(p)) {
                *pick = None;
            }
        }
        for slot in 0..self.picks.len() {
            if self.picks[slot].is_none() {
                self.picks[slot] = self.options_for(slot, roster).first().cloned();
            }
        }
    }

    /// Roster entries selectable in `slot`: everyone not picked elsewhere.
    pub fn options_for(&self, slot: usize, roster: &[String]) -> Vec<String> {
        roster
            .iter()
            .filter(|p| {
                !self
                    .picks
                    .iter()
                    .enumerate()
                    .any(|(i, pick)| i != slot && pick.as_ref() == Some(*p))
            })
            .cloned()
            .collect()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FORM_FIELDS;
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + FORM_FIELDS - 1) % FORM_FIELDS;
    }

    /// Left/right on the focused field: cycle the player or nudge the score.
    pub fn change(&mut self, roster: &[String], forward: bool) {
        if self.focus < self.picks.len() {
            self.cycle_player(self.focus, roster, forward);
        } else {
            let score = &mut self.scores[self.focus - self.picks.len()];
            *score = if forward {
                (*score + 1).min(MAX_SCORE)
            } else {
                score.saturating_sub(1)
            };
        }
    }

    fn cycle_player(&mut self, slot: usize, roster: &[String], forward: bool) {
        let options = self.options_for(slot, roster);
        if options.is_empty() {
            self.picks[slot] = None;
            return;
        }
        let current = self.picks[slot]
            .as_ref()
            .and_then(|p| options.iter().position(|o| o == p));
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
        };
        self.picks[slot] = Some(options[next].clone());
    }

    /// The filled-in game, or a message naming what is missing.
    pub fn submission(&self) -> Result<(Team, Team, u32, u32), String> {
        let [Some(a), Some(b), Some(c), Some(d)] = &self.picks else {
            return Err("Please select different players for each position".into());
        };
        Ok((
            Team::new(a.clone(), b.clone()),
            Team::new(c.clone(), d.clone()),
            self.scores[0],
            self.scores[1],
        ))
    }

    /// Scores go back to zero after a game is recorded; players stay.
    pub fn clear_scores(&mut self) {
        self.scores = [0, 0];
    }
}

// ---------------------------------------------------------------------------
// Players tab
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PlayersState {
    pub selected: usize,
    pub input: String,
    pub composing: bool,
}

impl PlayersState {
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn select_down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Finish typing; returns the entered name unless it was blank.
    pub fn submit_input(&mut self) -> Option<String> {
        let name = self.input.trim().to_string();
        self.composing = false;
        self.input.clear();
        (!name.is_empty()).then_some(name)
    }
}

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub timestamp: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text.into(), false)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text.into(), true)
    }

    fn new(text: String, is_error: bool) -> Self {
        Self { text, is_error, timestamp: Local::now().format("%H:%M").to_string() }
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub confirm_reset: bool,
    pub status: Option<StatusMessage>,
    pub league: LeagueState,
    pub game_form: GameForm,
    pub players: PlayersState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a text field owns the keyboard.
    pub fn is_typing(&self) -> bool {
        self.active_tab == MenuItem::Players && self.players.composing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn picks(form: &GameForm) -> Vec<Option<&str>> {
        form.picks.iter().map(|p| p.as_deref()).collect()
    }

    #[test]
    fn sync_fills_slots_with_distinct_players() {
        let mut form = GameForm::default();
        form.sync_roster(&roster(&["Moti", "Chen", "Uri", "Baki", "Nir"]));
        assert_eq!(picks(&form), vec![Some("Moti"), Some("Chen"), Some("Uri"), Some("Baki")]);
    }

    #[test]
    fn sync_leaves_slots_empty_when_roster_is_short() {
        let mut form = GameForm::default();
        form.sync_roster(&roster(&["Moti", "Chen", "Uri"]));
        assert_eq!(form.picks[3], None);
        assert!(form.submission().is_err());
    }

    #[test]
    fn sync_replaces_removed_players() {
        let mut form = GameForm::default();
        let full = roster(&["Moti", "Chen", "Uri", "Baki", "Nir"]);
        form.sync_roster(&full);
        form.sync_roster(&roster(&["Moti", "Uri", "Baki", "Nir"]));
        assert_eq!(picks(&form), vec![Some("Moti"), Some("Nir"), Some("Uri"), Some("Baki")]);
    }

    #[test]
    fn cycling_skips_players_taken_in_other_slots() {
        let list = roster(&["Moti", "Chen", "Uri", "Baki", "Nir"]);
        let mut form = GameForm::default();
        form.sync_roster(&list);

        // Slot 0 may only choose between Moti and Nir.
        form.change(&list, true);
        assert_eq!(form.picks[0].as_deref(), Some("Nir"));
        form.change(&list, true);
        assert_eq!(form.picks[0].as_deref(), Some("Moti"));
        form.change(&list, false);
        assert_eq!(form.picks[0].as_deref(), Some("Nir"));
    }

    #[test]
    fn scores_stay_within_bounds() {
        let list = roster(&["Moti", "Chen", "Uri", "Baki"]);
        let mut form = GameForm { focus: 4, ..Default::default() };
        form.change(&list, false);
        assert_eq!(form.scores[0], 0);
        for _ in 0..30 {
            form.change(&list, true);
        }
        assert_eq!(form.scores[0], MAX_SCORE);
    }

    #[test]
    fn focus_wraps_around() {
        let mut form = GameForm::default();
        form.focus_prev();
        assert_eq!(form.focus, FORM_FIELDS - 1);
        form.focus_next();
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn submission_builds_both_teams() {
        let list = roster(&["Moti", "Chen", "Uri", "Baki"]);
        let mut form = GameForm { scores: [10, 8], ..Default::default() };
        form.sync_roster(&list);
        let (t1, t2, s1, s2) = form.submission().unwrap();
        assert_eq!(t1, Team::new("Moti", "Chen"));
        assert_eq!(t2, Team::new("Uri", "Baki"));
        assert_eq!((s1, s2), (10, 8));
    }

    #[test]
    fn blank_player_name_is_not_submitted() {
        let mut players = PlayersState { composing: true, input: "   ".into(), ..Default::default() };
        assert_eq!(players.submit_input(), None);
        assert!(!players.composing);

        players.input = " Asaf ".into();
        assert_eq!(players.submit_input().as_deref(), Some("Asaf"));
    }
}
