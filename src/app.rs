use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, StatusMessage};
use crate::state::messages::{LeagueSnapshot, NetworkRequest};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Rankings,
    Games,
    Players,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        Self { state: AppState::new(), settings }
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_data_loaded(&mut self, snapshot: LeagueSnapshot) {
        self.state.league.load(snapshot);
        self.state.game_form.sync_roster(&self.state.league.players);
        self.state.players.clamp(self.state.league.players.len());
    }

    pub fn on_updated(&mut self, message: String, snapshot: LeagueSnapshot) {
        self.on_data_loaded(snapshot);
        self.state.status = Some(StatusMessage::info(message));
    }

    pub fn on_error(&mut self, message: String) {
        self.state.status = Some(StatusMessage::error(message));
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        self.state.players.composing = false;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Games tab: the add-game form
    // -----------------------------------------------------------------------

    pub fn form_next_field(&mut self) {
        self.state.game_form.focus_next();
    }

    pub fn form_prev_field(&mut self) {
        self.state.game_form.focus_prev();
    }

    pub fn form_change(&mut self, forward: bool) {
        let roster = &self.state.league.players;
        self.state.game_form.change(roster, forward);
    }

    /// Build the add-game request, or explain in the status line why not.
    pub fn submit_game(&mut self) -> Option<NetworkRequest> {
        match self.state.game_form.submission() {
            Ok((team1, team2, team1_score, team2_score)) => {
                self.state.game_form.clear_scores();
                Some(NetworkRequest::AddGame { team1, team2, team1_score, team2_score })
            }
            Err(message) => {
                self.on_error(message);
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Players tab
    // -----------------------------------------------------------------------

    pub fn players_down(&mut self) {
        let len = self.state.league.players.len();
        self.state.players.select_down(len);
    }

    pub fn players_up(&mut self) {
        self.state.players.select_up();
    }

    pub fn start_composing(&mut self) {
        self.state.players.composing = true;
        self.state.players.input.clear();
    }

    pub fn submit_player(&mut self) -> Option<NetworkRequest> {
        match self.state.players.submit_input() {
            Some(name) => Some(NetworkRequest::AddPlayer { name }),
            None => {
                self.on_error("Please enter a player name".to_string());
                None
            }
        }
    }

    pub fn remove_selected_player(&mut self) -> Option<NetworkRequest> {
        self.state
            .league
            .players
            .get(self.state.players.selected)
            .map(|name| NetworkRequest::RemovePlayer { name: name.clone() })
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    pub fn request_reset(&mut self) {
        self.state.confirm_reset = true;
    }

    /// Resolve the pending confirmation; `true` means go ahead.
    pub fn answer_reset(&mut self, confirmed: bool) -> Option<NetworkRequest> {
        self.state.confirm_reset = false;
        confirmed.then_some(NetworkRequest::ResetAll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foosball_api::default_players;

    fn loaded_app() -> App {
        let mut app = App::new(AppSettings::default());
        app.on_data_loaded(LeagueSnapshot {
            players: default_players(),
            ..Default::default()
        });
        app
    }

    #[test]
    fn loading_data_prefills_the_game_form() {
        let app = loaded_app();
        assert!(app.state.league.loaded);
        assert!(app.state.game_form.picks.iter().all(Option::is_some));
    }

    #[test]
    fn submitting_a_game_clears_scores_only() {
        let mut app = loaded_app();
        app.state.game_form.scores = [7, 3];
        let request = app.submit_game();
        assert!(matches!(
            request,
            Some(NetworkRequest::AddGame { team1_score: 7, team2_score: 3, .. })
        ));
        assert_eq!(app.state.game_form.scores, [0, 0]);
        assert!(app.state.game_form.picks.iter().all(Option::is_some));
    }

    #[test]
    fn incomplete_form_reports_an_error() {
        let mut app = App::new(AppSettings::default());
        assert!(app.submit_game().is_none());
        assert!(app.state.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[test]
    fn remove_targets_the_selected_player() {
        let mut app = loaded_app();
        app.players_down();
        app.players_down();
        match app.remove_selected_player() {
            Some(NetworkRequest::RemovePlayer { name }) => assert_eq!(name, "Uri"),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn selection_is_clamped_when_the_roster_shrinks() {
        let mut app = loaded_app();
        for _ in 0..10 {
            app.players_down();
        }
        assert_eq!(app.state.players.selected, 5);
        app.on_updated(
            "Removed player: Asaf".into(),
            LeagueSnapshot { players: default_players()[..3].to_vec(), ..Default::default() },
        );
        assert_eq!(app.state.players.selected, 2);
    }

    #[test]
    fn reset_requires_confirmation() {
        let mut app = loaded_app();
        app.request_reset();
        assert!(app.state.confirm_reset);
        assert!(app.answer_reset(false).is_none());
        assert!(!app.state.confirm_reset);

        app.request_reset();
        assert!(matches!(app.answer_reset(true), Some(NetworkRequest::ResetAll)));
    }

    #[test]
    fn help_returns_to_the_previous_tab() {
        let mut app = loaded_app();
        app.update_tab(MenuItem::Players);
        app.update_tab(MenuItem::Help);
        app.exit_help();
        assert_eq!(app.state.active_tab, MenuItem::Players);
    }
}
