use crate::state::messages::{LeagueSnapshot, NetworkRequest, NetworkResponse};
use foosball_api::client::RemoteStore;
use foosball_api::league::{League, LeagueResult};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

/// Games listed on the Games tab.
pub const RECENT_GAMES: usize = 5;

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Owns the league and runs store operations one request at a time, so every
/// change is a complete read-modify-write before the next one starts.
pub struct NetworkWorker<S> {
    league: League<S>,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl<S: RemoteStore + 'static> NetworkWorker<S> {
    pub fn new(
        league: League<S>,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            league,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let result = self.handle(request).await;

            debug!("network request complete");
            self.stop_loading_animation(result.is_ok()).await;

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle(&mut self, request: NetworkRequest) -> LeagueResult<NetworkResponse> {
        match request {
            NetworkRequest::Init => {
                debug!("initializing league tables");
                self.league.init().await?;
                self.loaded().await
            }
            NetworkRequest::Reload => {
                debug!("reloading league tables");
                self.league.reload();
                self.loaded().await
            }
            NetworkRequest::AddGame { team1, team2, team1_score, team2_score } => {
                let game = self.league.add_game(team1, team2, team1_score, team2_score).await?;
                let message = format!(
                    "Game added: {} {} - {} {}",
                    game.team1.label(),
                    game.team1_score,
                    game.team2_score,
                    game.team2.label()
                );
                self.updated(message).await
            }
            NetworkRequest::AddPlayer { name } => {
                let name = self.league.add_player(&name).await?;
                self.updated(format!("Added player: {name}")).await
            }
            NetworkRequest::RemovePlayer { name } => {
                self.league.remove_player(&name).await?;
                self.updated(format!("Removed player: {name}")).await
            }
            NetworkRequest::ResetAll => {
                // Whatever the outcome, show what the store holds now.
                let reset = self.league.reset_all().await;
                let snapshot = self.snapshot().await?;
                reset?;
                Ok(NetworkResponse::Updated {
                    message: "Database reset successfully!".into(),
                    snapshot,
                })
            }
        }
    }

    async fn snapshot(&mut self) -> LeagueResult<LeagueSnapshot> {
        Ok(LeagueSnapshot {
            players: self.league.players().await?,
            recent_games: self.league.recent_games(RECENT_GAMES).await?,
            rankings: self.league.rankings().await?,
        })
    }

    async fn loaded(&mut self) -> LeagueResult<NetworkResponse> {
        Ok(NetworkResponse::DataLoaded { snapshot: self.snapshot().await? })
    }

    async fn updated(&mut self, message: String) -> LeagueResult<NetworkResponse> {
        Ok(NetworkResponse::Updated { message, snapshot: self.snapshot().await? })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
