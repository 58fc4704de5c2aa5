use crate::cache::{Clock, SystemClock, TABLE_TTL, TtlCache};
use crate::client::{RemoteStore, StoreError, StoreResult};
use crate::codec;
use crate::{GAMES_FILE, Game, PLAYERS_FILE, default_players};
use log::{debug, info, warn};
use std::sync::Arc;

/// One persisted table: its path, the cached decoded rows, and the blob
/// revision last seen for it.
#[derive(Debug)]
struct Table<T> {
    path: &'static str,
    cache: TtlCache<T>,
    sha: Option<String>,
}

impl<T: Clone> Table<T> {
    fn new(path: &'static str, clock: Arc<dyn Clock>) -> Self {
        Self { path, cache: TtlCache::new(TABLE_TTL, clock), sha: None }
    }

    fn after_write(&mut self, result: &StoreResult<String>) {
        match result {
            Ok(sha) => {
                self.sha = Some(sha.clone());
                self.cache.invalidate();
            }
            // Whatever we hold is stale; the next read must go to the store.
            Err(StoreError::Conflict(_)) => self.cache.invalidate(),
            Err(_) => {}
        }
    }
}

/// Reads and writes the players and games tables, with a short-lived cache
/// in front of the remote store.
#[derive(Debug)]
pub struct LeagueRepository<S> {
    store: S,
    players: Table<Vec<String>>,
    games: Table<Vec<Game>>,
}

impl<S: RemoteStore> LeagueRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            players: Table::new(PLAYERS_FILE, clock.clone()),
            games: Table::new(GAMES_FILE, clock),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create whichever table does not exist yet, filled with its defaults.
    pub async fn init(&mut self) -> StoreResult<()> {
        if self.store.read(GAMES_FILE).await?.is_none() {
            info!("no games table found, creating {GAMES_FILE}");
            self.games.sha = None;
            self.save_games(&[], "Initialize games data").await?;
        }
        if self.store.read(PLAYERS_FILE).await?.is_none() {
            info!("no players table found, creating {PLAYERS_FILE}");
            self.players.sha = None;
            self.save_players(&default_players(), "Initialize players data").await?;
        }
        Ok(())
    }

    /// The roster, falling back to the default six names when none is stored.
    pub async fn load_players(&mut self) -> StoreResult<Vec<String>> {
        if let Some(players) = self.players.cache.get() {
            return Ok(players);
        }
        debug!("reading players data from the store");
        let players = match self.store.read(self.players.path).await? {
            Some(file) => {
                let players = codec::decode_players(&file.content)?;
                self.players.sha = Some(file.sha);
                info!("loaded {} players", players.len());
                players
            }
            None => {
                warn!("no players data found, using default players");
                self.players.sha = None;
                default_players()
            }
        };
        self.players.cache.insert(players.clone());
        Ok(players)
    }

    /// All recorded games, newest first as stored.
    pub async fn load_games(&mut self) -> StoreResult<Vec<Game>> {
        if let Some(games) = self.games.cache.get() {
            return Ok(games);
        }
        debug!("reading games data from the store");
        let games = match self.store.read(self.games.path).await? {
            Some(file) => {
                let games = codec::decode_games(&file.content)?;
                self.games.sha = Some(file.sha);
                info!("loaded {} games", games.len());
                games
            }
            None => {
                warn!("no games data found, starting from an empty table");
                self.games.sha = None;
                Vec::new()
            }
        };
        self.games.cache.insert(games.clone());
        Ok(games)
    }

    /// Replace the whole roster blob. The write is conditional on the
    /// revision seen by the last read.
    pub async fn save_players(&mut self, players: &[String], message: &str) -> StoreResult<()> {
        let content = codec::encode_players(players)?;
        let result = self
            .store
            .write(self.players.path, &content, message, self.players.sha.as_deref())
            .await;
        self.players.after_write(&result);
        result.map(|_| ())
    }

    /// Replace the whole games blob, conditional like [`Self::save_players`].
    pub async fn save_games(&mut self, games: &[Game], message: &str) -> StoreResult<()> {
        let content = codec::encode_games(games)?;
        let result = self
            .store
            .write(self.games.path, &content, message, self.games.sha.as_deref())
            .await;
        self.games.after_write(&result);
        result.map(|_| ())
    }

    /// Record the current revision of both blobs without decoding them, so
    /// that a deliberate overwrite works even over a malformed table.
    pub async fn refresh_revisions(&mut self) -> StoreResult<()> {
        self.players.sha = self.store.read(self.players.path).await?.map(|f| f.sha);
        self.games.sha = self.store.read(self.games.path).await?.map(|f| f.sha);
        Ok(())
    }

    pub fn invalidate_players(&mut self) {
        self.players.cache.invalidate();
    }

    pub fn invalidate_games(&mut self) {
        self.games.cache.invalidate();
    }
}
