//! CSV layout of the two tables kept in the remote store.
//!
//! Both files carry a header row and use `\n` line endings, so a table that
//! was written empty still round-trips as a header-only file.
use crate::client::{StoreError, StoreResult};
use crate::{Game, Team};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PLAYERS_HEADER: [&str; 1] = ["name"];
const GAMES_HEADER: [&str; 7] = [
    "team1_player1",
    "team1_player2",
    "team2_player1",
    "team2_player2",
    "team1_score",
    "team2_score",
    "date",
];

#[derive(Debug, Serialize, Deserialize)]
struct PlayerRow {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GameRow {
    team1_player1: String,
    team1_player2: String,
    team2_player1: String,
    team2_player2: String,
    team1_score: u32,
    team2_score: u32,
    date: String,
}

impl From<&Game> for GameRow {
    fn from(game: &Game) -> Self {
        Self {
            team1_player1: game.team1.player1.clone(),
            team1_player2: game.team1.player2.clone(),
            team2_player1: game.team2.player1.clone(),
            team2_player2: game.team2.player2.clone(),
            team1_score: game.team1_score,
            team2_score: game.team2_score,
            date: game.date.format(DATE_FORMAT).to_string(),
        }
    }
}

impl TryFrom<GameRow> for Game {
    type Error = StoreError;

    fn try_from(row: GameRow) -> StoreResult<Self> {
        let date = NaiveDateTime::parse_from_str(row.date.trim(), DATE_FORMAT)
            .map_err(|e| StoreError::Codec(format!("bad date {:?}: {e}", row.date)))?;
        Ok(Game {
            team1: Team::new(row.team1_player1, row.team1_player2),
            team2: Team::new(row.team2_player1, row.team2_player2),
            team1_score: row.team1_score,
            team2_score: row.team2_score,
            date,
        })
    }
}

pub fn encode_players(players: &[String]) -> StoreResult<String> {
    let rows = players.iter().map(|name| PlayerRow { name: name.clone() });
    encode(&PLAYERS_HEADER, rows)
}

pub fn decode_players(content: &str) -> StoreResult<Vec<String>> {
    decode::<PlayerRow>(content).map(|rows| rows.into_iter().map(|r| r.name).collect())
}

pub fn encode_games(games: &[Game]) -> StoreResult<String> {
    encode(&GAMES_HEADER, games.iter().map(GameRow::from))
}

pub fn decode_games(content: &str) -> StoreResult<Vec<Game>> {
    decode::<GameRow>(content)?
        .into_iter()
        .map(Game::try_from)
        .collect()
}

fn encode<R: Serialize>(header: &[&str], rows: impl Iterator<Item = R>) -> StoreResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(header).map_err(codec_error)?;
    for row in rows {
        writer.serialize(row).map_err(codec_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::Codec(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode<R: serde::de::DeserializeOwned>(content: &str) -> StoreResult<Vec<R>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    reader
        .deserialize()
        .map(|row| row.map_err(codec_error))
        .collect()
}

fn codec_error(e: csv::Error) -> StoreError {
    StoreError::Codec(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_game() -> Game {
        Game {
            team1: Team::new("Moti", "Chen"),
            team2: Team::new("Uri", "Baki"),
            team1_score: 10,
            team2_score: 7,
            date: NaiveDate::from_ymd_opt(2024, 11, 3)
                .unwrap()
                .and_hms_opt(17, 5, 9)
                .unwrap(),
        }
    }

    #[test]
    fn players_table_has_header_and_one_name_per_line() {
        let players = vec!["Moti".to_string(), "Chen".to_string()];
        assert_eq!(encode_players(&players).unwrap(), "name\nMoti\nChen\n");
    }

    #[test]
    fn names_with_commas_and_quotes_survive() {
        let players = vec!["Nir, Jr.".to_string(), "\"Asaf\"".to_string(), "Uri".to_string()];
        let encoded = encode_players(&players).unwrap();
        assert_eq!(decode_players(&encoded).unwrap(), players);
    }

    #[test]
    fn games_table_uses_seven_columns_and_second_precision_dates() {
        let encoded = encode_games(&[sample_game()]).unwrap();
        assert_eq!(
            encoded,
            "team1_player1,team1_player2,team2_player1,team2_player2,team1_score,team2_score,date\n\
             Moti,Chen,Uri,Baki,10,7,2024-11-03 17:05:09\n"
        );
        assert_eq!(decode_games(&encoded).unwrap(), vec![sample_game()]);
    }

    #[test]
    fn empty_games_table_is_header_only() {
        let encoded = encode_games(&[]).unwrap();
        assert_eq!(encoded.lines().count(), 1);
        assert!(decode_games(&encoded).unwrap().is_empty());
        assert!(decode_games("").unwrap().is_empty());
    }

    #[test]
    fn bad_rows_are_rejected() {
        let content = "team1_player1,team1_player2,team2_player1,team2_player2,team1_score,team2_score,date\n\
                       Moti,Chen,Uri,Baki,ten,7,2024-11-03 17:05:09\n";
        assert!(matches!(decode_games(content), Err(StoreError::Codec(_))));

        let content = "team1_player1,team1_player2,team2_player1,team2_player2,team1_score,team2_score,date\n\
                       Moti,Chen,Uri,Baki,1,7,yesterday\n";
        assert!(matches!(decode_games(content), Err(StoreError::Codec(_))));
    }
}
