// Folding recorded games into the leaderboard.
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::{Game, PlayerStats, RankingEntry};

const POINTS_PER_WIN: u32 = 3;
const POINTS_PER_DRAW: u32 = 1;

impl PlayerStats {
    fn record(&mut self, own_score: u32, opponent_score: u32) {
        self.games += 1;
        match own_score.cmp(&opponent_score) {
            Ordering::Greater => {
                self.wins += 1;
                self.points += POINTS_PER_WIN;
            }
            Ordering::Less => self.losses += 1,
            Ordering::Equal => {
                self.draws += 1;
                self.points += POINTS_PER_DRAW;
            }
        }
    }

    fn finalize(&mut self) {
        self.win_rate = if self.games == 0 {
            0.0
        } else {
            let rate = f64::from(self.wins) * 100.0 / f64::from(self.games);
            // Exact halves go to the even digit: 1 of 16 is 6.2, not 6.3.
            (rate * 10.0).round_ties_even() / 10.0
        };
    }
}

// Higher win rate first, then more points.
fn compare_entries(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    b.stats
        .win_rate
        .total_cmp(&a.stats.win_rate)
        .then_with(|| b.stats.points.cmp(&a.stats.points))
}

/// Build the leaderboard from the full games table.
///
/// Only players who appear in at least one game are listed. Entries tied on
/// both win rate and points keep the order in which the players were first
/// seen while walking `games`.
pub fn compute_rankings(games: &[Game]) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for game in games {
        for (team, own, opponent) in game.sides() {
            for player in team.players() {
                let slot = *index.entry(player.to_owned()).or_insert_with(|| {
                    entries.push(RankingEntry {
                        player: player.to_owned(),
                        stats: PlayerStats::default(),
                    });
                    entries.len() - 1
                });
                entries[slot].stats.record(own, opponent);
            }
        }
    }

    for entry in &mut entries {
        entry.stats.finalize();
    }
    entries.sort_by(compare_entries);
    entries
}
