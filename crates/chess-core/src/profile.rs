//! Per-player aggregates built from game history: opening repertoire by
//! color, expected value by game length, and win/loss totals.

use std::collections::HashMap;

use crate::game::Game;
use crate::record::{EvBucket, EvByMoveCount, OpeningStatistic, PlayerStats};

#[derive(Debug, Default, Clone, Copy)]
struct ScoreTally {
    games: u32,
    score: f64,
}

impl ScoreTally {
    fn add(&mut self, score: f64) {
        self.games += 1;
        self.score += score;
    }

    fn merge(&mut self, other: ScoreTally) {
        self.games += other.games;
        self.score += other.score;
    }

    fn mean(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.score / self.games as f64
        }
    }
}

/// Built aggregates for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProfile {
    pub stats: PlayerStats,
    pub openings_as_white: Vec<OpeningStatistic>,
    pub openings_as_black: Vec<OpeningStatistic>,
    pub expected_value_by_num_moves: EvByMoveCount,
}

/// Left-fold accumulator over a player's games. Games the player did not
/// take part in are ignored.
#[derive(Debug, Clone)]
pub struct ProfileAccumulator {
    username: String,
    openings: [HashMap<String, ScoreTally>; 2],
    by_move_count: HashMap<u32, ScoreTally>,
    stats: PlayerStats,
    latest: Option<((String, String), i32)>,
}

impl ProfileAccumulator {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            openings: [HashMap::new(), HashMap::new()],
            by_move_count: HashMap::new(),
            stats: PlayerStats::default(),
            latest: None,
        }
    }

    pub fn absorb(mut self, game: &Game) -> Self {
        let Some(side) = game.side_of(&self.username) else {
            return self;
        };
        let score = game.result.score_for(side);

        self.openings[side.index()]
            .entry(game.metadata.opening_name())
            .or_default()
            .add(score);
        self.by_move_count
            .entry(game.move_count())
            .or_default()
            .add(score);

        self.stats.games += 1;
        match score {
            s if s >= 1.0 => self.stats.win += 1,
            s if s <= 0.0 => self.stats.loss += 1,
            _ => self.stats.draw += 1,
        }

        if let Some(rating) = game.rating(side) {
            let played_at = game.metadata.played_at();
            if self.latest.as_ref().map_or(true, |(at, _)| played_at >= *at) {
                self.latest = Some((played_at, rating));
            }
        }

        self
    }

    /// Combine two accumulators built over disjoint game sets.
    pub fn merge(mut self, other: ProfileAccumulator) -> Self {
        for (mine, theirs) in self.openings.iter_mut().zip(other.openings) {
            for (name, tally) in theirs {
                mine.entry(name).or_default().merge(tally);
            }
        }
        for (moves, tally) in other.by_move_count {
            self.by_move_count.entry(moves).or_default().merge(tally);
        }
        self.stats.win += other.stats.win;
        self.stats.loss += other.stats.loss;
        self.stats.draw += other.stats.draw;
        self.stats.games += other.stats.games;
        if let Some((at, rating)) = other.latest {
            if self.latest.as_ref().map_or(true, |(mine, _)| at >= *mine) {
                self.latest = Some((at, rating));
            }
        }
        self
    }

    pub fn finish(self) -> PlayerProfile {
        let [white, black] = self.openings;
        let mut stats = self.stats;
        stats.rating = self.latest.map(|(_, rating)| rating);

        PlayerProfile {
            stats,
            openings_as_white: opening_statistics(white),
            openings_as_black: opening_statistics(black),
            expected_value_by_num_moves: self
                .by_move_count
                .into_iter()
                .map(|(moves, tally)| {
                    (
                        moves,
                        EvBucket {
                            expected_value: tally.mean(),
                            games: tally.games,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Build a profile for `username` from their games.
pub fn build_profile<'a>(username: &str, games: impl IntoIterator<Item = &'a Game>) -> PlayerProfile {
    games
        .into_iter()
        .fold(ProfileAccumulator::new(username), ProfileAccumulator::absorb)
        .finish()
}

fn opening_statistics(openings: HashMap<String, ScoreTally>) -> Vec<OpeningStatistic> {
    let total: u32 = openings.values().map(|t| t.games).sum();
    let mut stats: Vec<OpeningStatistic> = openings
        .into_iter()
        .map(|(opening, tally)| OpeningStatistic {
            frequency: tally.games as f64 / total as f64,
            expected_value: tally.mean(),
            games: tally.games,
            opening,
        })
        .collect();

    // Most played first, ties by name
    stats.sort_by(|a, b| {
        b.games
            .cmp(&a.games)
            .then_with(|| a.opening.cmp(&b.opening))
    });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(white: &str, black: &str, result: &str, opening: &str, date: &str, elo: (i32, i32)) -> Game {
        let pgn = format!(
            "[White \"{white}\"]\n[Black \"{black}\"]\n[Result \"{result}\"]\n[Date \"{date}\"]\n\
             [WhiteElo \"{}\"]\n[BlackElo \"{}\"]\n[Opening \"{opening}\"]\n\n\
             1. e4 e5 2. Nf3 Nc6 {result}",
            elo.0, elo.1
        );
        Game::from_pgn(&pgn).unwrap()
    }

    #[test]
    fn aggregates_openings_by_color() {
        let games = vec![
            game("me", "x", "1-0", "Italian", "2024.01.01", (1500, 1400)),
            game("me", "y", "0-1", "Italian", "2024.01.02", (1510, 1400)),
            game("me", "z", "1/2-1/2", "Ruy Lopez", "2024.01.03", (1505, 1400)),
            game("w", "ME", "0-1", "Sicilian", "2024.01.04", (1600, 1520)),
            game("a", "b", "1-0", "Other", "2024.01.05", (1000, 1000)),
        ];

        let profile = build_profile("me", &games);
        assert_eq!(profile.stats.games, 4);
        assert_eq!((profile.stats.win, profile.stats.loss, profile.stats.draw), (2, 1, 1));
        assert_eq!(profile.stats.rating, Some(1520));

        let white = &profile.openings_as_white;
        assert_eq!(white.len(), 2);
        assert_eq!(white[0].opening, "Italian");
        assert_eq!(white[0].games, 2);
        assert!((white[0].frequency - 2.0 / 3.0).abs() < 1e-12);
        assert!((white[0].expected_value - 0.5).abs() < 1e-12);
        assert_eq!(white[1].opening, "Ruy Lopez");

        let black = &profile.openings_as_black;
        assert_eq!(black.len(), 1);
        assert_eq!(black[0].expected_value, 1.0);

        let bucket = profile.expected_value_by_num_moves[&2];
        assert_eq!(bucket.games, 4);
        assert!((bucket.expected_value - 2.5 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn merge_matches_single_fold() {
        let games = vec![
            game("me", "x", "1-0", "Italian", "2024.01.01", (1500, 1400)),
            game("me", "y", "0-1", "Scotch", "2024.02.01", (1490, 1400)),
            game("q", "me", "1-0", "French", "2024.03.01", (1400, 1480)),
        ];
        let whole = build_profile("me", &games);
        let left = ProfileAccumulator::new("me").absorb(&games[0]);
        let right = games[1..]
            .iter()
            .fold(ProfileAccumulator::new("me"), ProfileAccumulator::absorb);
        assert_eq!(left.merge(right).finish(), whole);
    }
}
