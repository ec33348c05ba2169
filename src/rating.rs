use serde::{Deserialize, Serialize};

use crate::data::DataSources;

/// Neutral prior win rate a zero-sample record converges to.
pub const BAYES_PRIOR: f64 = 0.5;
/// Pseudo-game count behind the prior; the raw rate dominates as games grow.
pub const BAYES_K: f64 = 6.0;
/// Pessimistic prior for players with no record in either season.
pub const UNKNOWN_PLAYER_PRIOR: f64 = 0.45;
/// Minimum current-season games before the current record outranks the prior season.
pub const MIN_CURRENT_GAMES: u32 = 3;

/// Bayesian-smoothed win percentage on [0, 100].
///
/// `bayesian_pct(0, 0) == 50.0`; as `played` grows the raw rate takes over.
pub fn bayesian_pct(won: u32, played: u32) -> f64 {
    bayesian_pct_with_prior(won, played, BAYES_PRIOR)
}

pub fn bayesian_pct_with_prior(won: u32, played: u32, prior: f64) -> f64 {
    ((won as f64 + BAYES_K * prior) / (played as f64 + BAYES_K)) * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingSource {
    CurrentSeason,
    PriorSeason,
    Unknown,
}

/// A player's resolved win percentage plus the sample it rests on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EffectiveRating {
    pub pct: f64,
    pub games: u32,
    pub source: RatingSource,
}

/// Resolve a player's effective win percentage across both season records.
///
/// Prefers the current season once it has at least [`MIN_CURRENT_GAMES`]
/// games, falls back to the prior season, and bottoms out at the
/// pessimistic unknown-player prior. Pure: identical inputs always yield
/// identical output.
pub fn player_effective_rating(player: &str, data: &DataSources) -> EffectiveRating {
    if let Some(cur) = data.current_stats(player) {
        if cur.played >= MIN_CURRENT_GAMES {
            return EffectiveRating {
                pct: bayesian_pct(cur.won.min(cur.played), cur.played),
                games: cur.played,
                source: RatingSource::CurrentSeason,
            };
        }
    }
    if let Some(prior) = data.prior_stats(player) {
        if prior.played > 0 {
            return EffectiveRating {
                pct: bayesian_pct(prior.won, prior.played),
                games: prior.played,
                source: RatingSource::PriorSeason,
            };
        }
    }
    EffectiveRating {
        pct: bayesian_pct_with_prior(0, 0, UNKNOWN_PLAYER_PRIOR),
        games: 0,
        source: RatingSource::Unknown,
    }
}
