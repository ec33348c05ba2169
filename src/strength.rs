use std::collections::HashMap;

use crate::data::DataSources;
use crate::rating::bayesian_pct;
use crate::standings::calc_standings;

/// Games played before prior-season form stops contributing.
pub const PRIOR_BLEND_MATCHES: f64 = 10.0;

/// Team strength for every team in a division.
///
/// Strength is a dimensionless scalar meaningful only when comparing two
/// teams fed to the frame-win model. Current form is the per-game frame
/// differential normalized onto the logistic's scale; prior form is the
/// roster's games-weighted smoothed win percentage mapped onto the same
/// scale. The two blend linearly over the first [`PRIOR_BLEND_MATCHES`]
/// games, after which only current form counts.
pub fn calc_team_strength(division_id: &str, data: &DataSources) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    for standing in calc_standings(division_id, data) {
        let games = standing.played as f64;
        let current = if standing.played > 0 {
            (standing.frame_diff as f64 / games / 10.0) * 2.0
        } else {
            0.0
        };
        // Missing roster data leaves a neutral prior, so a team with zero
        // games and no prior-season roster lands on exactly 0.
        let prior = roster_prior_strength(&standing.team, data).unwrap_or(0.0);
        let w = (games / PRIOR_BLEND_MATCHES).min(1.0);
        out.insert(standing.team, w * current + (1.0 - w) * prior);
    }
    out
}

/// Games-weighted prior-season roster strength, or None without roster data.
///
/// A 60% squad maps to +0.4, the same strength as a team averaging +2 frames
/// per match under the current-form formula, so the blend mixes like scales.
fn roster_prior_strength(team: &str, data: &DataSources) -> Option<f64> {
    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    for player in data.roster(team) {
        let Some(stats) = data.prior_stats(player) else {
            continue;
        };
        if stats.played == 0 {
            continue;
        }
        weighted += stats.played as f64 * bayesian_pct(stats.won, stats.played);
        weight_sum += stats.played as f64;
    }
    if weight_sum <= 0.0 {
        return None;
    }
    let pct = weighted / weight_sum;
    Some((pct - 50.0) / 25.0)
}
