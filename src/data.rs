use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Immutable snapshot of league data the engine computes from.
///
/// Assembled by an out-of-scope loading layer and passed by reference to
/// every entry point; the engine never mutates it. Dates are ISO-8601
/// strings, so lexicographic order is chronological order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSources {
    #[serde(default)]
    pub divisions: HashMap<String, Division>,
    /// Completed matches, all divisions.
    #[serde(default)]
    pub results: Vec<MatchResult>,
    /// Unplayed matches, all divisions.
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
    /// Frame-by-frame detail for completed matches.
    #[serde(default)]
    pub frames: Vec<FrameResult>,
    /// Prior-season player records, keyed by player name.
    #[serde(default)]
    pub players: HashMap<String, PriorSeasonStats>,
    /// Prior-season rosters: team name -> player names.
    #[serde(default)]
    pub rosters: HashMap<String, Vec<String>>,
    /// Current-season player records, keyed by player name.
    #[serde(default)]
    pub players_current: HashMap<String, CurrentSeasonStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Division {
    pub name: String,
    pub teams: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub division: String,
    pub date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub division: String,
    pub date: String,
    pub home_team: String,
    pub away_team: String,
}

/// One frame of one match. Set 1 is frames 1-5, Set 2 is frames 6-10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResult {
    pub division: String,
    pub date: String,
    pub home_team: String,
    pub away_team: String,
    pub set_number: u8,
    pub home_player: String,
    pub away_player: String,
    pub home_win: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PriorSeasonStats {
    pub played: u32,
    pub won: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentSeasonStats {
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub win_pct: f64,
    /// Break-and-dish frames scored by the player.
    #[serde(default)]
    pub bd_for: u32,
    /// Break-and-dish frames conceded to opponents.
    #[serde(default)]
    pub bd_against: u32,
    #[serde(default)]
    pub forfeits: u32,
}

impl DataSources {
    pub fn division(&self, division_id: &str) -> Option<&Division> {
        self.divisions.get(division_id)
    }

    /// Completed matches for one division, in snapshot order.
    pub fn results_for(&self, division_id: &str) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(move |r| r.division == division_id)
    }

    /// Unplayed matches for one division, in snapshot order.
    pub fn fixtures_for(&self, division_id: &str) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(move |f| f.division == division_id)
    }

    pub fn roster(&self, team: &str) -> &[String] {
        self.rosters.get(team).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn prior_stats(&self, player: &str) -> Option<PriorSeasonStats> {
        // Guard malformed records here so the rating math never sees won > played.
        self.players.get(player).map(|s| PriorSeasonStats {
            played: s.played,
            won: s.won.min(s.played),
        })
    }

    pub fn current_stats(&self, player: &str) -> Option<&CurrentSeasonStats> {
        self.players_current.get(player)
    }
}

/// User-locked hypothetical result for an unplayed fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfResult {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
}

/// Hypothetical roster change used to preview its effect on team strength.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadOverride {
    pub team: String,
    pub change: SquadChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SquadChange {
    Add(String),
    Remove(String),
}
