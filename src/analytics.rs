use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{DataSources, Fixture, FrameResult, MatchResult, WhatIfResult};
use crate::simulate::{SimConfig, run_season_simulation_with};

/// Trailing frame windows for form classification, smallest first.
pub const FORM_WINDOWS: [usize; 3] = [5, 8, 10];
pub const HOT_THRESHOLD_PCT: f64 = 65.0;
pub const COLD_THRESHOLD_PCT: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormTrend {
    Hot,
    Cold,
    Steady,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerForm {
    pub player: String,
    /// Frames available for the trailing windows.
    pub games: usize,
    pub last5_pct: f64,
    pub last8_pct: f64,
    pub last10_pct: f64,
    pub trend: FormTrend,
    /// Recency-weighted trajectory on [-1, 1]; positive means improving.
    pub momentum: f64,
}

/// Rolling-window form over a player's frame history.
///
/// Momentum uses linear recency weighting over the trailing ten frames:
/// the i-th oldest result contributes ±(i + 1), normalized by the weight sum.
pub fn calc_player_form(player: &str, frames: &[FrameResult]) -> PlayerForm {
    // Oldest first; dates are ISO strings so lexicographic order is
    // chronological, and the sort is stable within a date.
    let mut history: Vec<&FrameResult> = frames
        .iter()
        .filter(|f| f.home_player == player || f.away_player == player)
        .collect();
    history.sort_by(|a, b| a.date.cmp(&b.date));
    let wins: Vec<bool> = history
        .iter()
        .map(|f| {
            if f.home_player == player {
                f.home_win
            } else {
                !f.home_win
            }
        })
        .collect();

    let last5_pct = trailing_pct(&wins, FORM_WINDOWS[0]);
    let last8_pct = trailing_pct(&wins, FORM_WINDOWS[1]);
    let last10_pct = trailing_pct(&wins, FORM_WINDOWS[2]);

    let trend = if wins.is_empty() {
        FormTrend::Steady
    } else if last5_pct >= HOT_THRESHOLD_PCT {
        FormTrend::Hot
    } else if last5_pct < COLD_THRESHOLD_PCT {
        FormTrend::Cold
    } else {
        FormTrend::Steady
    };

    PlayerForm {
        player: player.to_string(),
        games: wins.len(),
        last5_pct,
        last8_pct,
        last10_pct,
        trend,
        momentum: momentum(&wins),
    }
}

fn trailing_pct(wins: &[bool], window: usize) -> f64 {
    let tail = &wins[wins.len().saturating_sub(window)..];
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().filter(|w| **w).count() as f64 / tail.len() as f64 * 100.0
}

fn momentum(wins: &[bool]) -> f64 {
    let tail = &wins[wins.len().saturating_sub(FORM_WINDOWS[2])..];
    if tail.is_empty() {
        return 0.0;
    }
    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    for (i, win) in tail.iter().enumerate() {
        let w = (i + 1) as f64;
        weighted += if *win { w } else { -w };
        weight_sum += w;
    }
    weighted / weight_sum
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum H2hAdvantage {
    Strong,
    Moderate,
    Even,
    Disadvantage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct H2hReport {
    pub player: String,
    pub opponent: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    /// Subject player's win rate across all meetings, percent.
    pub win_pct: f64,
    pub advantage: H2hAdvantage,
    /// min(1, games / 10): how much history backs the classification.
    pub confidence: f64,
}

/// Head-to-head record between two named players, either side of the table.
pub fn analyze_h2h(player: &str, opponent: &str, frames: &[FrameResult]) -> H2hReport {
    let mut games = 0u32;
    let mut wins = 0u32;
    for f in frames {
        let subject_home = f.home_player == player && f.away_player == opponent;
        let subject_away = f.away_player == player && f.home_player == opponent;
        if !subject_home && !subject_away {
            continue;
        }
        games += 1;
        if f.home_win == subject_home {
            wins += 1;
        }
    }

    let win_pct = if games > 0 {
        wins as f64 / games as f64 * 100.0
    } else {
        50.0
    };
    let advantage = if games == 0 {
        H2hAdvantage::Even
    } else if win_pct >= 65.0 {
        H2hAdvantage::Strong
    } else if win_pct >= 55.0 {
        H2hAdvantage::Moderate
    } else if win_pct > 45.0 {
        H2hAdvantage::Even
    } else {
        H2hAdvantage::Disadvantage
    };

    H2hReport {
        player: player.to_string(),
        opponent: opponent.to_string(),
        games,
        wins,
        losses: games - wins,
        win_pct,
        advantage,
        confidence: (games as f64 / 10.0).min(1.0),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BdStats {
    pub player: String,
    pub bd_for: u32,
    pub bd_against: u32,
    /// Break-and-dish frames scored per frame played.
    pub for_rate: f64,
    pub against_rate: f64,
    pub net: i64,
    /// for / (for + against); None when the player has no B&D either way.
    pub efficiency: Option<f64>,
}

pub fn calc_bd_stats(player: &str, data: &DataSources) -> BdStats {
    let (bd_for, bd_against, played) = data
        .current_stats(player)
        .map(|s| (s.bd_for, s.bd_against, s.played))
        .unwrap_or((0, 0, 0));

    let per_frame = |n: u32| {
        if played > 0 {
            n as f64 / played as f64
        } else {
            0.0
        }
    };
    let total = bd_for + bd_against;
    BdStats {
        player: player.to_string(),
        bd_for,
        bd_against,
        for_rate: per_frame(bd_for),
        against_rate: per_frame(bd_against),
        net: bd_for as i64 - bd_against as i64,
        efficiency: (total > 0).then(|| bd_for as f64 / total as f64),
    }
}

/// Fixtures in a division not yet covered by a result, date-ordered.
pub fn get_remaining_fixtures(division_id: &str, data: &DataSources) -> Vec<Fixture> {
    let mut out: Vec<Fixture> = data
        .fixtures_for(division_id)
        .filter(|f| {
            !data.results_for(division_id).any(|r| {
                r.home_team == f.home_team && r.away_team == f.away_team && r.date == f.date
            })
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| a.date.cmp(&b.date));
    out
}

/// A team's completed matches across the snapshot, date-ordered.
pub fn get_team_results(team: &str, data: &DataSources) -> Vec<MatchResult> {
    let mut out: Vec<MatchResult> = data
        .results
        .iter()
        .filter(|r| r.home_team == team || r.away_team == team)
        .cloned()
        .collect();
    out.sort_by(|a, b| a.date.cmp(&b.date));
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureImportance {
    pub fixture: Fixture,
    pub p_top2_if_win: f64,
    pub p_top2_if_loss: f64,
    /// |p_top2(win) - p_top2(loss)|, the fixture's leverage on a top-2 finish.
    pub swing: f64,
}

/// Rank a team's remaining fixtures by how much each one moves its top-2
/// finish probability.
///
/// Every fixture costs two full season-simulation batches, so callers should
/// size `cfg.season_replays` to their latency budget. Both hypothetical runs
/// share the config's seed, which pairs the replays and keeps the swing
/// estimate from drowning in Monte Carlo noise.
pub fn calc_fixture_importance(
    division_id: &str,
    team: &str,
    data: &DataSources,
    cfg: &SimConfig,
) -> Result<Vec<FixtureImportance>> {
    let mut out = Vec::new();
    for fixture in get_remaining_fixtures(division_id, data) {
        if fixture.home_team != team && fixture.away_team != team {
            continue;
        }
        let is_home = fixture.home_team == team;
        // A representative single-margin scoreline either way; the swing only
        // depends on win/loss points and a +/-2 differential.
        let (win_home, win_away) = if is_home { (6, 4) } else { (4, 6) };
        let win = hypothetical(&fixture, win_home, win_away);
        let loss = hypothetical(&fixture, 10 - win_home, 10 - win_away);

        let p_top2_if_win = top2_for(division_id, team, &win, data, cfg)?;
        let p_top2_if_loss = top2_for(division_id, team, &loss, data, cfg)?;
        out.push(FixtureImportance {
            fixture,
            p_top2_if_win,
            p_top2_if_loss,
            swing: (p_top2_if_win - p_top2_if_loss).abs(),
        });
    }
    out.sort_by(|a, b| {
        b.swing
            .partial_cmp(&a.swing)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.fixture.date.cmp(&b.fixture.date))
    });
    Ok(out)
}

fn hypothetical(fixture: &Fixture, home_score: u32, away_score: u32) -> WhatIfResult {
    WhatIfResult {
        home_team: fixture.home_team.clone(),
        away_team: fixture.away_team.clone(),
        home_score,
        away_score,
    }
}

fn top2_for(
    division_id: &str,
    team: &str,
    what_if: &WhatIfResult,
    data: &DataSources,
    cfg: &SimConfig,
) -> Result<f64> {
    let outlooks =
        run_season_simulation_with(division_id, &[], None, std::slice::from_ref(what_if), data, cfg)?;
    Ok(outlooks
        .iter()
        .find(|o| o.team == team)
        .map(|o| o.p_top2)
        .unwrap_or(0.0))
}
