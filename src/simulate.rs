use std::collections::HashMap;

use anyhow::{Result, ensure};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analytics::get_remaining_fixtures;
use crate::data::{DataSources, SquadOverride, WhatIfResult};
use crate::lineup::calc_strength_adjustments;
use crate::predict::predict_frame;
use crate::standings::{PTS_AWAY_WIN, PTS_DRAW, PTS_HOME_WIN, calc_standings};
use crate::strength::calc_team_strength;

pub const FRAMES_PER_MATCH: u32 = 10;
pub const PRED_SIM_RUNS: usize = 5_000;
pub const SEASON_REPLAYS: usize = 1_000;

/// Knobs for the Monte Carlo batches. Replays are independent, so callers
/// can trade accuracy for speed; a fixed seed makes output reproducible
/// regardless of how rayon schedules the replays.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    pub pred_runs: usize,
    pub season_replays: usize,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            pred_runs: PRED_SIM_RUNS,
            season_replays: SEASON_REPLAYS,
            seed: None,
        }
    }
}

impl SimConfig {
    fn master_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::thread_rng().r#gen())
    }
}

/// One simulated match: 10 independent frames at home-win probability `p`.
pub fn simulate_match(p: f64, rng: &mut impl Rng) -> (u32, u32) {
    let mut home = 0;
    for _ in 0..FRAMES_PER_MATCH {
        if rng.r#gen::<f64>() < p {
            home += 1;
        }
    }
    (home, FRAMES_PER_MATCH - home)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScorelineFreq {
    pub home: u32,
    pub away: u32,
    /// Share of simulated matches ending on this exact scoreline, percent.
    pub pct: f64,
}

/// Outcome percentages are on the 0-100 scale; expected frames are means
/// over the batch and sum to 10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub p_home_win: f64,
    pub p_draw: f64,
    pub p_away_win: f64,
    pub expected_home: f64,
    pub expected_away: f64,
    pub top_scores: Vec<ScorelineFreq>,
}

/// Monte Carlo single-match prediction at the default 5,000 runs.
pub fn run_pred_sim(p: f64) -> Result<MatchPrediction> {
    run_pred_sim_with(p, PRED_SIM_RUNS, &mut rand::thread_rng())
}

pub fn run_pred_sim_with(p: f64, runs: usize, rng: &mut impl Rng) -> Result<MatchPrediction> {
    ensure!((0.0..=1.0).contains(&p), "frame probability {p} outside [0, 1]");
    ensure!(runs > 0, "prediction needs at least one run");

    let mut home_wins = 0usize;
    let mut draws = 0usize;
    let mut home_total = 0u64;
    let mut counts: HashMap<(u32, u32), u32> = HashMap::new();

    for _ in 0..runs {
        let (h, a) = simulate_match(p, rng);
        home_total += h as u64;
        if h > a {
            home_wins += 1;
        } else if h == a {
            draws += 1;
        }
        *counts.entry((h, a)).or_insert(0) += 1;
    }

    let runs_f = runs as f64;
    let expected_home = home_total as f64 / runs_f;

    let mut scores: Vec<((u32, u32), u32)> = counts.into_iter().collect();
    // Frequency ties break on the scoreline so the top-5 list is deterministic.
    scores.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let top_scores = scores
        .into_iter()
        .take(5)
        .map(|((home, away), n)| ScorelineFreq {
            home,
            away,
            pct: n as f64 / runs_f * 100.0,
        })
        .collect();

    Ok(MatchPrediction {
        p_home_win: home_wins as f64 / runs_f * 100.0,
        p_draw: draws as f64 / runs_f * 100.0,
        p_away_win: (runs - home_wins - draws) as f64 / runs_f * 100.0,
        expected_home,
        expected_away: FRAMES_PER_MATCH as f64 - expected_home,
        top_scores,
    })
}

/// Per-team summary of one season-simulation batch. Probabilities on [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSeasonOutlook {
    pub team: String,
    pub current_pts: u32,
    pub avg_pts: f64,
    pub p_title: f64,
    pub p_top2: f64,
    pub p_bot2: f64,
}

/// Season simulation at the default 1,000 replays with unseeded randomness.
pub fn run_season_simulation(
    division_id: &str,
    squad_overrides: &[SquadOverride],
    squad_top_n: Option<usize>,
    what_ifs: &[WhatIfResult],
    data: &DataSources,
) -> Result<Vec<TeamSeasonOutlook>> {
    run_season_simulation_with(
        division_id,
        squad_overrides,
        squad_top_n,
        what_ifs,
        data,
        &SimConfig::default(),
    )
}

/// Replay the rest of the season `cfg.season_replays` times.
///
/// Each replay starts from the current table, applies every What-If override
/// verbatim, simulates the remaining fixtures with the frame model, then
/// re-sorts with the standings tie-break. Replays fan out across rayon with
/// a per-replay rng seeded from the master seed, so a fixed seed is
/// bit-reproducible at any thread count.
pub fn run_season_simulation_with(
    division_id: &str,
    squad_overrides: &[SquadOverride],
    squad_top_n: Option<usize>,
    what_ifs: &[WhatIfResult],
    data: &DataSources,
    cfg: &SimConfig,
) -> Result<Vec<TeamSeasonOutlook>> {
    ensure!(cfg.season_replays > 0, "season simulation needs at least one replay");
    for w in what_ifs {
        ensure!(
            w.home_score + w.away_score == FRAMES_PER_MATCH,
            "what-if {} v {} scores {}-{} do not total {} frames",
            w.home_team,
            w.away_team,
            w.home_score,
            w.away_score,
            FRAMES_PER_MATCH,
        );
    }

    let standings = calc_standings(division_id, data);
    if standings.is_empty() {
        return Ok(Vec::new());
    }

    let mut strengths = calc_team_strength(division_id, data);
    for (team, delta) in calc_strength_adjustments(squad_overrides, squad_top_n, data) {
        *strengths.entry(team).or_insert(0.0) += delta;
    }

    // Base table in standings order; the replay re-sort is stable against it.
    let teams: Vec<String> = standings.iter().map(|s| s.team.clone()).collect();
    let index: HashMap<&str, usize> = teams
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();
    let current_pts: Vec<u32> = standings.iter().map(|s| s.points).collect();

    let mut base_pts = current_pts.clone();
    let mut base_diff: Vec<i64> = standings.iter().map(|s| s.frame_diff).collect();

    // Locked-in overrides score like real results and are not re-simulated.
    let mut locked: Vec<(usize, usize)> = Vec::new();
    for w in what_ifs {
        let (Some(&h), Some(&a)) = (index.get(w.home_team.as_str()), index.get(w.away_team.as_str()))
        else {
            continue;
        };
        locked.push((h, a));
        apply_match(&mut base_pts, &mut base_diff, h, a, w.home_score, w.away_score);
    }

    let pairings: Vec<(usize, usize, f64)> = get_remaining_fixtures(division_id, data)
        .into_iter()
        .filter_map(|f| {
            let h = *index.get(f.home_team.as_str())?;
            let a = *index.get(f.away_team.as_str())?;
            if locked.contains(&(h, a)) {
                return None;
            }
            let p = predict_frame(
                strengths.get(&f.home_team).copied().unwrap_or(0.0),
                strengths.get(&f.away_team).copied().unwrap_or(0.0),
            );
            Some((h, a, p))
        })
        .collect();

    let n = teams.len();
    let master_seed = cfg.master_seed();
    let tally = (0..cfg.season_replays)
        .into_par_iter()
        .fold(
            || Tally::new(n),
            |mut tally, replay| {
                let mut rng = StdRng::seed_from_u64(master_seed.wrapping_add(replay as u64));
                run_replay(&base_pts, &base_diff, &pairings, &mut rng, &mut tally);
                tally
            },
        )
        .reduce(|| Tally::new(n), Tally::merge);

    let replays = cfg.season_replays as f64;
    let mut out: Vec<TeamSeasonOutlook> = (0..n)
        .map(|i| TeamSeasonOutlook {
            team: teams[i].clone(),
            current_pts: current_pts[i],
            avg_pts: tally.pts_sum[i] as f64 / replays,
            p_title: tally.titles[i] as f64 / replays,
            p_top2: tally.top2[i] as f64 / replays,
            p_bot2: tally.bot2[i] as f64 / replays,
        })
        .collect();
    out.sort_by(|x, y| {
        y.avg_pts
            .partial_cmp(&x.avg_pts)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| x.team.cmp(&y.team))
    });
    Ok(out)
}

struct Tally {
    pts_sum: Vec<u64>,
    titles: Vec<u32>,
    top2: Vec<u32>,
    bot2: Vec<u32>,
}

impl Tally {
    fn new(n: usize) -> Self {
        Self {
            pts_sum: vec![0; n],
            titles: vec![0; n],
            top2: vec![0; n],
            bot2: vec![0; n],
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for i in 0..self.pts_sum.len() {
            self.pts_sum[i] += other.pts_sum[i];
            self.titles[i] += other.titles[i];
            self.top2[i] += other.top2[i];
            self.bot2[i] += other.bot2[i];
        }
        self
    }
}

fn run_replay(
    base_pts: &[u32],
    base_diff: &[i64],
    pairings: &[(usize, usize, f64)],
    rng: &mut impl Rng,
    tally: &mut Tally,
) {
    let mut pts = base_pts.to_vec();
    let mut diff = base_diff.to_vec();
    for &(h, a, p) in pairings {
        let (hf, af) = simulate_match(p, rng);
        apply_match(&mut pts, &mut diff, h, a, hf, af);
    }

    let n = pts.len();
    let mut order: Vec<usize> = (0..n).collect();
    // Same tie-break as the live table: points, then frame differential,
    // then base-table position.
    order.sort_by(|&x, &y| {
        pts[y]
            .cmp(&pts[x])
            .then(diff[y].cmp(&diff[x]))
            .then(x.cmp(&y))
    });

    for (i, &team) in order.iter().enumerate() {
        tally.pts_sum[team] += pts[team] as u64;
        if i == 0 {
            tally.titles[team] += 1;
        }
        if i < 2 {
            tally.top2[team] += 1;
        }
        if i + 2 >= n {
            tally.bot2[team] += 1;
        }
    }
}

fn apply_match(pts: &mut [u32], diff: &mut [i64], h: usize, a: usize, hf: u32, af: u32) {
    diff[h] += hf as i64 - af as i64;
    diff[a] += af as i64 - hf as i64;
    if hf > af {
        pts[h] += PTS_HOME_WIN;
    } else if hf < af {
        pts[a] += PTS_AWAY_WIN;
    } else {
        pts[h] += PTS_DRAW;
        pts[a] += PTS_DRAW;
    }
}
