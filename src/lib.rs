//! Pool-league prediction and analytics engine.
//!
//! A pure, synchronous computation library: every entry point is a function
//! of an immutable [`DataSources`] snapshot and returns a fully materialized
//! result. Loading the snapshot, rendering the outputs, and anything else
//! with I/O lives outside this crate. The only non-determinism is the
//! Monte Carlo randomness, and the `*_with` variants accept a seed for
//! reproducible runs.

pub mod analytics;
pub mod data;
pub mod lineup;
pub mod predict;
pub mod rating;
pub mod simulate;
pub mod standings;
pub mod strength;

pub use analytics::{
    BdStats, FixtureImportance, FormTrend, H2hAdvantage, H2hReport, PlayerForm, analyze_h2h,
    calc_bd_stats, calc_fixture_importance, calc_player_form, get_remaining_fixtures,
    get_team_results,
};
pub use data::{
    CurrentSeasonStats, DataSources, Division, Fixture, FrameResult, MatchResult,
    PriorSeasonStats, SquadChange, SquadOverride, WhatIfResult,
};
pub use lineup::{
    Insight, LineupSlot, LineupSuggestion, PredictedPick, SquadRole, calc_modified_squad_strength,
    calc_squad_strength, calc_strength_adjustments, predict_lineup, suggest_lineup,
};
pub use predict::{HOME_ADV, predict_frame};
pub use rating::{
    EffectiveRating, RatingSource, UNKNOWN_PLAYER_PRIOR, bayesian_pct, player_effective_rating,
};
pub use simulate::{
    FRAMES_PER_MATCH, MatchPrediction, ScorelineFreq, SimConfig, TeamSeasonOutlook,
    run_pred_sim, run_pred_sim_with, run_season_simulation, run_season_simulation_with,
    simulate_match,
};
pub use standings::{Standing, calc_standings};
pub use strength::calc_team_strength;
