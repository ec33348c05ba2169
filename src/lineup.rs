use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analytics::{FormTrend, analyze_h2h, calc_player_form};
use crate::data::{CurrentSeasonStats, DataSources, FrameResult, SquadChange, SquadOverride};
use crate::rating::{UNKNOWN_PLAYER_PRIOR, bayesian_pct, bayesian_pct_with_prior, player_effective_rating};

/// Exaggerates squad-override deltas so small roster changes visibly move
/// the win-probability model.
pub const SQUAD_DELTA_SCALE: f64 = 4.0;
/// Trailing matches considered when predicting a lineup from appearances.
pub const LINEUP_WINDOW_MATCHES: usize = 3;
pub const CORE_APPEARANCE_RATE: f64 = 0.8;
pub const ROTATION_APPEARANCE_RATE: f64 = 0.4;
pub const SET_SIZE: usize = 5;

const FORM_ADJ_WEIGHT: f64 = 0.3;
const H2H_ADJ_WEIGHT: f64 = 0.2;
const VENUE_ADJ_WEIGHT: f64 = 0.25;

/// Games-played-weighted mean effective win percentage of a roster,
/// optionally restricted to the top `top_n` players by that percentage.
///
/// An empty roster scores a neutral 50; a roster with no game history falls
/// back to the unweighted mean of the (prior-driven) ratings.
pub fn calc_squad_strength(team: &str, top_n: Option<usize>, data: &DataSources) -> f64 {
    score_squad(data.roster(team).iter().map(String::as_str), top_n, data)
}

/// Squad strength after applying hypothetical roster changes.
pub fn calc_modified_squad_strength(
    team: &str,
    overrides: &[SquadOverride],
    top_n: Option<usize>,
    data: &DataSources,
) -> f64 {
    let mut roster: Vec<&str> = data.roster(team).iter().map(String::as_str).collect();
    for o in overrides.iter().filter(|o| o.team == team) {
        match &o.change {
            SquadChange::Add(name) => {
                if !roster.contains(&name.as_str()) {
                    roster.push(name);
                }
            }
            SquadChange::Remove(name) => roster.retain(|p| p != name),
        }
    }
    score_squad(roster.into_iter(), top_n, data)
}

/// Per-team strength delta from roster overrides, on the scale the frame
/// model consumes: the percentage-point change normalized to [0, 1] and
/// exaggerated by [`SQUAD_DELTA_SCALE`].
pub fn calc_strength_adjustments(
    overrides: &[SquadOverride],
    top_n: Option<usize>,
    data: &DataSources,
) -> HashMap<String, f64> {
    let teams: HashSet<&str> = overrides.iter().map(|o| o.team.as_str()).collect();
    teams
        .into_iter()
        .map(|team| {
            let original = calc_squad_strength(team, top_n, data);
            let modified = calc_modified_squad_strength(team, overrides, top_n, data);
            (team.to_string(), (modified - original) / 100.0 * SQUAD_DELTA_SCALE)
        })
        .collect()
}

fn score_squad<'a>(
    roster: impl Iterator<Item = &'a str>,
    top_n: Option<usize>,
    data: &DataSources,
) -> f64 {
    let mut ratings: Vec<(f64, u32)> = roster
        .map(|p| {
            let r = player_effective_rating(p, data);
            (r.pct, r.games)
        })
        .collect();
    if ratings.is_empty() {
        return 50.0;
    }
    ratings.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(n) = top_n {
        ratings.truncate(n.max(1));
    }

    let weight_sum: f64 = ratings.iter().map(|(_, g)| *g as f64).sum();
    if weight_sum > 0.0 {
        ratings.iter().map(|(pct, g)| pct * *g as f64).sum::<f64>() / weight_sum
    } else {
        ratings.iter().map(|(pct, _)| pct).sum::<f64>() / ratings.len() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SquadRole {
    Core,
    Rotation,
    Fringe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedPick {
    pub player: String,
    /// Share of the trailing window's matches the player appeared in.
    pub appearance_rate: f64,
    pub role: SquadRole,
}

/// Predict who turns out for a team from appearances over the trailing
/// `window` matches (core players first).
pub fn predict_lineup(team: &str, frames: &[FrameResult], window: usize) -> Vec<PredictedPick> {
    let mut matches: Vec<(&str, &str, &str)> = Vec::new();
    for f in frames {
        if f.home_team != team && f.away_team != team {
            continue;
        }
        let key = (f.date.as_str(), f.home_team.as_str(), f.away_team.as_str());
        if !matches.contains(&key) {
            matches.push(key);
        }
    }
    matches.sort_by(|a, b| a.0.cmp(b.0));
    let start = matches.len().saturating_sub(window.max(1));
    let recent = &matches[start..];
    if recent.is_empty() {
        return Vec::new();
    }

    let mut appearances: HashMap<&str, usize> = HashMap::new();
    for &(date, home, away) in recent {
        let mut seen: HashSet<&str> = HashSet::new();
        for f in frames {
            if f.date != date || f.home_team != home || f.away_team != away {
                continue;
            }
            let player = if f.home_team == team {
                f.home_player.as_str()
            } else {
                f.away_player.as_str()
            };
            seen.insert(player);
        }
        for p in seen {
            *appearances.entry(p).or_insert(0) += 1;
        }
    }

    let window_len = recent.len() as f64;
    let mut picks: Vec<PredictedPick> = appearances
        .into_iter()
        .map(|(player, n)| {
            let rate = n as f64 / window_len;
            let role = if rate >= CORE_APPEARANCE_RATE {
                SquadRole::Core
            } else if rate >= ROTATION_APPEARANCE_RATE {
                SquadRole::Rotation
            } else {
                SquadRole::Fringe
            };
            PredictedPick {
                player: player.to_string(),
                appearance_rate: rate,
                role,
            }
        })
        .collect();
    picks.sort_by(|a, b| {
        role_rank(a.role)
            .cmp(&role_rank(b.role))
            .then_with(|| b.appearance_rate.partial_cmp(&a.appearance_rate).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.player.cmp(&b.player))
    });
    picks
}

fn role_rank(role: SquadRole) -> u8 {
    match role {
        SquadRole::Core => 0,
        SquadRole::Rotation => 1,
        SquadRole::Fringe => 2,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupSlot {
    pub player: String,
    pub composite_score: f64,
    /// Trailing-10-frame win percentage (base rating when no frame history).
    pub form_pct: f64,
    /// Mean head-to-head edge in percentage points vs the likely opposition.
    pub h2h_advantage: f64,
}

/// Machine-readable tactical observation; [`fmt::Display`] renders the prose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Insight {
    H2hEdge { player: String, opponent: String, edge_pct: f64, frames: u32 },
    HotStreak { player: String, last5_pct: f64 },
    ColdStreak { player: String, last5_pct: f64 },
    SetWeakness { opponent: String, set_number: u8, win_pct: f64 },
    VenueBoost { player: String, at_home: bool, delta_pct: f64 },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::H2hEdge { player, opponent, edge_pct, frames } => write!(
                f,
                "{player} holds a +{edge_pct:.0}pt head-to-head edge over the likely {opponent} lineup ({frames} frames)"
            ),
            Insight::HotStreak { player, last5_pct } => {
                write!(f, "{player} is hot: {last5_pct:.0}% over the last 5 frames")
            }
            Insight::ColdStreak { player, last5_pct } => {
                write!(f, "{player} is cold: {last5_pct:.0}% over the last 5 frames")
            }
            Insight::SetWeakness { opponent, set_number, win_pct } => write!(
                f,
                "{opponent} win only {win_pct:.0}% of Set {set_number} frames; the stronger half of the lineup is stacked there"
            ),
            Insight::VenueBoost { player, at_home, delta_pct } => {
                let venue = if *at_home { "home" } else { "away" };
                write!(f, "{player} runs {delta_pct:.0}pts above baseline in {venue} frames")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupSuggestion {
    pub set1: Vec<LineupSlot>,
    pub set2: Vec<LineupSlot>,
    pub insights: Vec<Insight>,
}

struct Candidate {
    name: String,
    composite: f64,
    form_pct: f64,
    h2h_edge: f64,
    h2h_frames: u32,
    venue_adj: f64,
    venue_delta: f64,
    trend: FormTrend,
    last5_pct: f64,
}

/// Suggest a Set 1 / Set 2 lineup against a named opponent.
///
/// Each candidate scores base rating + recent-form + head-to-head + venue
/// adjustments; the ranked list is dealt so the set where the opponent is
/// historically weaker ends up the stronger one.
pub fn suggest_lineup(
    team: &str,
    opponent: &str,
    is_home: bool,
    frames: &[FrameResult],
    players_current: &HashMap<String, CurrentSeasonStats>,
    rosters: &HashMap<String, Vec<String>>,
) -> LineupSuggestion {
    let mut pool: Vec<&str> = rosters
        .get(team)
        .map(|r| r.iter().map(String::as_str).collect())
        .unwrap_or_default();
    for (name, stats) in players_current {
        if stats.team == team && !pool.contains(&name.as_str()) {
            pool.push(name);
        }
    }

    let opposition = likely_opposition(opponent, frames);
    let mut candidates: Vec<Candidate> = pool
        .into_iter()
        .map(|name| score_candidate(name, is_home, frames, players_current, &opposition))
        .collect();
    candidates.sort_by(|a, b| {
        b.composite
            .partial_cmp(&a.composite)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    let (set1_rate, set1_frames) = set_win_rate(opponent, 1, frames);
    let (set2_rate, set2_frames) = set_win_rate(opponent, 2, frames);
    let weaker_set: u8 = if set2_rate < set1_rate { 2 } else { 1 };

    // Odd ranks into the weaker-opposition set so it ends up the stronger half.
    let mut set1 = Vec::new();
    let mut set2 = Vec::new();
    for (i, c) in candidates.iter().enumerate() {
        let slot = LineupSlot {
            player: c.name.clone(),
            composite_score: c.composite,
            form_pct: c.form_pct,
            h2h_advantage: c.h2h_edge,
        };
        let prefer_set1 = (i % 2 == 0) == (weaker_set == 1);
        if prefer_set1 && set1.len() < SET_SIZE {
            set1.push(slot);
        } else if !prefer_set1 && set2.len() < SET_SIZE {
            set2.push(slot);
        } else if set1.len() < SET_SIZE {
            set1.push(slot);
        } else if set2.len() < SET_SIZE {
            set2.push(slot);
        } else {
            break;
        }
    }

    let mut insights = Vec::new();
    if set1_frames + set2_frames >= 10 && (set1_rate - set2_rate).abs() >= 0.10 {
        let (set_number, rate) = if weaker_set == 1 {
            (1, set1_rate)
        } else {
            (2, set2_rate)
        };
        insights.push(Insight::SetWeakness {
            opponent: opponent.to_string(),
            set_number,
            win_pct: rate * 100.0,
        });
    }
    for c in candidates.iter().take(SET_SIZE * 2) {
        if c.h2h_frames >= 5 && c.h2h_edge >= 10.0 {
            insights.push(Insight::H2hEdge {
                player: c.name.clone(),
                opponent: opponent.to_string(),
                edge_pct: c.h2h_edge,
                frames: c.h2h_frames,
            });
        }
        match c.trend {
            FormTrend::Hot => insights.push(Insight::HotStreak {
                player: c.name.clone(),
                last5_pct: c.last5_pct,
            }),
            FormTrend::Cold => insights.push(Insight::ColdStreak {
                player: c.name.clone(),
                last5_pct: c.last5_pct,
            }),
            FormTrend::Steady => {}
        }
        if c.venue_adj > 2.0 {
            insights.push(Insight::VenueBoost {
                player: c.name.clone(),
                at_home: is_home,
                delta_pct: c.venue_delta,
            });
        }
    }

    LineupSuggestion { set1, set2, insights }
}

fn score_candidate(
    name: &str,
    is_home: bool,
    frames: &[FrameResult],
    players_current: &HashMap<String, CurrentSeasonStats>,
    opposition: &[(String, u32)],
) -> Candidate {
    let base = match players_current.get(name) {
        Some(s) => bayesian_pct(s.won.min(s.played), s.played),
        None => bayesian_pct_with_prior(0, 0, UNKNOWN_PLAYER_PRIOR),
    };

    let form = calc_player_form(name, frames);
    let (form_pct, form_adj) = if form.games > 0 {
        (form.last10_pct, (form.last10_pct - base) * FORM_ADJ_WEIGHT)
    } else {
        (base, 0.0)
    };

    let mut edge_weighted = 0.0;
    let mut edge_frames = 0u32;
    for (opp, _) in opposition {
        let h2h = analyze_h2h(name, opp, frames);
        if h2h.games == 0 {
            continue;
        }
        edge_weighted += (h2h.win_pct - 50.0) * h2h.games as f64;
        edge_frames += h2h.games;
    }
    let h2h_edge = if edge_frames > 0 {
        edge_weighted / edge_frames as f64
    } else {
        0.0
    };

    let (venue_adj, venue_delta) = venue_adjustment(name, is_home, frames);

    Candidate {
        name: name.to_string(),
        composite: base + form_adj + h2h_edge * H2H_ADJ_WEIGHT + venue_adj,
        form_pct,
        h2h_edge,
        h2h_frames: edge_frames,
        venue_adj,
        venue_delta,
        trend: form.trend,
        last5_pct: form.last5_pct,
    }
}

/// Opponent players by appearance count, most frequent first.
fn likely_opposition(opponent: &str, frames: &[FrameResult]) -> Vec<(String, u32)> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for f in frames {
        if f.home_team == opponent {
            *counts.entry(f.home_player.as_str()).or_insert(0) += 1;
        } else if f.away_team == opponent {
            *counts.entry(f.away_player.as_str()).or_insert(0) += 1;
        }
    }
    let mut out: Vec<(String, u32)> = counts
        .into_iter()
        .map(|(p, n)| (p.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Returns `(composite adjustment, raw venue delta)`. The adjustment damps
/// small venue samples; the raw delta (venue pct minus overall pct) is what
/// the insight prose reports.
fn venue_adjustment(player: &str, is_home: bool, frames: &[FrameResult]) -> (f64, f64) {
    let mut overall_wins = 0u32;
    let mut overall = 0u32;
    let mut venue_wins = 0u32;
    let mut venue = 0u32;
    for f in frames {
        let (played_home, won) = if f.home_player == player {
            (true, f.home_win)
        } else if f.away_player == player {
            (false, !f.home_win)
        } else {
            continue;
        };
        overall += 1;
        overall_wins += won as u32;
        if played_home == is_home {
            venue += 1;
            venue_wins += won as u32;
        }
    }
    if overall == 0 || venue == 0 {
        return (0.0, 0.0);
    }
    let overall_pct = overall_wins as f64 / overall as f64 * 100.0;
    let venue_pct = venue_wins as f64 / venue as f64 * 100.0;
    let delta = venue_pct - overall_pct;
    (delta * VENUE_ADJ_WEIGHT * (venue as f64 / 5.0).min(1.0), delta)
}

/// Opponent's frame win rate in one set, with the sample size.
fn set_win_rate(opponent: &str, set_number: u8, frames: &[FrameResult]) -> (f64, u32) {
    let mut wins = 0u32;
    let mut total = 0u32;
    for f in frames.iter().filter(|f| f.set_number == set_number) {
        let won = if f.home_team == opponent {
            f.home_win
        } else if f.away_team == opponent {
            !f.home_win
        } else {
            continue;
        };
        total += 1;
        wins += won as u32;
    }
    if total == 0 {
        (0.5, 0)
    } else {
        (wins as f64 / total as f64, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PriorSeasonStats;

    fn roster_data(team: &str, players: &[(&str, u32, u32)]) -> DataSources {
        let mut data = DataSources::default();
        data.rosters.insert(
            team.to_string(),
            players.iter().map(|(n, _, _)| n.to_string()).collect(),
        );
        for (name, played, won) in players {
            data.players.insert(
                name.to_string(),
                PriorSeasonStats {
                    played: *played,
                    won: *won,
                },
            );
        }
        data
    }

    #[test]
    fn empty_roster_is_neutral() {
        let data = DataSources::default();
        assert_eq!(calc_squad_strength("A", None, &data), 50.0);
    }

    #[test]
    fn top_n_keeps_strongest_players() {
        let data = roster_data("A", &[("Ann", 20, 18), ("Bo", 20, 4), ("Cy", 20, 10)]);
        let full = calc_squad_strength("A", None, &data);
        let top1 = calc_squad_strength("A", Some(1), &data);
        assert!(top1 > full);
        assert_eq!(top1, bayesian_pct(18, 20));
    }

    #[test]
    fn override_add_and_remove_move_strength() {
        let mut data = roster_data("A", &[("Ann", 20, 10)]);
        data.players
            .insert("Star".to_string(), PriorSeasonStats { played: 20, won: 19 });

        let add = vec![SquadOverride {
            team: "A".to_string(),
            change: SquadChange::Add("Star".to_string()),
        }];
        assert!(calc_modified_squad_strength("A", &add, None, &data) > calc_squad_strength("A", None, &data));

        let remove = vec![SquadOverride {
            team: "A".to_string(),
            change: SquadChange::Remove("Ann".to_string()),
        }];
        // Removing the only rated player leaves an empty, neutral squad.
        assert_eq!(calc_modified_squad_strength("A", &remove, None, &data), 50.0);
    }

    #[test]
    fn adjustments_scale_the_pct_delta() {
        let mut data = roster_data("A", &[("Ann", 20, 10)]);
        data.players
            .insert("Star".to_string(), PriorSeasonStats { played: 20, won: 19 });
        let overrides = vec![SquadOverride {
            team: "A".to_string(),
            change: SquadChange::Add("Star".to_string()),
        }];
        let deltas = calc_strength_adjustments(&overrides, None, &data);
        let expected = (calc_modified_squad_strength("A", &overrides, None, &data)
            - calc_squad_strength("A", None, &data))
            / 100.0
            * SQUAD_DELTA_SCALE;
        assert!((deltas["A"] - expected).abs() < 1e-12);
        assert!(deltas["A"] > 0.0);
    }

    fn frame(date: &str, hp: &str, ap: &str, set: u8, home_win: bool) -> FrameResult {
        FrameResult {
            division: "d1".to_string(),
            date: date.to_string(),
            home_team: "A".to_string(),
            away_team: "B".to_string(),
            set_number: set,
            home_player: hp.to_string(),
            away_player: ap.to_string(),
            home_win,
        }
    }

    #[test]
    fn predict_lineup_classifies_by_appearance_rate() {
        let mut frames = Vec::new();
        for (i, date) in ["2026-01-05", "2026-01-12", "2026-01-19"].into_iter().enumerate() {
            frames.push(frame(date, "Ever", "X", 1, true));
            if i == 0 {
                frames.push(frame(date, "Once", "Y", 2, false));
            }
        }
        let picks = predict_lineup("A", &frames, LINEUP_WINDOW_MATCHES);
        assert_eq!(picks[0].player, "Ever");
        assert_eq!(picks[0].role, SquadRole::Core);
        let once = picks.iter().find(|p| p.player == "Once").unwrap();
        assert_eq!(once.role, SquadRole::Fringe);
    }

    #[test]
    fn suggest_lineup_stacks_the_weak_set() {
        let mut players_current = HashMap::new();
        let mut rosters = HashMap::new();
        let names = ["P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8", "P9", "P10"];
        rosters.insert(
            "A".to_string(),
            names.iter().map(|n| n.to_string()).collect::<Vec<_>>(),
        );
        for (i, name) in names.iter().enumerate() {
            players_current.insert(
                name.to_string(),
                CurrentSeasonStats {
                    team: "A".to_string(),
                    played: 20,
                    won: 18 - i as u32,
                    win_pct: 0.0,
                    ..Default::default()
                },
            );
        }
        // Opponent B loses every Set 2 frame and wins every Set 1 frame.
        let mut frames = Vec::new();
        for i in 0..10 {
            let date = format!("2026-01-{:02}", i + 1);
            frames.push(frame(&date, "Zed", "Opp1", 1, false));
            frames.push(frame(&date, "Zed", "Opp2", 2, true));
        }

        let suggestion = suggest_lineup("A", "B", true, &frames, &players_current, &rosters);
        assert_eq!(suggestion.set1.len(), SET_SIZE);
        assert_eq!(suggestion.set2.len(), SET_SIZE);
        // Best-ranked candidate lands in Set 2, where B is weaker.
        assert_eq!(suggestion.set2[0].player, "P1");
        assert!(
            suggestion
                .insights
                .iter()
                .any(|i| matches!(i, Insight::SetWeakness { set_number: 2, .. }))
        );
    }

    #[test]
    fn venue_insight_reports_raw_delta() {
        // Vic: 3 home frames all won, 3 away frames all lost.
        let mut frames = Vec::new();
        for i in 0..3 {
            frames.push(frame(&format!("2026-01-{:02}", i + 1), "Vic", "Opp", 1, true));
            frames.push(FrameResult {
                division: "d1".to_string(),
                date: format!("2026-02-{:02}", i + 1),
                home_team: "B".to_string(),
                away_team: "A".to_string(),
                set_number: 2,
                home_player: "Opp".to_string(),
                away_player: "Vic".to_string(),
                home_win: true,
            });
        }

        // 100% at home vs 50% overall: raw delta 50, adjustment damped by 3/5.
        let (adj, delta) = venue_adjustment("Vic", true, &frames);
        assert!((delta - 50.0).abs() < 1e-12);
        assert!((adj - 50.0 * VENUE_ADJ_WEIGHT * 0.6).abs() < 1e-12);

        let mut players_current = HashMap::new();
        players_current.insert(
            "Vic".to_string(),
            CurrentSeasonStats {
                team: "A".to_string(),
                played: 6,
                won: 3,
                ..Default::default()
            },
        );
        let mut rosters = HashMap::new();
        rosters.insert("A".to_string(), vec!["Vic".to_string()]);
        let suggestion = suggest_lineup("A", "B", true, &frames, &players_current, &rosters);
        let boost = suggestion
            .insights
            .iter()
            .find_map(|i| match i {
                Insight::VenueBoost { player, delta_pct, .. } if player == "Vic" => Some(*delta_pct),
                _ => None,
            })
            .unwrap();
        // The prose figure is the undamped venue-minus-overall gap.
        assert!((boost - 50.0).abs() < 1e-12);
    }

    #[test]
    fn insight_prose_renders() {
        let text = Insight::H2hEdge {
            player: "Ann".to_string(),
            opponent: "B".to_string(),
            edge_pct: 15.0,
            frames: 8,
        }
        .to_string();
        assert!(text.contains("Ann"));
        assert!(text.contains("head-to-head"));
    }
}
