use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::DataSources;

/// Match points. Away wins outscore home wins to offset home advantage
/// in qualification.
pub const PTS_HOME_WIN: u32 = 2;
pub const PTS_AWAY_WIN: u32 = 3;
pub const PTS_DRAW: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standing {
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub frames_for: u32,
    pub frames_against: u32,
    pub frame_diff: i64,
    pub points: u32,
}

impl Standing {
    fn new(team: &str) -> Self {
        Self {
            team: team.to_string(),
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            frames_for: 0,
            frames_against: 0,
            frame_diff: 0,
            points: 0,
        }
    }

    fn record(&mut self, scored: u32, conceded: u32, is_home: bool) {
        self.played += 1;
        self.frames_for += scored;
        self.frames_against += conceded;
        self.frame_diff += scored as i64 - conceded as i64;
        if scored > conceded {
            self.won += 1;
            self.points += if is_home { PTS_HOME_WIN } else { PTS_AWAY_WIN };
        } else if scored < conceded {
            self.lost += 1;
        } else {
            self.drawn += 1;
            self.points += PTS_DRAW;
        }
    }
}

/// League table for one division.
///
/// Rows are seeded in the division's team-list order, then sorted by points
/// descending and frame differential descending; the sort is stable, so any
/// remaining tie keeps first-seen order. An unknown division yields an empty
/// table; results naming teams outside the division are ignored.
pub fn calc_standings(division_id: &str, data: &DataSources) -> Vec<Standing> {
    let Some(division) = data.division(division_id) else {
        return Vec::new();
    };

    let mut rows: Vec<Standing> = division.teams.iter().map(|t| Standing::new(t)).collect();
    let index: HashMap<&str, usize> = division
        .teams
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    for result in data.results_for(division_id) {
        let (Some(&h), Some(&a)) = (
            index.get(result.home_team.as_str()),
            index.get(result.away_team.as_str()),
        ) else {
            continue;
        };
        rows[h].record(result.home_score, result.away_score, true);
        rows[a].record(result.away_score, result.home_score, false);
    }

    rows.sort_by(|x, y| {
        y.points
            .cmp(&x.points)
            .then(y.frame_diff.cmp(&x.frame_diff))
    });
    rows
}
