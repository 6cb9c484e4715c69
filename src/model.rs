use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::warn;

use crate::error::{FetchError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerSummary {
    pub manager_id: u32,
    pub player_name: String,
    pub team_name: String,
    pub total_points: i32,
    pub latest_points: i32,
    pub rank: u32,
}

/// League metadata as returned by the standings endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueSnapshot {
    pub league_id: u32,
    pub name: String,
    /// In the order the remote returned them.
    pub managers: Vec<ManagerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerRow {
    pub manager_id: u32,
    pub player_name: String,
    pub team_name: String,
}

/// One row per manager, keyed by `manager_id`. Row order follows the
/// snapshot, which is also the tie-break order for league ranks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagerRoster {
    rows: Vec<ManagerRow>,
}

impl ManagerRoster {
    pub fn from_snapshot(snapshot: &LeagueSnapshot) -> Self {
        Self::from_rows(
            snapshot
                .managers
                .iter()
                .map(|m| ManagerRow {
                    manager_id: m.manager_id,
                    player_name: m.player_name.clone(),
                    team_name: m.team_name.clone(),
                })
                .collect(),
        )
    }

    /// Keeps the first row for any repeated `manager_id`.
    pub fn from_rows(rows: Vec<ManagerRow>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let rows = rows
            .into_iter()
            .filter(|row| seen.insert(row.manager_id))
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ManagerRow] {
        &self.rows
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.iter().map(|row| row.manager_id)
    }

    pub fn get(&self, manager_id: u32) -> Option<&ManagerRow> {
        self.rows.iter().find(|row| row.manager_id == manager_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameweekPick {
    pub manager_id: u32,
    pub gameweek: u32,
    pub player_id: u32,
    pub player_name: String,
    pub captain_score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameweekHistoryEntry {
    pub manager_id: u32,
    pub gameweek: u32,
    pub points: i32,
    pub overall_rank: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Chip {
    #[serde(rename = "Wildcard 1")]
    Wildcard1,
    #[serde(rename = "Wildcard 2")]
    Wildcard2,
    #[serde(rename = "Triple Captain")]
    TripleCaptain,
    #[serde(rename = "Bench Boost")]
    BenchBoost,
    #[serde(rename = "Free Hit")]
    FreeHit,
}

const CHIP_CODES: &[(&str, Chip)] = &[
    ("3xc", Chip::TripleCaptain),
    ("freehit", Chip::FreeHit),
    ("bboost", Chip::BenchBoost),
];

impl Chip {
    /// Maps a remote chip code played in `gameweek` to its slot. Wildcards
    /// before `wildcard_cutoff` are the first slot, the rest the second.
    pub fn from_code(code: &str, gameweek: u32, wildcard_cutoff: u32) -> Result<Self> {
        if code == "wildcard" {
            return Ok(if gameweek < wildcard_cutoff {
                Chip::Wildcard1
            } else {
                Chip::Wildcard2
            });
        }
        CHIP_CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, chip)| *chip)
            .ok_or_else(|| FetchError::UnknownChip(code.to_string()))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Chip::Wildcard1 => "Wildcard 1",
            Chip::Wildcard2 => "Wildcard 2",
            Chip::TripleCaptain => "Triple Captain",
            Chip::BenchBoost => "Bench Boost",
            Chip::FreeHit => "Free Hit",
        }
    }
}

impl std::fmt::Display for Chip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChipUsageEvent {
    pub manager_id: u32,
    pub gameweek: u32,
    pub chip: Chip,
    pub points: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankingRow {
    pub manager_id: u32,
    pub gameweek: u32,
    pub rank: u32,
}

/// Current league table row shown in the summary section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsRow {
    pub rank: u32,
    pub manager_id: u32,
    pub manager: String,
    pub team: String,
    pub latest_score: i32,
    pub total_points: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CumulativePoints {
    pub manager_id: u32,
    pub gameweek: u32,
    pub total_points: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AveragePoints {
    pub manager_id: u32,
    pub gameweek: u32,
    pub average: f64,
}

pub trait ManagerKeyed {
    fn manager_id(&self) -> u32;
}

pub trait GameweekKeyed {
    fn gameweek(&self) -> u32;
}

macro_rules! keyed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ManagerKeyed for $ty {
                fn manager_id(&self) -> u32 {
                    self.manager_id
                }
            }

            impl GameweekKeyed for $ty {
                fn gameweek(&self) -> u32 {
                    self.gameweek
                }
            }
        )*
    };
}

keyed!(
    GameweekPick,
    GameweekHistoryEntry,
    ChipUsageEvent,
    RankingRow,
    CumulativePoints,
    AveragePoints,
);

/// A row with the manager's display columns attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Named<T> {
    pub player_name: String,
    pub team_name: String,
    #[serde(flatten)]
    pub row: T,
}

impl<T: ManagerKeyed> ManagerKeyed for Named<T> {
    fn manager_id(&self) -> u32 {
        self.row.manager_id()
    }
}

impl<T: GameweekKeyed> GameweekKeyed for Named<T> {
    fn gameweek(&self) -> u32 {
        self.row.gameweek()
    }
}

/// Result of an inner join against the roster. `missing` lists manager ids
/// whose rows were dropped because the roster has no entry for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterJoin<T> {
    pub rows: Vec<Named<T>>,
    pub missing: Vec<u32>,
}

impl<T> RosterJoin<T> {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn join_roster<T: ManagerKeyed>(rows: Vec<T>, roster: &ManagerRoster) -> RosterJoin<T> {
    let by_id: HashMap<u32, &ManagerRow> = roster
        .rows()
        .iter()
        .map(|row| (row.manager_id, row))
        .collect();
    let mut missing = BTreeSet::new();
    let mut joined = Vec::with_capacity(rows.len());
    for row in rows {
        match by_id.get(&row.manager_id()) {
            Some(manager) => joined.push(Named {
                player_name: manager.player_name.clone(),
                team_name: manager.team_name.clone(),
                row,
            }),
            None => {
                missing.insert(row.manager_id());
            }
        }
    }
    if !missing.is_empty() {
        warn!(?missing, "rows dropped by roster join");
    }
    RosterJoin {
        rows: joined,
        missing: missing.into_iter().collect(),
    }
}

/// Deterministic `(manager_id, gameweek)` ordering for gathered rows.
pub fn sort_by_key<T: ManagerKeyed + GameweekKeyed>(rows: &mut [T]) {
    rows.sort_by_key(|row| (row.manager_id(), row.gameweek()));
}
