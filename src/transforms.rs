//! Pure transforms over assembled tables. No I/O.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::model::{
    join_roster, AveragePoints, ChipUsageEvent, CumulativePoints, GameweekHistoryEntry,
    GameweekKeyed, GameweekPick, LeagueSnapshot, ManagerKeyed, ManagerRoster, Named, RankingRow,
    RosterJoin, StandingsRow,
};

/// Rows that carry a per-gameweek score.
pub trait Scored {
    fn points(&self) -> i32;
}

impl Scored for GameweekHistoryEntry {
    fn points(&self) -> i32 {
        self.points
    }
}

impl Scored for ChipUsageEvent {
    fn points(&self) -> i32 {
        self.points
    }
}

impl Scored for GameweekPick {
    fn points(&self) -> i32 {
        self.captain_score
    }
}

impl<T: Scored> Scored for Named<T> {
    fn points(&self) -> i32 {
        self.row.points()
    }
}

/// Ranks managers for one gameweek, best total first. Equal totals keep the
/// order of `totals`, so ranks are always `1..=n` with no repeats.
pub fn rank_by_points(gameweek: u32, totals: &[(u32, i32)]) -> Vec<RankingRow> {
    let mut ordered: Vec<&(u32, i32)> = totals.iter().collect();
    // stable: ties stay in input order
    ordered.sort_by(|a, b| b.1.cmp(&a.1));
    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, (manager_id, _))| RankingRow {
            manager_id: *manager_id,
            gameweek,
            rank: idx as u32 + 1,
        })
        .collect()
}

fn group_series<T>(rows: &[T]) -> BTreeMap<u32, Vec<(u32, i32)>>
where
    T: ManagerKeyed + GameweekKeyed + Scored,
{
    let mut groups: BTreeMap<u32, Vec<(u32, i32)>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.manager_id())
            .or_default()
            .push((row.gameweek(), row.points()));
    }
    for series in groups.values_mut() {
        series.sort_by_key(|(gameweek, _)| *gameweek);
    }
    groups
}

/// Running total of points per manager, in gameweek order.
pub fn cumulative_points<T>(rows: &[T]) -> Vec<CumulativePoints>
where
    T: ManagerKeyed + GameweekKeyed + Scored,
{
    let mut out = Vec::with_capacity(rows.len());
    for (manager_id, series) in group_series(rows) {
        let mut total = 0;
        for (gameweek, points) in series {
            total += points;
            out.push(CumulativePoints {
                manager_id,
                gameweek,
                total_points: total,
            });
        }
    }
    out
}

/// Trailing mean of points per manager over at most `window` observations,
/// emitting a value from the first observation on. With `window` equal to
/// the latest gameweek this is the season-to-date average.
pub fn rolling_average<T>(rows: &[T], window: usize) -> Vec<AveragePoints>
where
    T: ManagerKeyed + GameweekKeyed + Scored,
{
    let window = window.max(1);
    let mut out = Vec::with_capacity(rows.len());
    for (manager_id, series) in group_series(rows) {
        let mut recent: VecDeque<i32> = VecDeque::with_capacity(window);
        let mut sum: i64 = 0;
        for (gameweek, points) in series {
            if recent.len() == window {
                if let Some(oldest) = recent.pop_front() {
                    sum -= i64::from(oldest);
                }
            }
            recent.push_back(points);
            sum += i64::from(points);
            out.push(AveragePoints {
                manager_id,
                gameweek,
                average: sum as f64 / recent.len() as f64,
            });
        }
    }
    out
}

/// Season running totals with manager names attached.
pub fn points_progression<T>(history: &[T], roster: &ManagerRoster) -> RosterJoin<CumulativePoints>
where
    T: ManagerKeyed + GameweekKeyed + Scored,
{
    join_roster(cumulative_points(history), roster)
}

/// Season-to-date average with manager names attached.
pub fn points_average<T>(
    history: &[T],
    roster: &ManagerRoster,
    latest_gameweek: u32,
) -> RosterJoin<AveragePoints>
where
    T: ManagerKeyed + GameweekKeyed + Scored,
{
    join_roster(rolling_average(history, latest_gameweek as usize), roster)
}

/// Rows with `lo <= gameweek <= hi`. A reversed range is read the other way
/// round.
pub fn filter_gameweek_range<T: GameweekKeyed + Clone>(rows: &[T], lo: u32, hi: u32) -> Vec<T> {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    rows.iter()
        .filter(|row| (lo..=hi).contains(&row.gameweek()))
        .cloned()
        .collect()
}

/// Rows belonging to the selected managers, by display name.
pub fn filter_managers<T: Clone>(rows: &[Named<T>], selected: &[&str]) -> Vec<Named<T>> {
    rows.iter()
        .filter(|row| selected.contains(&row.player_name.as_str()))
        .cloned()
        .collect()
}

/// Current league table, ordered by rank.
pub fn standings_table(snapshot: &LeagueSnapshot) -> Vec<StandingsRow> {
    let mut rows: Vec<StandingsRow> = snapshot
        .managers
        .iter()
        .map(|m| StandingsRow {
            rank: m.rank,
            manager_id: m.manager_id,
            manager: m.player_name.clone(),
            team: m.team_name.clone(),
            latest_score: m.latest_points,
            total_points: m.total_points,
        })
        .collect();
    rows.sort_by_key(|row| row.rank);
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryExtremes {
    /// Best current league rank.
    pub leader: StandingsRow,
    /// Highest score in the latest gameweek.
    pub top_latest: StandingsRow,
}

/// Leader and best latest-gameweek scorer; the earlier row wins ties.
pub fn summary_extremes(rows: &[StandingsRow]) -> Option<SummaryExtremes> {
    let leader = rows.iter().min_by_key(|row| row.rank)?;
    let top_latest = rows.iter().reduce(|best, row| {
        if row.latest_score > best.latest_score {
            row
        } else {
            best
        }
    })?;
    Some(SummaryExtremes {
        leader: leader.clone(),
        top_latest: top_latest.clone(),
    })
}
