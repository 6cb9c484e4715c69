//! League aggregators: fan a per-manager aggregator out over the roster,
//! concatenate the slices and attach manager names.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{FetchError, Result};
use crate::fetch_pool::{
    fetch_gameweeks, gather, gather_settled, with_fetch_pool, FetchStrategy,
};
use crate::fpl_api::{fetch_live_scores, fetch_player_names};
use crate::http_client::Transport;
use crate::manager_fetch::{
    gameweek_totals, manager_captain_picks, manager_chip_usage, manager_history,
};
use crate::model::{
    join_roster, sort_by_key, ChipUsageEvent, GameweekHistoryEntry, GameweekKeyed, GameweekPick,
    ManagerKeyed, ManagerRoster, Named, RankingRow, RosterJoin,
};
use crate::transforms::rank_by_points;

#[derive(Debug, Clone, Serialize)]
pub struct FailureRow {
    pub manager_id: u32,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ManagerFailure {
    pub manager_id: u32,
    pub error: FetchError,
}

/// A league table assembled from per-manager slices. Managers whose slice
/// failed are listed in `failures` instead of contributing rows.
#[derive(Debug)]
pub struct LeagueFetch<T> {
    pub rows: Vec<Named<T>>,
    pub failures: Vec<ManagerFailure>,
}

impl<T> LeagueFetch<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// A table derived from this one. The failures carry over, since a
    /// manager absent here is absent from anything computed from it.
    pub fn derive<U>(&self, rows: Vec<Named<U>>) -> LeagueFetch<U> {
        LeagueFetch {
            rows,
            failures: self.failures.clone(),
        }
    }

    pub fn failed_ids(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.manager_id).collect()
    }

    /// Fail-fast view: the first failed manager's error, or every row.
    pub fn into_complete(self) -> Result<Vec<Named<T>>> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(FetchError::for_manager(failure.manager_id, failure.error)),
            None => Ok(self.rows),
        }
    }

    pub fn failure_rows(&self) -> Vec<FailureRow> {
        self.failures
            .iter()
            .map(|f| FailureRow {
                manager_id: f.manager_id,
                error: f.error.to_string(),
            })
            .collect()
    }
}

fn strategy_for(config: &PipelineConfig, roster: &ManagerRoster, latest_gameweek: u32) -> FetchStrategy {
    FetchStrategy::for_league(roster.len(), latest_gameweek, config.small_league_threshold)
}

fn assemble<T>(
    label: &'static str,
    roster: &ManagerRoster,
    slices: Vec<(u32, Vec<T>)>,
    failed: Vec<(u32, FetchError)>,
    started: Instant,
) -> LeagueFetch<T>
where
    T: ManagerKeyed + GameweekKeyed,
{
    let mut rows: Vec<T> = slices.into_iter().flat_map(|(_, rows)| rows).collect();
    sort_by_key(&mut rows);
    let RosterJoin { rows, .. } = join_roster(rows, roster);

    let mut failures: Vec<ManagerFailure> = failed
        .into_iter()
        .map(|(manager_id, error)| ManagerFailure { manager_id, error })
        .collect();
    failures.sort_by_key(|f| f.manager_id);
    for failure in &failures {
        warn!(table = label, manager_id = failure.manager_id, error = %failure.error, "manager slice failed");
    }
    info!(
        table = label,
        rows = rows.len(),
        failed = failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "league table assembled"
    );

    LeagueFetch { rows, failures }
}

/// League rank of every manager after every gameweek, computed from each
/// manager's season total. One failed fetch fails the whole table, since a
/// missing manager would shift every other rank in that gameweek.
pub fn league_rankings<S: Transport>(
    source: &S,
    config: &PipelineConfig,
    roster: &ManagerRoster,
    latest_gameweek: u32,
) -> Result<RosterJoin<RankingRow>> {
    let started = Instant::now();
    let manager_ids: Vec<u32> = roster.ids().collect();
    let strategy = match strategy_for(config, roster, latest_gameweek) {
        chunked @ FetchStrategy::Chunked { .. } => chunked,
        // one unit per gameweek
        FetchStrategy::Sequential => FetchStrategy::Chunked {
            chunks: latest_gameweek as usize,
        },
    };

    let per_gameweek = with_fetch_pool(config.parallelism, || {
        fetch_gameweeks(strategy, latest_gameweek, |gameweek| {
            let totals = gameweek_totals(source, &manager_ids, gameweek)?;
            Ok(rank_by_points(gameweek, &totals))
        })
    })?;

    let mut rows: Vec<RankingRow> = per_gameweek.into_iter().flatten().collect();
    rows.sort_by_key(|row| (row.gameweek, row.rank));
    info!(
        table = "rankings",
        rows = rows.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "league table assembled"
    );
    Ok(join_roster(rows, roster))
}

/// Every manager's captain per gameweek and what the captain scored. Player
/// names and live scoring are fetched once and shared by all managers.
pub fn league_captain_picks<S: Transport>(
    source: &S,
    config: &PipelineConfig,
    roster: &ManagerRoster,
    latest_gameweek: u32,
) -> Result<LeagueFetch<GameweekPick>> {
    let started = Instant::now();
    let players = fetch_player_names(source)?;
    let strategy = strategy_for(config, roster, latest_gameweek);
    let manager_ids: Vec<u32> = roster.ids().collect();
    let gameweeks: Vec<u32> = (1..=latest_gameweek).collect();

    let (slices, failed) = with_fetch_pool(config.parallelism, || -> Result<_> {
        let live: HashMap<u32, _> = gather(&gameweeks, |gameweek| fetch_live_scores(source, gameweek))?
            .into_iter()
            .collect();
        Ok(gather_settled(&manager_ids, |manager_id| {
            manager_captain_picks(source, manager_id, latest_gameweek, strategy, &players, &live)
        }))
    })?;

    Ok(assemble("captains", roster, slices, failed, started))
}

/// Points and overall rank per gameweek for every manager.
pub fn league_history<S: Transport>(
    source: &S,
    config: &PipelineConfig,
    roster: &ManagerRoster,
    latest_gameweek: u32,
) -> LeagueFetch<GameweekHistoryEntry> {
    let started = Instant::now();
    let manager_ids: Vec<u32> = roster.ids().collect();
    let (slices, failed) = with_fetch_pool(config.parallelism, || {
        gather_settled(&manager_ids, |manager_id| {
            manager_history(source, manager_id, latest_gameweek)
        })
    });
    assemble("history", roster, slices, failed, started)
}

/// Every chip played by every manager.
pub fn league_chip_usage<S: Transport>(
    source: &S,
    config: &PipelineConfig,
    roster: &ManagerRoster,
    latest_gameweek: u32,
) -> LeagueFetch<ChipUsageEvent> {
    let started = Instant::now();
    let strategy = strategy_for(config, roster, latest_gameweek);
    let manager_ids: Vec<u32> = roster.ids().collect();
    let (slices, failed) = with_fetch_pool(config.parallelism, || {
        gather_settled(&manager_ids, |manager_id| {
            manager_chip_usage(
                source,
                manager_id,
                latest_gameweek,
                strategy,
                config.wildcard_cutoff,
            )
        })
    });
    assemble("chips", roster, slices, failed, started)
}
