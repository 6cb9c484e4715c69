//! Per-league session: the snapshot, roster and latest gameweek are fetched
//! once on open, and every league table is memoised in a [`MetricCache`]
//! until the session is reset or switched to another league.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fpl_api::{fetch_current_gameweek, fetch_league_snapshot, league_name};
use crate::http_client::Transport;
use crate::league_fetch::{
    league_captain_picks, league_chip_usage, league_history, league_rankings, LeagueFetch,
};
use crate::model::{
    AveragePoints, ChipUsageEvent, CumulativePoints, GameweekHistoryEntry, GameweekPick,
    LeagueSnapshot, ManagerRoster, RankingRow, RosterJoin, StandingsRow,
};
use crate::transforms::{
    filter_gameweek_range, points_average, points_progression, standings_table, summary_extremes,
    SummaryExtremes,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Rankings,
    Captains,
    History,
    Chips,
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Tables keyed by `(league_id, metric)`.
#[derive(Default)]
pub struct MetricCache {
    entries: HashMap<(u32, Metric), Entry>,
}

impl MetricCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any + Send + Sync>(&self, league_id: u32, metric: Metric) -> Option<Arc<T>> {
        let entry = self.entries.get(&(league_id, metric))?.clone();
        entry.downcast::<T>().ok()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, league_id: u32, metric: Metric, table: Arc<T>) {
        self.entries.insert((league_id, metric), table);
    }

    pub fn contains(&self, league_id: u32, metric: Metric) -> bool {
        self.entries.contains_key(&(league_id, metric))
    }

    pub fn invalidate(&mut self, league_id: u32) {
        self.entries.retain(|(league, _), _| *league != league_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct LeagueSession<S> {
    source: S,
    config: PipelineConfig,
    snapshot: LeagueSnapshot,
    roster: ManagerRoster,
    latest_gameweek: u32,
    cache: MetricCache,
}

impl<S: Transport> LeagueSession<S> {
    pub fn open(source: S, config: PipelineConfig, league_id: u32) -> Result<Self> {
        let snapshot = fetch_league_snapshot(&source, league_id)?;
        let latest_gameweek = fetch_current_gameweek(&source)?;
        let roster = ManagerRoster::from_snapshot(&snapshot);
        info!(
            league_id,
            league = %snapshot.name,
            managers = roster.len(),
            latest_gameweek,
            "league session opened"
        );
        Ok(Self {
            source,
            config,
            snapshot,
            roster,
            latest_gameweek,
            cache: MetricCache::new(),
        })
    }

    pub fn league_id(&self) -> u32 {
        self.snapshot.league_id
    }

    pub fn league_name(&self) -> &str {
        league_name(&self.snapshot)
    }

    pub fn latest_gameweek(&self) -> u32 {
        self.latest_gameweek
    }

    pub fn snapshot(&self) -> &LeagueSnapshot {
        &self.snapshot
    }

    pub fn roster(&self) -> &ManagerRoster {
        &self.roster
    }

    pub fn cache(&self) -> &MetricCache {
        &self.cache
    }

    pub fn standings(&self) -> Vec<StandingsRow> {
        standings_table(&self.snapshot)
    }

    pub fn summary(&self) -> Option<SummaryExtremes> {
        summary_extremes(&self.standings())
    }

    fn cached<T, F>(&mut self, metric: Metric, build: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce(&Self) -> Result<T>,
    {
        let league_id = self.league_id();
        if let Some(hit) = self.cache.get::<T>(league_id, metric) {
            return Ok(hit);
        }
        let table = Arc::new(build(self)?);
        self.cache.insert(league_id, metric, Arc::clone(&table));
        Ok(table)
    }

    pub fn rankings(&mut self) -> Result<Arc<RosterJoin<RankingRow>>> {
        self.cached(Metric::Rankings, |s| {
            league_rankings(&s.source, &s.config, &s.roster, s.latest_gameweek)
        })
    }

    pub fn captain_picks(&mut self) -> Result<Arc<LeagueFetch<GameweekPick>>> {
        self.cached(Metric::Captains, |s| {
            league_captain_picks(&s.source, &s.config, &s.roster, s.latest_gameweek)
        })
    }

    pub fn history(&mut self) -> Result<Arc<LeagueFetch<GameweekHistoryEntry>>> {
        self.cached(Metric::History, |s| {
            Ok(league_history(&s.source, &s.config, &s.roster, s.latest_gameweek))
        })
    }

    pub fn chip_usage(&mut self) -> Result<Arc<LeagueFetch<ChipUsageEvent>>> {
        self.cached(Metric::Chips, |s| {
            Ok(league_chip_usage(&s.source, &s.config, &s.roster, s.latest_gameweek))
        })
    }

    pub fn points_progression(&mut self) -> Result<LeagueFetch<CumulativePoints>> {
        let history = self.history()?;
        let joined = points_progression(&history.rows, &self.roster);
        Ok(history.derive(joined.rows))
    }

    pub fn points_average(&mut self) -> Result<LeagueFetch<AveragePoints>> {
        let history = self.history()?;
        let joined = points_average(&history.rows, &self.roster, self.latest_gameweek);
        Ok(history.derive(joined.rows))
    }

    /// Overall-rank history limited to gameweeks `lo..=hi`.
    pub fn overall_rank_series(
        &mut self,
        lo: u32,
        hi: u32,
    ) -> Result<LeagueFetch<GameweekHistoryEntry>> {
        let history = self.history()?;
        Ok(history.derive(filter_gameweek_range(&history.rows, lo, hi)))
    }

    /// Drops every cached table and refetches the standings and the current
    /// gameweek, so a gameweek rollover is picked up.
    pub fn reset(&mut self) -> Result<()> {
        self.cache.clear();
        self.refresh(self.league_id())
    }

    /// Points the session at another league, refetching its snapshot and the
    /// current gameweek.
    pub fn switch_league(&mut self, league_id: u32) -> Result<()> {
        let previous = self.league_id();
        self.refresh(league_id)?;
        self.cache.invalidate(previous);
        Ok(())
    }

    fn refresh(&mut self, league_id: u32) -> Result<()> {
        let snapshot = fetch_league_snapshot(&self.source, league_id)?;
        let latest_gameweek = fetch_current_gameweek(&self.source)?;
        info!(league_id, latest_gameweek, "league session refreshed");
        self.roster = ManagerRoster::from_snapshot(&snapshot);
        self.snapshot = snapshot;
        self.latest_gameweek = latest_gameweek;
        Ok(())
    }
}
