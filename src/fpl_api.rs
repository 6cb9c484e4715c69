//! Remote fetch primitives. Each one issues a single GET and parses one JSON
//! shape; parsing lives in the `parse_*_json` functions so it can be checked
//! against fixtures without a network.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::error::{FetchError, Result, TransportError};
use crate::http_client::Transport;
use crate::model::{LeagueSnapshot, ManagerSummary};

#[derive(Debug, Deserialize)]
struct StandingsResponse {
    league: LeagueInfo,
    #[serde(default)]
    standings: Standings,
}

#[derive(Debug, Deserialize)]
struct LeagueInfo {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Standings {
    #[serde(default)]
    results: Vec<StandingsEntry>,
}

#[derive(Debug, Deserialize)]
struct StandingsEntry {
    entry: u32,
    player_name: String,
    entry_name: String,
    total: i32,
    event_total: i32,
    rank: u32,
}

#[derive(Debug, Deserialize)]
struct BootstrapEvents {
    events: Vec<EventInfo>,
}

#[derive(Debug, Deserialize)]
struct EventInfo {
    id: u32,
    #[serde(default)]
    is_current: bool,
}

#[derive(Debug, Deserialize)]
struct BootstrapElements {
    elements: Vec<ElementInfo>,
}

#[derive(Debug, Deserialize)]
struct ElementInfo {
    id: u32,
    web_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pick {
    pub element: u32,
    #[serde(default)]
    pub is_captain: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EntryHistory {
    /// Score for this gameweek.
    pub points: i32,
    /// Season total after this gameweek.
    pub total_points: i32,
}

/// One manager's team sheet for one gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameweekPicks {
    #[serde(default)]
    pub active_chip: Option<String>,
    pub entry_history: EntryHistory,
    pub picks: Vec<Pick>,
}

impl GameweekPicks {
    pub fn captain_id(&self) -> Result<u32> {
        self.picks
            .iter()
            .find(|pick| pick.is_captain)
            .map(|pick| pick.element)
            .ok_or_else(|| FetchError::parse("picks", "no pick flagged as captain"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEvent {
    pub event: u32,
    pub points: i32,
    pub total_points: i32,
    pub overall_rank: u32,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    current: Vec<HistoryEvent>,
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    elements: Vec<LiveElement>,
}

#[derive(Debug, Deserialize)]
struct LiveElement {
    id: u32,
    stats: LiveStats,
}

#[derive(Debug, Deserialize)]
struct LiveStats {
    total_points: i32,
}

/// Player id to display name, from the bootstrap data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerNames {
    names: HashMap<u32, String>,
}

impl PlayerNames {
    pub fn name(&self, player_id: u32) -> Result<&str> {
        self.names
            .get(&player_id)
            .map(String::as_str)
            .ok_or(FetchError::MissingPlayer {
                player_id,
                source_name: "player roster",
            })
    }
}

/// Every player's score in one gameweek.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveScores {
    pub gameweek: u32,
    points: HashMap<u32, i32>,
}

impl LiveScores {
    pub fn score(&self, player_id: u32) -> Result<i32> {
        self.points
            .get(&player_id)
            .copied()
            .ok_or(FetchError::MissingPlayer {
                player_id,
                source_name: "live scoring",
            })
    }
}

pub fn fetch_league_snapshot(source: &impl Transport, league_id: u32) -> Result<LeagueSnapshot> {
    let body = source
        .get(&format!("/leagues-classic/{league_id}/standings/"))
        .map_err(|err| FetchError::not_found(format!("league {league_id}"), err))?;
    parse_league_snapshot_json(league_id, &body)
}

pub fn parse_league_snapshot_json(league_id: u32, raw: &str) -> Result<LeagueSnapshot> {
    let parsed: StandingsResponse =
        serde_json::from_str(raw.trim()).map_err(|err| FetchError::parse("standings", err))?;
    let managers = parsed
        .standings
        .results
        .into_iter()
        .map(|row| ManagerSummary {
            manager_id: row.entry,
            player_name: row.player_name,
            team_name: row.entry_name,
            total_points: row.total,
            latest_points: row.event_total,
            rank: row.rank,
        })
        .collect();
    Ok(LeagueSnapshot {
        league_id,
        name: parsed.league.name,
        managers,
    })
}

/// The league name is passed through from the snapshot untouched.
pub fn league_name(snapshot: &LeagueSnapshot) -> &str {
    &snapshot.name
}

pub fn fetch_current_gameweek(source: &impl Transport) -> Result<u32> {
    let body = get_data(source, "/bootstrap-static/", "bootstrap")?;
    parse_current_gameweek_json(&body)
}

pub fn parse_current_gameweek_json(raw: &str) -> Result<u32> {
    let parsed: BootstrapEvents =
        serde_json::from_str(raw.trim()).map_err(|err| FetchError::parse("bootstrap", err))?;
    parsed
        .events
        .iter()
        .find(|event| event.is_current)
        .map(|event| event.id)
        .ok_or(FetchError::StateUnavailable)
}

pub fn fetch_player_names(source: &impl Transport) -> Result<PlayerNames> {
    let body = get_data(source, "/bootstrap-static/", "bootstrap")?;
    parse_player_names_json(&body)
}

pub fn parse_player_names_json(raw: &str) -> Result<PlayerNames> {
    let parsed: BootstrapElements =
        serde_json::from_str(raw.trim()).map_err(|err| FetchError::parse("bootstrap", err))?;
    Ok(PlayerNames {
        names: parsed
            .elements
            .into_iter()
            .map(|el| (el.id, el.web_name))
            .collect(),
    })
}

pub fn fetch_manager_picks(
    source: &impl Transport,
    manager_id: u32,
    gameweek: u32,
) -> Result<GameweekPicks> {
    let body = get_data(
        source,
        &format!("/entry/{manager_id}/event/{gameweek}/picks/"),
        &format!("picks for manager {manager_id} gameweek {gameweek}"),
    )?;
    parse_picks_json(&body)
}

pub fn parse_picks_json(raw: &str) -> Result<GameweekPicks> {
    serde_json::from_str(raw.trim()).map_err(|err| FetchError::parse("picks", err))
}

pub fn fetch_manager_history(source: &impl Transport, manager_id: u32) -> Result<Vec<HistoryEvent>> {
    let body = source
        .get(&format!("/entry/{manager_id}/history/"))
        .map_err(|err| FetchError::not_found(format!("manager {manager_id}"), err))?;
    parse_history_json(&body)
}

pub fn parse_history_json(raw: &str) -> Result<Vec<HistoryEvent>> {
    let parsed: HistoryResponse =
        serde_json::from_str(raw.trim()).map_err(|err| FetchError::parse("history", err))?;
    Ok(parsed.current)
}

pub fn fetch_live_scores(source: &impl Transport, gameweek: u32) -> Result<LiveScores> {
    let body = get_data(
        source,
        &format!("/event/{gameweek}/live/"),
        &format!("live scoring for gameweek {gameweek}"),
    )?;
    parse_live_json(gameweek, &body)
}

pub fn parse_live_json(gameweek: u32, raw: &str) -> Result<LiveScores> {
    let parsed: LiveResponse =
        serde_json::from_str(raw.trim()).map_err(|err| FetchError::parse("live", err))?;
    Ok(LiveScores {
        gameweek,
        points: parsed
            .elements
            .into_iter()
            .map(|el| (el.id, el.stats.total_points))
            .collect(),
    })
}

fn get_data(source: &impl Transport, path: &str, what: &str) -> Result<String> {
    source.get(path).map_err(|err: TransportError| {
        debug!(path, %err, "data endpoint failed");
        FetchError::unavailable(what, err)
    })
}
