//! Per-manager aggregators: one manager's full-season slice of a table.
//!
//! Any failed fetch aborts the whole slice; the error comes back tagged with
//! the manager id.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{FetchError, Result};
use crate::fetch_pool::{fetch_gameweeks, FetchStrategy};
use crate::fpl_api::{
    fetch_live_scores, fetch_manager_history, fetch_manager_picks, LiveScores, PlayerNames,
};
use crate::http_client::Transport;
use crate::model::{sort_by_key, Chip, ChipUsageEvent, GameweekHistoryEntry, GameweekPick};

/// Captain choice and captain score for every gameweek up to
/// `latest_gameweek`. `live` holds prefetched scoring; gameweeks missing
/// from it are fetched on demand.
pub fn manager_captain_picks<S: Transport>(
    source: &S,
    manager_id: u32,
    latest_gameweek: u32,
    strategy: FetchStrategy,
    players: &PlayerNames,
    live: &HashMap<u32, LiveScores>,
) -> Result<Vec<GameweekPick>> {
    let mut rows = fetch_gameweeks(strategy, latest_gameweek, |gameweek| {
        let picks = fetch_manager_picks(source, manager_id, gameweek)?;
        let player_id = picks.captain_id()?;
        let captain_score = match live.get(&gameweek) {
            Some(scores) => scores.score(player_id)?,
            None => fetch_live_scores(source, gameweek)?.score(player_id)?,
        };
        Ok(GameweekPick {
            manager_id,
            gameweek,
            player_id,
            player_name: players.name(player_id)?.to_string(),
            captain_score,
        })
    })
    .map_err(|err| FetchError::for_manager(manager_id, err))?;

    sort_by_key(&mut rows);
    debug!(manager_id, rows = rows.len(), "captain slice done");
    Ok(rows)
}

/// Points and overall rank per gameweek, from a single history call.
pub fn manager_history<S: Transport>(
    source: &S,
    manager_id: u32,
    latest_gameweek: u32,
) -> Result<Vec<GameweekHistoryEntry>> {
    let events = fetch_manager_history(source, manager_id)
        .map_err(|err| FetchError::for_manager(manager_id, err))?;

    let mut rows: Vec<GameweekHistoryEntry> = events
        .into_iter()
        .filter(|event| (1..=latest_gameweek).contains(&event.event))
        .map(|event| GameweekHistoryEntry {
            manager_id,
            gameweek: event.event,
            points: event.points,
            overall_rank: event.overall_rank,
        })
        .collect();
    sort_by_key(&mut rows);
    Ok(rows)
}

/// One event per gameweek in which the manager had a chip active.
pub fn manager_chip_usage<S: Transport>(
    source: &S,
    manager_id: u32,
    latest_gameweek: u32,
    strategy: FetchStrategy,
    wildcard_cutoff: u32,
) -> Result<Vec<ChipUsageEvent>> {
    let found = fetch_gameweeks(strategy, latest_gameweek, |gameweek| {
        let picks = fetch_manager_picks(source, manager_id, gameweek)?;
        let Some(code) = picks.active_chip.as_deref() else {
            return Ok(None);
        };
        let chip = Chip::from_code(code, gameweek, wildcard_cutoff)?;
        Ok(Some(ChipUsageEvent {
            manager_id,
            gameweek,
            chip,
            points: picks.entry_history.points,
        }))
    })
    .map_err(|err| FetchError::for_manager(manager_id, err))?;

    let mut rows: Vec<ChipUsageEvent> = found.into_iter().flatten().collect();
    sort_by_key(&mut rows);
    Ok(rows)
}

/// Season total after `gameweek` for each manager, in the order given.
pub fn gameweek_totals<S: Transport>(
    source: &S,
    manager_ids: &[u32],
    gameweek: u32,
) -> Result<Vec<(u32, i32)>> {
    manager_ids
        .iter()
        .map(|&manager_id| {
            fetch_manager_picks(source, manager_id, gameweek)
                .map(|picks| (manager_id, picks.entry_history.total_points))
                .map_err(|err| FetchError::for_manager(manager_id, err))
        })
        .collect()
}
