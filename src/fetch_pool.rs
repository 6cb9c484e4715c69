//! Bounded worker pool and the gameweek fan-out strategies.
//!
//! Work units are blocking fetches. A batch is scatter-gather: every unit is
//! submitted, the caller blocks until all complete, and the first error wins.
//! Results are tagged with their key; callers sort by key rather than rely on
//! completion order.

use std::ops::RangeInclusive;

use rayon::prelude::*;
use tracing::warn;

use crate::error::Result;

/// Gameweeks covered by one chunk.
const GAMEWEEKS_PER_CHUNK: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Every gameweek fetched one after another on the calling worker.
    Sequential,
    /// Gameweeks split into contiguous chunks fetched in parallel.
    Chunked { chunks: usize },
}

impl FetchStrategy {
    /// Small leagues chunk each manager's gameweeks; bigger ones keep each
    /// manager sequential so total concurrency stays at the pool size.
    pub fn for_league(managers: usize, latest_gameweek: u32, small_league_threshold: usize) -> Self {
        if managers < small_league_threshold {
            FetchStrategy::Chunked {
                chunks: (latest_gameweek / GAMEWEEKS_PER_CHUNK) as usize + 1,
            }
        } else {
            FetchStrategy::Sequential
        }
    }
}

/// Splits `1..=latest_gameweek` into at most `chunks` contiguous, non-empty
/// ranges whose sizes differ by at most one.
pub fn gameweek_chunks(latest_gameweek: u32, chunks: usize) -> Vec<RangeInclusive<u32>> {
    if latest_gameweek == 0 {
        return Vec::new();
    }
    let chunks = (chunks.max(1) as u32).min(latest_gameweek);
    let base = latest_gameweek / chunks;
    let extra = latest_gameweek % chunks;

    let mut out = Vec::with_capacity(chunks as usize);
    let mut start = 1;
    for idx in 0..chunks {
        let len = base + u32::from(idx < extra);
        out.push(start..=start + len - 1);
        start += len;
    }
    out
}

/// Runs `action` inside a pool of `threads` workers, falling back to the
/// global pool if one cannot be built.
pub fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(err) => {
            warn!(%err, "fetch pool build failed, using global pool");
            action()
        }
    }
}

/// Fetches one value per gameweek in `1..=latest_gameweek`.
pub fn fetch_gameweeks<T, F>(strategy: FetchStrategy, latest_gameweek: u32, fetch: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(u32) -> Result<T> + Sync,
{
    match strategy {
        FetchStrategy::Sequential => (1..=latest_gameweek).map(&fetch).collect(),
        FetchStrategy::Chunked { chunks } => {
            let parts: Vec<Vec<T>> = gameweek_chunks(latest_gameweek, chunks)
                .into_par_iter()
                .map(|range| range.map(&fetch).collect::<Result<Vec<T>>>())
                .collect::<Result<Vec<Vec<T>>>>()?;
            Ok(parts.into_iter().flatten().collect())
        }
    }
}

/// Scatter-gather over `keys`: each result is tagged with its key.
pub fn gather<K, T, F>(keys: &[K], fetch: F) -> Result<Vec<(K, T)>>
where
    K: Copy + Send + Sync,
    T: Send,
    F: Fn(K) -> Result<T> + Sync,
{
    keys.par_iter()
        .map(|key| fetch(*key).map(|value| (*key, value)))
        .collect()
}

/// Like [`gather`] but keeps going past failures, returning both sides.
pub fn gather_settled<K, T, E, F>(keys: &[K], fetch: F) -> (Vec<(K, T)>, Vec<(K, E)>)
where
    K: Copy + Send + Sync,
    T: Send,
    E: Send,
    F: Fn(K) -> std::result::Result<T, E> + Sync,
{
    let settled: Vec<(K, std::result::Result<T, E>)> =
        keys.par_iter().map(|key| (*key, fetch(*key))).collect();

    let mut ok = Vec::new();
    let mut failed = Vec::new();
    for (key, res) in settled {
        match res {
            Ok(value) => ok.push((key, value)),
            Err(err) => failed.push((key, err)),
        }
    }
    (ok, failed)
}
