use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PARALLELISM: usize = 6;
const DEFAULT_SMALL_LEAGUE_MAX: usize = 10;
const DEFAULT_WILDCARD_CUTOFF: u32 = 21;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Worker threads in the fetch pool.
    pub parallelism: usize,
    /// Leagues with fewer managers than this fetch gameweeks in chunks.
    pub small_league_threshold: usize,
    /// First gameweek whose wildcard counts as the second one.
    pub wildcard_cutoff: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            parallelism: DEFAULT_PARALLELISM,
            small_league_threshold: DEFAULT_SMALL_LEAGUE_MAX,
            wildcard_cutoff: DEFAULT_WILDCARD_CUTOFF,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset or unparsable
    /// values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let base_url = lookup("FPL_API_BASE")
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.base_url);
        let timeout_secs = lookup("FPL_REQUEST_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);
        let parallelism = lookup("FETCH_PARALLELISM")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_PARALLELISM)
            .clamp(2, 32);
        let small_league_threshold = lookup("FPL_SMALL_LEAGUE_MAX")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_SMALL_LEAGUE_MAX);
        let wildcard_cutoff = lookup("FPL_WILDCARD_CUTOFF_GW")
            .and_then(|val| val.trim().parse::<u32>().ok())
            .filter(|gw| *gw >= 1)
            .unwrap_or(DEFAULT_WILDCARD_CUTOFF);

        Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            parallelism,
            small_league_threshold,
            wildcard_cutoff,
        }
    }
}
