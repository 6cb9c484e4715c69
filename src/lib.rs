pub mod config;
pub mod error;
pub mod fetch_pool;
pub mod fpl_api;
pub mod http_client;
pub mod league_fetch;
pub mod manager_fetch;
pub mod model;
pub mod session;
pub mod transforms;

pub use config::PipelineConfig;
pub use error::{FetchError, Result, TransportError};
pub use http_client::{HttpTransport, Transport};
pub use session::{LeagueSession, Metric, MetricCache};
