// Public modules
pub mod types;
pub mod config;
pub mod errors;
pub mod parsing;
pub mod normalize;
pub mod kubernetes;
pub mod metrics;
pub mod sink;
pub mod collector;
pub mod server;

// Re-export commonly used items
pub use types::*;
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use errors::CollectError;
pub use parsing::{approximate_next_schedule, parse_minute_step};
pub use kubernetes::{KubeSource, SnapshotSource};
pub use metrics::*;
pub use sink::{Metric, MetricSink, Observation};
pub use collector::{map_raw, CycleState, MetricsCollector, PassReport};
