// Per-kind mappers from normalised records to observations
pub mod pods;
pub mod deployments;
pub mod nodes;
pub mod cronjobs;
pub mod services;
pub mod namespaces;

pub use pods::map_pod;
pub use deployments::map_deployment;
pub use nodes::map_node;
pub use cronjobs::map_cronjob;
pub use services::map_service;
pub use namespaces::map_namespace;

/// Phases after which a pod never transitions again.
pub const TERMINAL_POD_PHASES: [&str; 2] = ["Succeeded", "Failed"];

pub(crate) fn labels<const N: usize>(values: [&str; N]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
