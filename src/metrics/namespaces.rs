use crate::sink::{Metric, Observation};
use crate::types::NamespaceRecord;

use super::labels;

pub fn map_namespace(namespace: &NamespaceRecord) -> Vec<Observation> {
    let mut out = Vec::with_capacity(2);
    if let Some(created) = namespace.created {
        out.push(Observation::new(
            Metric::NamespaceCreated,
            labels([&namespace.name]),
            created,
        ));
    }
    out.push(Observation::flag(
        Metric::NamespaceStatusPhase,
        labels([&namespace.name, &namespace.phase]),
        namespace.phase == "Active",
    ));
    out
}
