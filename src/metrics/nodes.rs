use crate::sink::{Metric, Observation};
use crate::types::NodeRecord;

use super::labels;

/// Info series plus one condition series per reported condition.
///
/// A condition is 1 only when its status is exactly `"True"`; `"False"`,
/// `"Unknown"` and any other spelling map to 0. The status string is kept
/// as a label so each tri-state value stays visible.
pub fn map_node(node: &NodeRecord) -> Vec<Observation> {
    let mut out = Vec::with_capacity(1 + node.conditions.len());
    out.push(Observation::info(
        Metric::NodeInfo,
        labels([
            &node.name,
            &node.kernel_version,
            &node.os_image,
            &node.container_runtime_version,
        ]),
    ));

    for condition in &node.conditions {
        out.push(Observation::flag(
            Metric::NodeStatusCondition,
            labels([&node.name, &condition.type_, &condition.status]),
            condition.status == "True",
        ));
    }
    out
}
