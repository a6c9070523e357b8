use crate::sink::{Metric, Observation};
use crate::types::PodRecord;

use super::{labels, TERMINAL_POD_PHASES};

/// Maps one pod to its info, phase, timestamp, label and container series.
pub fn map_pod(pod: &PodRecord) -> Vec<Observation> {
    let ns = pod.namespace.as_str();
    let name = pod.name.as_str();
    let mut out = Vec::with_capacity(6 + 2 * pod.containers.len());

    out.push(Observation::info(
        Metric::PodInfo,
        labels([ns, name, &pod.node, &pod.pod_ip, &pod.uid]),
    ));

    if let Some(start) = pod.start_time {
        out.push(Observation::new(Metric::PodStartTime, labels([ns, name]), start));
    }
    if let Some(created) = pod.created {
        out.push(Observation::new(Metric::PodCreated, labels([ns, name]), created));
    }
    if let Some(completed) = completion_time(pod) {
        out.push(Observation::new(Metric::PodCompletionTime, labels([ns, name]), completed));
    }

    // Only the current phase gets a series
    out.push(Observation::info(Metric::PodStatusPhase, labels([ns, name, &pod.phase])));
    out.push(Observation::info(Metric::PodLabels, labels([ns, name, &pod.app_label])));

    for container in &pod.containers {
        let key = labels([ns, name, &container.name]);
        out.push(Observation::flag(
            Metric::PodContainerStatusReady,
            key.clone(),
            container.ready,
        ));
        out.push(Observation::new(
            Metric::PodContainerStatusRestarts,
            key,
            container.restart_count as f64,
        ));
    }

    out
}

fn completion_time(pod: &PodRecord) -> Option<f64> {
    if TERMINAL_POD_PHASES.contains(&pod.phase.as_str()) {
        pod.ready_transition
    } else {
        None
    }
}
