use crate::sink::{Metric, Observation};
use crate::types::DeploymentRecord;

use super::labels;

pub fn map_deployment(deployment: &DeploymentRecord) -> Vec<Observation> {
    let key = labels([&deployment.namespace, &deployment.name]);
    vec![
        Observation::new(
            Metric::DeploymentSpecReplicas,
            key.clone(),
            deployment.spec_replicas as f64,
        ),
        Observation::new(
            Metric::DeploymentStatusReplicas,
            key.clone(),
            deployment.replicas as f64,
        ),
        Observation::new(
            Metric::DeploymentStatusReplicasAvailable,
            key,
            deployment.available_replicas as f64,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_deployment() {
        let deployment = DeploymentRecord {
            namespace: "shop".to_string(),
            name: "api".to_string(),
            spec_replicas: 3,
            replicas: 3,
            available_replicas: 0,
        };
        let obs = map_deployment(&deployment);
        assert_eq!(obs.len(), 3);
        assert!(obs.iter().all(|o| o.labels == vec!["shop", "api"]));
        assert_eq!(obs[0].metric, Metric::DeploymentSpecReplicas);
        assert_eq!(obs[0].value, 3.0);
        assert_eq!(obs[1].value, 3.0);
        assert_eq!(obs[2].metric, Metric::DeploymentStatusReplicasAvailable);
        assert_eq!(obs[2].value, 0.0);
    }
}
