use crate::sink::{Metric, Observation};
use crate::types::ServiceRecord;

use super::labels;

pub fn map_service(service: &ServiceRecord) -> Vec<Observation> {
    vec![Observation::info(
        Metric::ServiceInfo,
        labels([&service.namespace, &service.name, &service.cluster_ip, &service.type_]),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_service() {
        let service = ServiceRecord {
            namespace: "default".to_string(),
            name: "kubernetes".to_string(),
            cluster_ip: "10.96.0.1".to_string(),
            type_: "ClusterIP".to_string(),
        };
        let obs = map_service(&service);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].labels, vec!["default", "kubernetes", "10.96.0.1", "ClusterIP"]);
        assert_eq!(obs[0].value, 1.0);
    }
}
