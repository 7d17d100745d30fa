//! Tests für Health-Bewertung und Plan-Berechnung

use clusterup_cluster_config::Membership;
use clusterup_update_runner::reconcile::{assess_health, compute_plan};
use clusterup_update_runner::state::{DesiredMembership, ObservedCluster};
use clusterup_update_runner::test_utils::{make_observed, make_worker, MockProbe};

fn desired_of(nodes: &[(&str, &str)]) -> DesiredMembership {
    DesiredMembership {
        nodes: nodes
            .iter()
            .map(|(name, ip)| (name.to_string(), make_worker(name, ip)))
            .collect(),
    }
}

#[tokio::test]
async fn test_health_requires_api_and_probe() {
    let desired = desired_of(&[
        ("ready-and-probed", "10.0.0.1"),
        ("ready-only", "10.0.0.2"),
        ("probed-only", "10.0.0.3"),
    ]);

    let observed = ObservedCluster::from_nodes(vec![
        make_observed("ready-and-probed", "10.0.0.1", true),
        make_observed("ready-only", "10.0.0.2", true),
        make_observed("probed-only", "10.0.0.3", false),
    ]);

    let probe = MockProbe::new()
        .healthy_address("10.0.0.1")
        .healthy_address("10.0.0.3");

    let health = assess_health(&desired, &observed, &probe).await;

    assert!(health.is_healthy("ready-and-probed"));
    assert!(!health.is_healthy("ready-only"));
    assert!(!health.is_healthy("probed-only"));
    assert_eq!(health.healthy_count(), 1);
}

#[tokio::test]
async fn test_probe_skipped_for_unregistered_nodes() {
    let desired = desired_of(&[("missing", "10.0.0.9")]);
    let observed = ObservedCluster::default();
    let probe = MockProbe::new().healthy_address("10.0.0.9");

    let health = assess_health(&desired, &observed, &probe).await;

    assert!(!health.is_healthy("missing"));
    assert!(probe.probed().is_empty());
}

#[tokio::test]
async fn test_probes_run_in_name_order() {
    let desired = desired_of(&[
        ("c-node", "10.0.0.3"),
        ("a-node", "10.0.0.1"),
        ("b-node", "10.0.0.2"),
    ]);

    let observed = ObservedCluster::from_nodes(vec![
        make_observed("a-node", "10.0.0.1", true),
        make_observed("b-node", "10.0.0.2", true),
        make_observed("c-node", "10.0.0.3", true),
    ]);

    let probe = MockProbe::new();
    assess_health(&desired, &observed, &probe).await;

    assert_eq!(
        probe.probed(),
        vec![
            "10.0.0.1".to_string(),
            "10.0.0.2".to_string(),
            "10.0.0.3".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_plan_from_assessed_health() {
    let desired = desired_of(&[("healthy", "10.0.0.1"), ("broken", "10.0.0.2")]);

    let observed = ObservedCluster::from_nodes(vec![
        make_observed("healthy", "10.0.0.1", true),
        make_observed("broken", "10.0.0.2", true),
    ]);

    let probe = MockProbe::new().healthy_address("10.0.0.1");
    let health = assess_health(&desired, &observed, &probe).await;

    let mut persisted = Membership::new();
    persisted.insert("healthy".to_string(), make_worker("healthy", "10.0.0.1"));
    persisted.insert("stale".to_string(), make_worker("stale", "10.0.0.9"));

    let plan = compute_plan(&desired, &health, &persisted);

    let add_names: Vec<_> = plan.to_add.iter().map(|n| n.name.as_str()).collect();
    let remove_names: Vec<_> = plan.to_remove.iter().map(|n| n.name.as_str()).collect();

    assert_eq!(add_names, vec!["broken"]);
    assert_eq!(remove_names, vec!["stale"]);
}
