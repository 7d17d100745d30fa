//! Reconcile Module - Plan-Berechnung
//!
//! Die compute_*-Funktionen sind **pure functions**:
//! - Keine Side Effects
//! - Deterministisch (alle Eingaben sind namenssortierte Mappings)
//! - Perfekt testbar ohne Mocks
//!
//! Einzig `assess_health` spricht mit der Außenwelt (der Health-Probe);
//! ihr Ergebnis fließt als Wert in die Plan-Berechnung ein.

mod actions;

pub use actions::{NodeAction, ReconciliationPlan};

use std::collections::BTreeSet;

use clusterup_cluster_config::{DeclaredNode, Membership};

use crate::probe::HealthProbe;
use crate::state::{DesiredMembership, ObservedCluster};

/// Das Ergebnis der Health-Bewertung aller deklarierten Nodes.
#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    healthy: BTreeSet<String>,
}

impl HealthReport {
    pub fn is_healthy(&self, name: &str) -> bool {
        self.healthy.contains(name)
    }

    pub fn healthy_count(&self) -> usize {
        self.healthy.len()
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn from_names<I: IntoIterator<Item = String>>(names: I) -> Self {
        Self {
            healthy: names.into_iter().collect(),
        }
    }
}

/// Bewertet die Health aller deklarierten Nodes.
///
/// Ein Node ist healthy wenn er von der API als Ready gemeldet wird UND
/// die direkte Probe gegen seine Adresse erfolgreich ist. Die API-Meldung
/// allein reicht nicht - sie kann einem tatsächlich ausgefallenen Node
/// hinterherhängen. Die Probe wird nur für API-ready Nodes versucht;
/// jeder Probe-Fehlschlag gilt als "unhealthy", nie als Fehler.
pub async fn assess_health<H: HealthProbe + ?Sized>(
    desired: &DesiredMembership,
    observed: &ObservedCluster,
    probe: &H,
) -> HealthReport {
    let mut healthy = BTreeSet::new();

    for node in desired.sorted_nodes() {
        if !observed.is_ready(&node.name) {
            continue;
        }
        if probe.check(&node.address).await {
            healthy.insert(node.name.clone());
        }
    }

    HealthReport { healthy }
}

/// Deklarierte Nodes die fehlen oder unhealthy sind.
pub fn compute_add_set(desired: &DesiredMembership, health: &HealthReport) -> Vec<DeclaredNode> {
    desired
        .sorted_nodes()
        .into_iter()
        .filter(|node| !health.is_healthy(&node.name))
        .cloned()
        .collect()
}

/// Persistierte Nodes die nicht mehr deklariert sind.
///
/// Bewusst gegen die *persistierte* Membership berechnet, nicht gegen die
/// beobachtete: entfernt wird was ein früherer Lauf aufgesetzt hat und
/// jetzt aus der Konfiguration verschwunden ist.
pub fn compute_remove_set(persisted: &Membership, desired: &DesiredMembership) -> Vec<DeclaredNode> {
    persisted
        .values()
        .filter(|node| !desired.contains(&node.name))
        .cloned()
        .collect()
}

/// Berechnet den vollständigen Plan.
pub fn compute_plan(
    desired: &DesiredMembership,
    health: &HealthReport,
    persisted: &Membership,
) -> ReconciliationPlan {
    ReconciliationPlan {
        to_add: compute_add_set(desired, health),
        to_remove: compute_remove_set(persisted, desired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clusterup_cluster_config::NodeRole;

    fn make_node(name: &str, address: &str) -> DeclaredNode {
        DeclaredNode {
            name: name.to_string(),
            address: address.to_string(),
            role: NodeRole::Worker,
            list_name: "workerlist".to_string(),
        }
    }

    fn desired_of(nodes: &[DeclaredNode]) -> DesiredMembership {
        DesiredMembership {
            nodes: nodes
                .iter()
                .map(|n| (n.name.clone(), n.clone()))
                .collect(),
        }
    }

    fn membership_of(nodes: &[DeclaredNode]) -> Membership {
        nodes.iter().map(|n| (n.name.clone(), n.clone())).collect()
    }

    // ========================================================================
    // Tests: compute_add_set
    // ========================================================================

    #[test]
    fn test_add_set_contains_unhealthy_nodes() {
        let a = make_node("a", "10.0.0.1");
        let b = make_node("b", "10.0.0.2");
        let desired = desired_of(&[a.clone(), b.clone()]);

        let health = HealthReport::from_names(vec!["a".to_string()]);

        let add = compute_add_set(&desired, &health);
        assert_eq!(add, vec![b]);
    }

    #[test]
    fn test_add_set_empty_when_all_healthy() {
        let a = make_node("a", "10.0.0.1");
        let desired = desired_of(&[a]);
        let health = HealthReport::from_names(vec!["a".to_string()]);

        assert!(compute_add_set(&desired, &health).is_empty());
    }

    #[test]
    fn test_add_set_is_name_sorted() {
        let desired = desired_of(&[
            make_node("c", "10.0.0.3"),
            make_node("a", "10.0.0.1"),
            make_node("b", "10.0.0.2"),
        ]);
        let health = HealthReport::default();

        let names: Vec<_> = compute_add_set(&desired, &health)
            .iter()
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    // ========================================================================
    // Tests: compute_remove_set
    // ========================================================================

    #[test]
    fn test_remove_set_contains_undeclared_persisted_nodes() {
        let a = make_node("a", "10.0.0.1");
        let b = make_node("b", "10.0.0.2");
        let persisted = membership_of(&[a.clone(), b.clone()]);
        let desired = desired_of(&[a]);

        let remove = compute_remove_set(&persisted, &desired);
        assert_eq!(remove, vec![b]);
    }

    #[test]
    fn test_remove_set_empty_when_persisted_subset_of_declared() {
        let a = make_node("a", "10.0.0.1");
        let persisted = membership_of(&[a.clone()]);
        let desired = desired_of(&[a, make_node("b", "10.0.0.2")]);

        assert!(compute_remove_set(&persisted, &desired).is_empty());
    }

    #[test]
    fn test_remove_set_keyed_by_name_only() {
        // Ein Node dessen Adresse oder Rolle sich geändert hat wird NICHT
        // entfernt - verglichen wird ausschließlich über den Namen.
        let old = make_node("a", "10.0.0.1");
        let mut new = make_node("a", "10.0.0.99");
        new.role = NodeRole::ControlPlane;

        let persisted = membership_of(&[old]);
        let desired = desired_of(&[new]);

        assert!(compute_remove_set(&persisted, &desired).is_empty());
    }

    // ========================================================================
    // Tests: compute_plan
    // ========================================================================

    #[test]
    fn test_plan_sets_are_independent() {
        // "b" ist deklariert aber unhealthy -> to_add.
        // "z" ist persistiert aber nicht mehr deklariert -> to_remove.
        // Beide Mengen sind im selben Lauf nicht-leer.
        let a = make_node("a", "10.0.0.1");
        let b = make_node("b", "10.0.0.2");
        let z = make_node("z", "10.0.0.9");

        let desired = desired_of(&[a.clone(), b.clone()]);
        let persisted = membership_of(&[a, z.clone()]);
        let health = HealthReport::from_names(vec!["a".to_string()]);

        let plan = compute_plan(&desired, &health, &persisted);

        assert_eq!(plan.to_add, vec![b]);
        assert_eq!(plan.to_remove, vec![z]);
    }

    #[test]
    fn test_plan_idempotent_when_converged() {
        let a = make_node("a", "10.0.0.1");
        let desired = desired_of(&[a.clone()]);
        let persisted = membership_of(&[a]);
        let health = HealthReport::from_names(vec!["a".to_string()]);

        let plan = compute_plan(&desired, &health, &persisted);
        assert!(plan.is_empty());
    }
}
