//! Actions - Ausgabe der Plan-Berechnung
//!
//! Der Plan beschreibt was der Coordinator tun soll, ohne selbst
//! Side Effects zu haben.

use clusterup_cluster_config::DeclaredNode;

/// Der berechnete Reconciliation-Plan.
///
/// `to_add` ist gegen die deklarierte Membership berechnet, `to_remove`
/// gegen die persistierte - die beiden Mengen sind unabhängig und können
/// im selben Lauf beide nicht-leer sein.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationPlan {
    /// Deklarierte Nodes die (neu) aufgesetzt werden müssen, namenssortiert
    pub to_add: Vec<DeclaredNode>,
    /// Persistierte Nodes die nicht mehr deklariert sind, namenssortiert
    pub to_remove: Vec<DeclaredNode>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Die auszuführenden Aktionen: erst alle Adds, dann alle Removes,
    /// jeweils in Namensreihenfolge.
    pub fn actions(&self) -> Vec<NodeAction> {
        self.to_add
            .iter()
            .cloned()
            .map(NodeAction::Add)
            .chain(self.to_remove.iter().cloned().map(NodeAction::Remove))
            .collect()
    }
}

/// Eine einzelne Node-Operation des Plans.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAction {
    /// Node aufsetzen: defensives Teardown, dann Install
    Add(DeclaredNode),
    /// Node abbauen: Teardown
    Remove(DeclaredNode),
}

impl NodeAction {
    pub fn node(&self) -> &DeclaredNode {
        match self {
            Self::Add(node) | Self::Remove(node) => node,
        }
    }
}
