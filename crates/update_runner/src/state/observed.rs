//! Observed State - Was die Kubernetes-API tatsächlich meldet
//!
//! Der ObservedCluster wird einmal pro Lauf durch Abfrage des Backends
//! ermittelt und danach nicht mehr neu gelesen.

use std::collections::BTreeMap;

use crate::kube_status::KubeNode;

/// Der beobachtete Zustand aller registrierten Nodes.
#[derive(Debug, Clone, Default)]
pub struct ObservedCluster {
    /// Alle von der API gemeldeten Nodes, name-keyed
    pub nodes: BTreeMap<String, ObservedNode>,
}

impl ObservedCluster {
    /// Erstellt einen ObservedCluster aus einer Liste von Nodes.
    pub fn from_nodes(nodes: Vec<ObservedNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.name.clone(), n)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ObservedNode> {
        self.nodes.get(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Prüft ob der Node mit dem Namen registriert und API-seitig ready ist.
    ///
    /// Ein nicht registrierter Node ist nie ready.
    pub fn is_ready(&self, name: &str) -> bool {
        self.get(name).map(ObservedNode::is_ready).unwrap_or(false)
    }
}

/// Ein von der Kubernetes-API gemeldeter Node.
#[derive(Debug, Clone)]
pub struct ObservedNode {
    pub name: String,
    /// InternalIP, falls die API eine meldet
    pub address: Option<String>,
    /// Status-Conditions in API-Reihenfolge
    pub conditions: Vec<NodeCondition>,
}

impl ObservedNode {
    /// API-seitige Readiness: die erste Condition vom Typ "Ready"
    /// entscheidet. Fehlt eine Ready-Condition, ist der Node nicht ready.
    pub fn is_ready(&self) -> bool {
        for condition in &self.conditions {
            if condition.kind != "Ready" {
                continue;
            }
            return condition.status == "True";
        }
        false
    }
}

impl From<KubeNode> for ObservedNode {
    fn from(node: KubeNode) -> Self {
        let address = node.internal_ip().map(str::to_string);
        Self {
            name: node.metadata.name,
            address,
            conditions: node
                .status
                .conditions
                .into_iter()
                .map(|c| NodeCondition {
                    kind: c.kind,
                    status: c.status,
                })
                .collect(),
        }
    }
}

/// Eine einzelne Status-Condition eines Nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCondition {
    pub kind: String,
    pub status: String,
}
