//! Desired State - Was laut Cluster-Konfiguration existieren sollte
//!
//! Die DesiredMembership wird durch Flatten der zweistufigen
//! Konfigurationsstruktur (Rolle -> Listenname -> Node-Eintrag) berechnet.

use clusterup_cluster_config::{ClusterConfig, ClusterConfigError, DeclaredNode, Membership};

/// Die gewünschte Cluster-Membership, name-keyed.
#[derive(Debug, Clone, Default)]
pub struct DesiredMembership {
    pub nodes: Membership,
}

impl DesiredMembership {
    /// Flacht die Konfiguration zu einem name-keyed Mapping ab.
    ///
    /// Fehlende Node-Listen werden übersprungen (partielle Konfigurationen
    /// sind erlaubt). Bei doppelten Node-Namen gewinnt der letzte Eintrag;
    /// die BTreeMap-Reihenfolge von Rollen und Listen macht das Ergebnis
    /// deterministisch.
    pub fn from_config(config: &ClusterConfig) -> Result<Self, ClusterConfigError> {
        let mut nodes = Membership::new();

        for deployment in config.remote_deployment.values() {
            let list = match config.node_list(&deployment.listname)? {
                Some(list) => list,
                None => continue,
            };

            for entry in list.values() {
                let node = DeclaredNode::from_entry(entry, &deployment.listname);
                nodes.insert(node.name.clone(), node);
            }
        }

        Ok(Self { nodes })
    }

    pub fn get(&self, name: &str) -> Option<&DeclaredNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Alle Nodes in Namensreihenfolge.
    pub fn sorted_nodes(&self) -> Vec<&DeclaredNode> {
        self.nodes.values().collect()
    }
}
