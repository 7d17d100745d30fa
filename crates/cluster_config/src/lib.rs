use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterConfigError {
    #[error("Failed to read cluster configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse cluster configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Rolle eines Nodes im Cluster.
///
/// Ältere Konfigurationen schreiben `master` statt `control-plane`,
/// beide Schreibweisen werden akzeptiert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeRole {
    #[serde(alias = "master")]
    ControlPlane,
    Worker,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ControlPlane => "control-plane",
            Self::Worker => "worker",
        }
    }
}

/// Ein Node-Eintrag wie er in einer Node-Liste der Konfiguration steht.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    pub nodename: String,
    pub hostip: String,
    #[serde(rename = "k8s-role")]
    pub role: NodeRole,
}

/// Deployment-Abschnitt pro Rolle: verweist auf den Namen der Node-Liste.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDeployment {
    pub listname: String,
}

/// Eine Node-Liste: Mapping von Konfigurations-Key auf Node-Eintrag.
pub type NodeList = BTreeMap<String, NodeEntry>;

/// Die deklarierte Cluster-Konfiguration.
///
/// Die Struktur ist zweistufig indirekt: `remote_deployment.<rolle>.listname`
/// benennt einen Top-Level-Abschnitt, der die eigentlichen Node-Einträge
/// enthält. Abschnitte die keine Node-Listen sind bleiben unangetastet.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub remote_deployment: BTreeMap<String, RoleDeployment>,

    #[serde(flatten)]
    sections: BTreeMap<String, serde_yaml::Value>,
}

impl ClusterConfig {
    pub fn load(path: &Path) -> Result<Self, ClusterConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ClusterConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Liefert die Node-Liste mit dem angegebenen Namen.
    ///
    /// `Ok(None)` wenn der Abschnitt fehlt (partielle Konfigurationen sind
    /// erlaubt), Fehler nur wenn der Abschnitt existiert aber keine
    /// Node-Liste ist.
    pub fn node_list(&self, name: &str) -> Result<Option<NodeList>, ClusterConfigError> {
        match self.sections.get(name) {
            None => Ok(None),
            Some(value) => Ok(Some(serde_yaml::from_value(value.clone())?)),
        }
    }
}

/// Ein deklarierter Node, normalisiert aus der Konfiguration.
///
/// Identität ist der Name. Das ist auch der Werttyp des persistierten
/// Membership-Records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredNode {
    pub name: String,
    pub address: String,
    pub role: NodeRole,
    #[serde(rename = "list")]
    pub list_name: String,
}

impl DeclaredNode {
    pub fn from_entry(entry: &NodeEntry, list_name: &str) -> Self {
        Self {
            name: entry.nodename.clone(),
            address: entry.hostip.clone(),
            role: entry.role,
            list_name: list_name.to_string(),
        }
    }

    pub fn is_control_plane(&self) -> bool {
        self.role == NodeRole::ControlPlane
    }
}

/// Name-keyed Membership-Mapping.
pub type Membership = BTreeMap<String, DeclaredNode>;
