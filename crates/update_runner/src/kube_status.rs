use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct KubeNodeList {
    #[serde(default)]
    pub items: Vec<KubeNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KubeNode {
    pub metadata: KubeMetadata,
    #[serde(default)]
    pub status: KubeNodeStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KubeMetadata {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KubeNodeStatus {
    #[serde(default)]
    pub conditions: Vec<KubeCondition>,
    #[serde(default)]
    pub addresses: Vec<KubeAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KubeCondition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KubeAddress {
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
}

impl KubeNode {
    pub fn internal_ip(&self) -> Option<&str> {
        self.status
            .addresses
            .iter()
            .find(|a| a.kind == "InternalIP")
            .map(|a| a.address.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KubeConfigMap {
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}
