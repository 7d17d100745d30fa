//! State Module - Datenstrukturen für die Reconciliation
//!
//! - **DesiredMembership**: Was laut Cluster-Konfiguration existieren sollte
//! - **ObservedCluster**: Was die Kubernetes-API tatsächlich meldet

mod desired;
mod observed;

pub use desired::DesiredMembership;
pub use observed::{NodeCondition, ObservedCluster, ObservedNode};
