//! Update Runner - Reconciliation der Cluster-Membership
//!
//! Gleicht die deklarierte Maschinenliste der Cluster-Konfiguration mit dem
//! tatsächlich registrierten Zustand ab: fehlende oder unhealthy deklarierte
//! Nodes werden (neu) aufgesetzt, nicht mehr deklarierte Nodes abgebaut,
//! danach wird der Membership-Record überschrieben. Ein Lauf pro Aufruf,
//! kein Daemon.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use clusterup_cluster_config::{ClusterConfig, ClusterConfigError, DeclaredNode, Membership};

pub mod bootstrap;
pub mod clock;
pub mod confirm;
pub mod coordinator;
pub mod kube_status;
pub mod probe;
pub mod reconcile;
pub mod state;
pub mod ui;

use bootstrap::{resolve_bootstrap, BootstrapDecision};
use clock::Clock;
use confirm::Confirmer;
use coordinator::execute_plan;
use kube_status::{KubeConfigMap, KubeNodeList};
use probe::HealthProbe;
use reconcile::{assess_health, compute_plan, ReconciliationPlan};
use state::{DesiredMembership, ObservedCluster, ObservedNode};
use ui::UpdateUI;

#[derive(Debug, Error)]
pub enum UpdateRunnerError {
    #[error("Failed to execute kubectl: {0}")]
    Execution(#[from] std::io::Error),

    #[error("Cluster query failed: {0}")]
    CommandFailed(String),

    #[error("Failed to parse cluster response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to decode membership record: {0}")]
    MembershipRecord(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(#[from] ClusterConfigError),

    #[error("Provisioning step '{operation}' failed on node '{node}': {message}")]
    Provisioning {
        operation: &'static str,
        node: String,
        message: String,
    },

    #[error("Operation aborted after 3 failed confirmation attempts")]
    ConfirmationExhausted,
}

// ============================================================================
// ClusterBackend Trait - abstrahiert die Cluster-API für Tests
// ============================================================================

/// Trait für die Cluster-Interaktion: Node-Liste und Membership-Record.
/// Ermöglicht Mocking für Tests.
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    /// Liest die aktuell registrierten Nodes samt Status-Conditions
    async fn list_nodes(&self) -> Result<Vec<ObservedNode>, UpdateRunnerError>;

    /// Liest den persistierten Membership-Record.
    /// `None` heißt "nicht initialisiert" - das ist ein eigener Zustand,
    /// kein leeres Mapping.
    async fn read_membership(&self) -> Result<Option<Membership>, UpdateRunnerError>;

    /// Überschreibt den Membership-Record bedingungslos
    async fn write_membership(&self, membership: &Membership) -> Result<(), UpdateRunnerError>;
}

// ============================================================================
// NodeProvisioner Trait - Install/Teardown einer einzelnen Maschine
// ============================================================================

/// Trait für die Provisionierung einer einzelnen Maschine.
/// Ermöglicht Mocking für Tests.
#[async_trait]
pub trait NodeProvisioner: Send + Sync {
    /// Setzt die Dienste für die Rolle des Nodes auf der Zielmaschine auf
    async fn install(&self, node: &DeclaredNode) -> Result<(), UpdateRunnerError>;

    /// Entfernt alle Dienste von der Zielmaschine
    async fn teardown(&self, node: &DeclaredNode) -> Result<(), UpdateRunnerError>;
}

// ============================================================================
// KubectlCluster - Echte Cluster-Anbindung über die kubectl CLI
// ============================================================================

const MEMBERSHIP_CONFIGMAP: &str = "clusterup-membership";
const MEMBERSHIP_NAMESPACE: &str = "kube-system";
const MEMBERSHIP_KEY: &str = "nodes";

/// Echte Cluster-Anbindung über die kubectl CLI.
pub struct KubectlCluster {
    pub kubectl_bin: PathBuf,
    pub kubeconfig: PathBuf,
}

impl KubectlCluster {
    pub fn new(kubeconfig: PathBuf) -> Self {
        Self {
            kubectl_bin: PathBuf::from("kubectl"),
            kubeconfig,
        }
    }

    async fn kubectl(&self, args: &[&str]) -> Result<std::process::Output, UpdateRunnerError> {
        let output = Command::new(&self.kubectl_bin)
            .arg("--kubeconfig")
            .arg(&self.kubeconfig)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(output)
    }
}

/// Baut das ConfigMap-Manifest für den Membership-Record.
fn membership_manifest(membership: &Membership) -> Result<String, UpdateRunnerError> {
    let nodes_yaml = serde_yaml::to_string(membership)?;

    let manifest = serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": MEMBERSHIP_CONFIGMAP,
            "namespace": MEMBERSHIP_NAMESPACE,
        },
        "data": {
            (MEMBERSHIP_KEY): nodes_yaml,
        },
    });

    Ok(manifest.to_string())
}

#[async_trait]
impl ClusterBackend for KubectlCluster {
    async fn list_nodes(&self) -> Result<Vec<ObservedNode>, UpdateRunnerError> {
        let output = self.kubectl(&["get", "nodes", "-o", "json"]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UpdateRunnerError::CommandFailed(format!(
                "Failed to list nodes: {}",
                stderr.trim()
            )));
        }

        let list: KubeNodeList = serde_json::from_slice(&output.stdout)?;
        Ok(list.items.into_iter().map(ObservedNode::from).collect())
    }

    async fn read_membership(&self) -> Result<Option<Membership>, UpdateRunnerError> {
        let output = self
            .kubectl(&[
                "get",
                "configmap",
                MEMBERSHIP_CONFIGMAP,
                "-n",
                MEMBERSHIP_NAMESPACE,
                "-o",
                "json",
            ])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("NotFound") || stderr.contains("not found") {
                return Ok(None);
            }
            return Err(UpdateRunnerError::CommandFailed(format!(
                "Failed to read membership record: {}",
                stderr.trim()
            )));
        }

        let configmap: KubeConfigMap = serde_json::from_slice(&output.stdout)?;
        match configmap.data.get(MEMBERSHIP_KEY) {
            None => Ok(None),
            Some(yaml) => Ok(Some(serde_yaml::from_str(yaml)?)),
        }
    }

    async fn write_membership(&self, membership: &Membership) -> Result<(), UpdateRunnerError> {
        let manifest = membership_manifest(membership)?;

        let mut child = Command::new(&self.kubectl_bin)
            .arg("--kubeconfig")
            .arg(&self.kubeconfig)
            .args(["apply", "-f", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(manifest.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UpdateRunnerError::CommandFailed(format!(
                "Failed to write membership record: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }
}

// ============================================================================
// UpdateContext - Snapshot eines Laufs
// ============================================================================

/// Der einmal pro Lauf erhobene Zustands-Snapshot.
///
/// Wird zu Beginn vollständig gelesen und danach nie neu geladen - der Plan
/// entsteht aus einem konsistenten Paar von deklariertem und beobachtetem
/// Zustand.
#[derive(Debug)]
pub struct UpdateContext {
    pub desired: DesiredMembership,
    pub observed: ObservedCluster,
    /// `None` = Record nicht initialisiert (Bootstrap-Fall)
    pub persisted: Option<Membership>,
}

impl UpdateContext {
    pub async fn gather<B: ClusterBackend + ?Sized>(
        backend: &B,
        config: &ClusterConfig,
    ) -> Result<Self, UpdateRunnerError> {
        let desired = DesiredMembership::from_config(config)?;
        let observed = ObservedCluster::from_nodes(backend.list_nodes().await?);
        let persisted = backend.read_membership().await?;

        Ok(Self {
            desired,
            observed,
            persisted,
        })
    }
}

// ============================================================================
// Public API
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Nur Plan berechnen und melden, nichts ausführen
    pub dry_run: bool,
}

/// Ergebnis eines Update-Laufs.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Plan wurde ausgeführt und der Membership-Record geschrieben
    Completed { added: usize, removed: usize },
    /// Dry run: Plan wurde nur berechnet
    Planned(ReconciliationPlan),
    /// Operator hat den Bootstrap-Fall mit "N" abgelehnt
    Declined,
}

/// Führt einen vollständigen Update-Lauf aus.
///
/// Ablauf: Snapshot erheben, Bootstrap-Fall auflösen, Health bewerten,
/// Plan berechnen, Adds und Removes sequentiell ausführen, zuletzt den
/// Membership-Record überschreiben. Bricht der Lauf vorher ab, bleibt der
/// Record unverändert.
pub async fn run_update<B, P, H, C, F, U>(
    backend: &B,
    provisioner: &P,
    probe: &H,
    clock: &C,
    confirmer: &mut F,
    config: &ClusterConfig,
    options: UpdateOptions,
    ui: &mut U,
) -> Result<UpdateOutcome, UpdateRunnerError>
where
    B: ClusterBackend + ?Sized,
    P: NodeProvisioner + ?Sized,
    H: HealthProbe + ?Sized,
    C: Clock + ?Sized,
    F: Confirmer + ?Sized,
    U: UpdateUI,
{
    let mut context = UpdateContext::gather(backend, config).await?;
    ui.on_run_start(context.desired.len(), context.observed.len());

    let persisted = match context.persisted.take() {
        Some(membership) => membership,
        None if options.dry_run => {
            // Im Dry-Run keine interaktive Auflösung: der Zustand wird
            // gemeldet und die Remove-Menge als leer angezeigt.
            ui.on_bootstrap_warning();
            context.desired.nodes.clone()
        }
        None => match resolve_bootstrap(confirmer, ui)? {
            BootstrapDecision::Proceed => context.desired.nodes.clone(),
            BootstrapDecision::Declined => return Ok(UpdateOutcome::Declined),
        },
    };

    let health = assess_health(&context.desired, &context.observed, probe).await;
    let plan = compute_plan(&context.desired, &health, &persisted);
    ui.on_plan(&plan);

    if options.dry_run {
        return Ok(UpdateOutcome::Planned(plan));
    }

    execute_plan(&plan, provisioner, clock, ui).await?;

    backend.write_membership(&context.desired.nodes).await?;
    ui.on_membership_written(context.desired.len());

    ui.on_complete(plan.to_add.len(), plan.to_remove.len());
    Ok(UpdateOutcome::Completed {
        added: plan.to_add.len(),
        removed: plan.to_remove.len(),
    })
}

// ============================================================================
// Test Utilities - exportiert für Integrationstests
// ============================================================================

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use clusterup_cluster_config::NodeRole;

    use crate::confirm::Confirmation;
    use crate::state::NodeCondition;

    pub fn make_worker(name: &str, address: &str) -> DeclaredNode {
        DeclaredNode {
            name: name.to_string(),
            address: address.to_string(),
            role: NodeRole::Worker,
            list_name: "workerlist".to_string(),
        }
    }

    pub fn make_control_plane(name: &str, address: &str) -> DeclaredNode {
        DeclaredNode {
            name: name.to_string(),
            address: address.to_string(),
            role: NodeRole::ControlPlane,
            list_name: "controlplanelist".to_string(),
        }
    }

    pub fn make_observed(name: &str, address: &str, ready: bool) -> ObservedNode {
        ObservedNode {
            name: name.to_string(),
            address: Some(address.to_string()),
            conditions: vec![NodeCondition {
                kind: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
            }],
        }
    }

    /// Mock Cluster-Backend für Tests
    #[derive(Default)]
    pub struct MockCluster {
        nodes: Mutex<Vec<ObservedNode>>,
        membership: Mutex<Option<Membership>>,
        writes: Mutex<Vec<Membership>>,
    }

    impl MockCluster {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_node(&self, node: ObservedNode) {
            self.nodes.lock().unwrap().push(node);
        }

        pub fn set_membership(&self, membership: Membership) {
            *self.membership.lock().unwrap() = Some(membership);
        }

        /// Alle write_membership-Aufrufe in Reihenfolge
        pub fn written(&self) -> Vec<Membership> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClusterBackend for MockCluster {
        async fn list_nodes(&self) -> Result<Vec<ObservedNode>, UpdateRunnerError> {
            Ok(self.nodes.lock().unwrap().clone())
        }

        async fn read_membership(&self) -> Result<Option<Membership>, UpdateRunnerError> {
            Ok(self.membership.lock().unwrap().clone())
        }

        async fn write_membership(&self, membership: &Membership) -> Result<(), UpdateRunnerError> {
            self.writes.lock().unwrap().push(membership.clone());
            *self.membership.lock().unwrap() = Some(membership.clone());
            Ok(())
        }
    }

    /// Mock Provisioner - zeichnet Install/Teardown-Aufrufe auf
    #[derive(Default)]
    pub struct MockProvisioner {
        calls: Mutex<Vec<(String, String)>>,
        fail_install: Option<String>,
        fail_teardown: Option<String>,
    }

    impl MockProvisioner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Lässt den Install für den angegebenen Node fehlschlagen
        pub fn fail_install_on(mut self, node: &str) -> Self {
            self.fail_install = Some(node.to_string());
            self
        }

        /// Lässt das Teardown für den angegebenen Node fehlschlagen
        pub fn fail_teardown_on(mut self, node: &str) -> Self {
            self.fail_teardown = Some(node.to_string());
            self
        }

        /// Alle Aufrufe als (operation, nodename) in Reihenfolge
        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NodeProvisioner for MockProvisioner {
        async fn install(&self, node: &DeclaredNode) -> Result<(), UpdateRunnerError> {
            self.calls
                .lock()
                .unwrap()
                .push(("install".to_string(), node.name.clone()));

            if self.fail_install.as_deref() == Some(node.name.as_str()) {
                return Err(UpdateRunnerError::Provisioning {
                    operation: "install",
                    node: node.name.clone(),
                    message: "mock failure".to_string(),
                });
            }
            Ok(())
        }

        async fn teardown(&self, node: &DeclaredNode) -> Result<(), UpdateRunnerError> {
            self.calls
                .lock()
                .unwrap()
                .push(("teardown".to_string(), node.name.clone()));

            if self.fail_teardown.as_deref() == Some(node.name.as_str()) {
                return Err(UpdateRunnerError::Provisioning {
                    operation: "teardown",
                    node: node.name.clone(),
                    message: "mock failure".to_string(),
                });
            }
            Ok(())
        }
    }

    /// Mock Health-Probe - Adressen sind healthy wenn eingetragen
    #[derive(Default)]
    pub struct MockProbe {
        healthy: Mutex<BTreeSet<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn healthy_address(self, address: &str) -> Self {
            self.healthy.lock().unwrap().insert(address.to_string());
            self
        }

        /// Alle geprüften Adressen in Reihenfolge
        pub fn probed(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HealthProbe for MockProbe {
        async fn check(&self, address: &str) -> bool {
            self.calls.lock().unwrap().push(address.to_string());
            self.healthy.lock().unwrap().contains(address)
        }
    }

    /// Mock Clock - zeichnet angeforderte Wartezeiten auf statt zu schlafen
    #[derive(Default)]
    pub struct MockClock {
        settles: Mutex<Vec<Duration>>,
    }

    impl MockClock {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn settles(&self) -> Vec<Duration> {
            self.settles.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Clock for MockClock {
        async fn settle(&self, duration: Duration) {
            self.settles.lock().unwrap().push(duration);
        }
    }

    /// Confirmer mit vorgegebener Antwortfolge
    pub struct ScriptedConfirmer {
        answers: Vec<Confirmation>,
        pos: usize,
    }

    impl ScriptedConfirmer {
        pub fn new(answers: Vec<Confirmation>) -> Self {
            Self { answers, pos: 0 }
        }

        /// Anzahl der tatsächlich gestellten Abfragen
        pub fn asked(&self) -> usize {
            self.pos
        }
    }

    impl Confirmer for ScriptedConfirmer {
        fn ask(&mut self) -> Result<Confirmation, UpdateRunnerError> {
            let answer = self
                .answers
                .get(self.pos)
                .copied()
                .unwrap_or(Confirmation::Invalid);
            self.pos += 1;
            Ok(answer)
        }
    }

    /// Mock UI für Tests - zeichnet alle Events auf
    #[derive(Default)]
    pub struct MockUI {
        pub events: Vec<String>,
    }

    impl MockUI {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl UpdateUI for MockUI {
        fn on_run_start(&mut self, declared: usize, observed: usize) {
            self.events.push(format!("run_start:{}:{}", declared, observed));
        }
        fn on_bootstrap_warning(&mut self) {
            self.events.push("bootstrap_warning".to_string());
        }
        fn on_invalid_confirmation(&mut self) {
            self.events.push("invalid_confirmation".to_string());
        }
        fn on_confirmation_exhausted(&mut self) {
            self.events.push("confirmation_exhausted".to_string());
        }
        fn on_plan(&mut self, plan: &ReconciliationPlan) {
            self.events
                .push(format!("plan:{}:{}", plan.to_add.len(), plan.to_remove.len()));
        }
        fn on_add_start(&mut self, node: &DeclaredNode) {
            self.events.push(format!("add_start:{}", node.name));
        }
        fn on_clean_done(&mut self, node: &DeclaredNode) {
            self.events.push(format!("clean_done:{}", node.name));
        }
        fn on_clean_failed(&mut self, node: &DeclaredNode, message: &str) {
            self.events
                .push(format!("clean_failed:{}:{}", node.name, message));
        }
        fn on_install_done(&mut self, node: &DeclaredNode) {
            self.events.push(format!("install_done:{}", node.name));
        }
        fn on_remove_start(&mut self, node: &DeclaredNode) {
            self.events.push(format!("remove_start:{}", node.name));
        }
        fn on_remove_done(&mut self, node: &DeclaredNode) {
            self.events.push(format!("remove_done:{}", node.name));
        }
        fn on_settle(&mut self, node: &DeclaredNode, duration: Duration) {
            self.events
                .push(format!("settle:{}:{}", node.name, duration.as_secs()));
        }
        fn on_membership_written(&mut self, count: usize) {
            self.events.push(format!("membership_written:{}", count));
        }
        fn on_complete(&mut self, added: usize, removed: usize) {
            self.events.push(format!("complete:{}:{}", added, removed));
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_manifest_shape() {
        let mut membership = Membership::new();
        membership.insert(
            "worker-01".to_string(),
            test_utils::make_worker("worker-01", "10.0.0.20"),
        );

        let manifest = membership_manifest(&membership).unwrap();
        let value: serde_json::Value = serde_json::from_str(&manifest).unwrap();

        assert_eq!(value["kind"], "ConfigMap");
        assert_eq!(value["metadata"]["name"], MEMBERSHIP_CONFIGMAP);
        assert_eq!(value["metadata"]["namespace"], MEMBERSHIP_NAMESPACE);

        let nodes_yaml = value["data"][MEMBERSHIP_KEY].as_str().unwrap();
        let back: Membership = serde_yaml::from_str(nodes_yaml).unwrap();
        assert_eq!(back.get("worker-01").unwrap().address, "10.0.0.20");
    }

    #[test]
    fn test_membership_manifest_empty() {
        let manifest = membership_manifest(&Membership::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&manifest).unwrap();

        assert!(value["data"][MEMBERSHIP_KEY].is_string());
    }
}
