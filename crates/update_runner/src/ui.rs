//! UpdateUI Trait - Fortschrittsausgabe während des Update-Laufs
//!
//! Abstrahiert die Ausgabe, damit der Kern ohne Terminal testbar bleibt.
//! Sichtbares Verhalten läuft ausschließlich über diese Events und den
//! finalen Erfolg/Fehlschlag des Laufs.

use std::time::Duration;

use clusterup_cluster_config::DeclaredNode;

use crate::reconcile::ReconciliationPlan;

/// Trait für UI-Events während der Reconciliation.
pub trait UpdateUI {
    /// Wird aufgerufen sobald Konfiguration und Node-Liste gelesen sind
    fn on_run_start(&mut self, declared: usize, observed: usize);

    /// Wird aufgerufen wenn kein Membership-Record existiert
    fn on_bootstrap_warning(&mut self);

    /// Wird bei einer ungültigen Bestätigungsantwort aufgerufen
    fn on_invalid_confirmation(&mut self);

    /// Wird aufgerufen wenn die Bestätigung dreimal fehlgeschlagen ist
    fn on_confirmation_exhausted(&mut self);

    /// Wird aufgerufen sobald der Plan berechnet ist
    fn on_plan(&mut self, plan: &ReconciliationPlan);

    /// Wird aufgerufen bevor ein Node aufgesetzt wird
    fn on_add_start(&mut self, node: &DeclaredNode);

    /// Wird nach dem defensiven Teardown vor dem Install aufgerufen
    fn on_clean_done(&mut self, node: &DeclaredNode);

    /// Wird aufgerufen wenn das defensive Teardown fehlschlägt
    fn on_clean_failed(&mut self, node: &DeclaredNode, message: &str);

    /// Wird nach erfolgreichem Install aufgerufen
    fn on_install_done(&mut self, node: &DeclaredNode);

    /// Wird aufgerufen bevor ein Node abgebaut wird
    fn on_remove_start(&mut self, node: &DeclaredNode);

    /// Wird nach erfolgreichem Teardown aufgerufen
    fn on_remove_done(&mut self, node: &DeclaredNode);

    /// Wird aufgerufen bevor auf das Control-Plane-Settling gewartet wird
    fn on_settle(&mut self, node: &DeclaredNode, duration: Duration);

    /// Wird nach dem Schreiben des Membership-Records aufgerufen
    fn on_membership_written(&mut self, count: usize);

    /// Wird am Ende eines erfolgreichen Laufs aufgerufen
    fn on_complete(&mut self, added: usize, removed: usize);
}

/// Headless UI implementation using println!
pub struct HeadlessUI;

impl UpdateUI for HeadlessUI {
    fn on_run_start(&mut self, declared: usize, observed: usize) {
        println!(
            "Reconciling {} declared node(s) against {} observed node(s).",
            declared, observed
        );
    }

    fn on_bootstrap_warning(&mut self) {
        eprintln!("Warning: no membership record was found in the cluster.");
        eprintln!("This can mean a genuine first run - or a record that was reset while");
        eprintln!("the machines still match an older configuration. In the latter case,");
        eprintln!("run the update once with the previous, unchanged machine list first,");
        eprintln!("then re-run it with the new configuration.");
    }

    fn on_invalid_confirmation(&mut self) {
        println!(" Please type Y or N.");
    }

    fn on_confirmation_exhausted(&mut self) {
        eprintln!("3 attempts used up - stopping the operation.");
    }

    fn on_plan(&mut self, plan: &ReconciliationPlan) {
        println!(
            "Plan: {} node(s) to add, {} node(s) to remove.",
            plan.to_add.len(),
            plan.to_remove.len()
        );
        for node in &plan.to_add {
            println!("  add    {} ({}, {})", node.name, node.address, node.role.as_str());
        }
        for node in &plan.to_remove {
            println!("  remove {} ({}, {})", node.name, node.address, node.role.as_str());
        }
    }

    fn on_add_start(&mut self, node: &DeclaredNode) {
        println!("Begin to add node to the cluster.");
        println!("Target node name: {}", node.name);
        println!("Target node address: {}", node.address);
        println!("[ 0/2 ] Cleaning the target node.");
    }

    fn on_clean_done(&mut self, _node: &DeclaredNode) {
        println!("[ 1/2 ] Cleaning done, installing services on the target node.");
    }

    fn on_clean_failed(&mut self, node: &DeclaredNode, message: &str) {
        eprintln!(
            "[ 1/2 ] Cleaning {} reported a failure ({}), continuing with the install.",
            node.name, message
        );
    }

    fn on_install_done(&mut self, node: &DeclaredNode) {
        println!("[ 2/2 ] Install done!");
        println!("Node [{}] was added to the cluster.", node.name);
    }

    fn on_remove_start(&mut self, node: &DeclaredNode) {
        println!("Begin to remove node from the cluster.");
        println!("Target node name: {}", node.name);
        println!("Target node address: {}", node.address);
        println!("[ 0/1 ] Cleaning the target node, removing all services.");
    }

    fn on_remove_done(&mut self, node: &DeclaredNode) {
        println!("[ 1/1 ] Cleaning done.");
        println!("Node [{}] was removed from the cluster.", node.name);
    }

    fn on_settle(&mut self, node: &DeclaredNode, duration: Duration) {
        println!(
            "Control-plane node [{}] changed, waiting {}s for the consensus store to settle.",
            node.name,
            duration.as_secs()
        );
    }

    fn on_membership_written(&mut self, count: usize) {
        println!("Membership record updated ({} node(s)).", count);
    }

    fn on_complete(&mut self, added: usize, removed: usize) {
        println!("Update complete: {} added, {} removed.", added, removed);
    }
}
