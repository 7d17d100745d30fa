//! Lifecycle Coordinator - führt den Plan aus
//!
//! Strikt sequentiell: eine Node-Operation läuft vollständig durch bevor
//! die nächste beginnt. Erst alle Adds, dann alle Removes, jeweils in
//! Namensreihenfolge. Ein Install- oder Remove-Fehlschlag bricht den
//! gesamten Lauf ab; bereits abgeschlossene Operationen werden nicht
//! zurückgerollt, spätere Plan-Einträge nicht mehr angefasst.

use std::time::Duration;

use clusterup_cluster_config::DeclaredNode;

use crate::clock::Clock;
use crate::reconcile::{NodeAction, ReconciliationPlan};
use crate::ui::UpdateUI;
use crate::{NodeProvisioner, UpdateRunnerError};

/// Wartezeit nach einer Control-Plane-Operation, damit der Consensus-Store
/// die Topologieänderung verarbeiten kann.
pub const CONTROL_PLANE_SETTLE: Duration = Duration::from_secs(60);

/// Führt alle Aktionen des Plans aus.
pub async fn execute_plan<P, C, U>(
    plan: &ReconciliationPlan,
    provisioner: &P,
    clock: &C,
    ui: &mut U,
) -> Result<(), UpdateRunnerError>
where
    P: NodeProvisioner + ?Sized,
    C: Clock + ?Sized,
    U: UpdateUI,
{
    for action in plan.actions() {
        match action {
            NodeAction::Add(node) => add_node(&node, provisioner, clock, ui).await?,
            NodeAction::Remove(node) => remove_node(&node, provisioner, clock, ui).await?,
        }
    }

    Ok(())
}

/// Setzt einen Node auf: defensives Teardown, dann Install.
///
/// Das Teardown räumt veralteten Zustand vor dem Reinstall ab. Schlägt es
/// fehl, wird das gemeldet und der Install läuft trotzdem - veralteter
/// Zustand darf einen Reinstall nicht dauerhaft blockieren. Ein
/// Install-Fehlschlag dagegen bricht den Lauf ab.
async fn add_node<P, C, U>(
    node: &DeclaredNode,
    provisioner: &P,
    clock: &C,
    ui: &mut U,
) -> Result<(), UpdateRunnerError>
where
    P: NodeProvisioner + ?Sized,
    C: Clock + ?Sized,
    U: UpdateUI,
{
    ui.on_add_start(node);

    match provisioner.teardown(node).await {
        Ok(()) => ui.on_clean_done(node),
        Err(err) => ui.on_clean_failed(node, &err.to_string()),
    }

    provisioner.install(node).await?;
    ui.on_install_done(node);

    if node.is_control_plane() {
        ui.on_settle(node, CONTROL_PLANE_SETTLE);
        clock.settle(CONTROL_PLANE_SETTLE).await;
    }

    Ok(())
}

/// Baut einen Node ab. Ein Teardown-Fehlschlag ist hier fatal.
async fn remove_node<P, C, U>(
    node: &DeclaredNode,
    provisioner: &P,
    clock: &C,
    ui: &mut U,
) -> Result<(), UpdateRunnerError>
where
    P: NodeProvisioner + ?Sized,
    C: Clock + ?Sized,
    U: UpdateUI,
{
    ui.on_remove_start(node);

    provisioner.teardown(node).await?;
    ui.on_remove_done(node);

    if node.is_control_plane() {
        ui.on_settle(node, CONTROL_PLANE_SETTLE);
        clock.settle(CONTROL_PLANE_SETTLE).await;
    }

    Ok(())
}
