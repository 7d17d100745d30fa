use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn clusterup() -> Command {
    Command::cargo_bin("clusterup").unwrap()
}

const SAMPLE_CONFIG: &str = r#"
remote_deployment:
  worker:
    listname: workerlist

workerlist:
  w1:
    nodename: worker-01
    hostip: 10.0.0.20
    k8s-role: worker
"#;

#[test]
fn test_help_and_version() {
    clusterup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cluster machine reconciliation"));

    clusterup().arg("--version").assert().success();
}

#[test]
fn test_update_requires_kubeconfig() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("cluster.yaml"), SAMPLE_CONFIG).unwrap();

    clusterup()
        .current_dir(temp_dir.path())
        .args(["update"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kubeconfig"));
}

#[test]
fn test_plan_requires_kubeconfig() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("cluster.yaml"), SAMPLE_CONFIG).unwrap();

    clusterup()
        .current_dir(temp_dir.path())
        .args(["plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kubeconfig"));
}

#[test]
fn test_missing_cluster_config() {
    let temp_dir = TempDir::new().unwrap();
    let kubeconfig = temp_dir.path().join("kubeconfig");
    fs::write(&kubeconfig, "apiVersion: v1\n").unwrap();

    clusterup()
        .current_dir(temp_dir.path())
        .args(["update", "--kube-config"])
        .arg(&kubeconfig)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_invalid_cluster_config() {
    let temp_dir = TempDir::new().unwrap();
    let kubeconfig = temp_dir.path().join("kubeconfig");
    fs::write(&kubeconfig, "apiVersion: v1\n").unwrap();
    fs::write(temp_dir.path().join("cluster.yaml"), "not: [valid").unwrap();

    clusterup()
        .current_dir(temp_dir.path())
        .args(["update", "--kube-config"])
        .arg(&kubeconfig)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_config_without_remote_deployment_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let kubeconfig = temp_dir.path().join("kubeconfig");
    fs::write(&kubeconfig, "apiVersion: v1\n").unwrap();
    fs::write(temp_dir.path().join("cluster.yaml"), "unrelated: true\n").unwrap();

    clusterup()
        .current_dir(temp_dir.path())
        .args(["plan", "--kube-config"])
        .arg(&kubeconfig)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
