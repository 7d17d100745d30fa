//! Provisionierung einer Zielmaschine über ssh
//!
//! Streamt ein konfiguriertes Bootstrap- bzw. Cleanup-Skript per
//! `ssh ... bash -s -- <rolle>` auf die Zielmaschine. Die Skripte sind
//! deployment-spezifisch und liegen neben der Cluster-Konfiguration.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use clusterup_cluster_config::DeclaredNode;
use clusterup_update_runner::{NodeProvisioner, UpdateRunnerError};

/// Provisioniert Maschinen über ssh und role-parametrisierte Shell-Skripte.
pub struct SshProvisioner {
    user: String,
    port: u16,
    install_script: PathBuf,
    cleanup_script: PathBuf,
}

impl SshProvisioner {
    pub fn new(user: String, port: u16, install_script: PathBuf, cleanup_script: PathBuf) -> Self {
        Self {
            user,
            port,
            install_script,
            cleanup_script,
        }
    }

    fn ssh_args(&self, node: &DeclaredNode) -> Vec<String> {
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-p".to_string(),
            self.port.to_string(),
            format!("{}@{}", self.user, node.address),
            "bash".to_string(),
            "-s".to_string(),
            "--".to_string(),
            node.role.as_str().to_string(),
        ]
    }

    async fn run_script(
        &self,
        node: &DeclaredNode,
        script: &Path,
        operation: &'static str,
    ) -> Result<(), UpdateRunnerError> {
        let script_content =
            tokio::fs::read_to_string(script)
                .await
                .map_err(|err| UpdateRunnerError::Provisioning {
                    operation,
                    node: node.name.clone(),
                    message: format!("failed to read script {}: {}", script.display(), err),
                })?;

        let mut child = Command::new("ssh")
            .args(self.ssh_args(node))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| UpdateRunnerError::Provisioning {
                operation,
                node: node.name.clone(),
                message: format!("failed to spawn ssh: {}", err),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(script_content.as_bytes())
                .await
                .map_err(|err| UpdateRunnerError::Provisioning {
                    operation,
                    node: node.name.clone(),
                    message: format!("failed to stream script: {}", err),
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| UpdateRunnerError::Provisioning {
                operation,
                node: node.name.clone(),
                message: err.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UpdateRunnerError::Provisioning {
                operation,
                node: node.name.clone(),
                message: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl NodeProvisioner for SshProvisioner {
    async fn install(&self, node: &DeclaredNode) -> Result<(), UpdateRunnerError> {
        self.run_script(node, &self.install_script, "install").await
    }

    async fn teardown(&self, node: &DeclaredNode) -> Result<(), UpdateRunnerError> {
        self.run_script(node, &self.cleanup_script, "teardown").await
    }
}
