// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Chart installation through the `helm` CLI.

use super::{ChartInstaller, InstalledRelease, ResourceHandle};
use crate::error::{AddonError, Result};
use crate::options::ChartRef;
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Runs `helm upgrade --install`, streaming the values on stdin.
#[derive(Debug, Clone)]
pub struct HelmCli {
    binary: String,
    kubeconfig: Option<String>,
}

impl HelmCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            kubeconfig: None,
        }
    }

    /// Target the cluster of this kubeconfig file instead of helm's default
    pub fn with_kubeconfig(mut self, path: impl Into<String>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    fn args(&self, chart: &ChartRef) -> Vec<String> {
        let mut args: Vec<String> = [
            "upgrade",
            "--install",
            chart.release.as_str(),
            chart.chart.as_str(),
            "--repo",
            chart.repository.as_str(),
            "--namespace",
            chart.namespace.as_str(),
            "--create-namespace",
            "--version",
            chart.version.as_str(),
            "--values",
            "-",
            "--wait",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Some(kubeconfig) = &self.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(kubeconfig.clone());
        }
        args
    }
}

#[async_trait]
impl ChartInstaller for HelmCli {
    #[instrument(skip(self, values, prerequisites), fields(release = %chart.release))]
    async fn install(
        &self,
        chart: &ChartRef,
        values: &Value,
        prerequisites: &[ResourceHandle],
    ) -> Result<InstalledRelease> {
        for handle in prerequisites {
            debug!("Prerequisite ready: {}", handle);
        }

        let values_yaml = serde_yaml::to_string(values)?;
        let args = self.args(chart);
        info!(
            "Running {} upgrade --install {} {}",
            self.binary, chart.release, chart.chart
        );

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AddonError::ChartInstallFailure(format!("Failed to run {}: {}", self.binary, e))
            })?;

        // stdin is written concurrently with draining stdout and stderr.
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                stdin.write_all(values_yaml.as_bytes()).await?;
                stdin.shutdown().await
            })
        });

        let output = child.wait_with_output().await.map_err(|e| {
            AddonError::ChartInstallFailure(format!("Failed to wait for {}: {}", self.binary, e))
        })?;

        if !output.status.success() {
            return Err(AddonError::ChartInstallFailure(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        if let Some(writer) = writer {
            writer
                .await
                .map_err(|e| {
                    AddonError::ChartInstallFailure(format!("Values writer failed: {}", e))
                })?
                .map_err(|e| {
                    AddonError::ChartInstallFailure(format!("Failed to write values: {}", e))
                })?;
        }

        debug!("{}", String::from_utf8_lossy(&output.stdout));

        Ok(InstalledRelease {
            release: chart.release.clone(),
            namespace: chart.namespace.clone(),
            version: chart.version.clone(),
        })
    }
}
