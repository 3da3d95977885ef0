// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Target cluster client creation and kubeconfig utilities

use crate::config::Config;
use crate::error::{AddonError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::path::Path;
use tracing::{info, instrument};

/// Create a Kubernetes client for the cluster the add-on is deployed to
///
/// Uses the configured kubeconfig file when set, the inferred in-cluster or
/// local configuration otherwise.
#[instrument(skip(config))]
pub async fn create_target_client(config: &Config) -> Result<Client> {
    match &config.target_kubeconfig {
        Some(path) => {
            let kubeconfig = read_kubeconfig(path).await?;
            create_client_from_kubeconfig(&kubeconfig).await
        }
        None => {
            info!("Using inferred Kubernetes configuration");
            Ok(Client::try_default().await?)
        }
    }
}

async fn read_kubeconfig(path: &Path) -> Result<String> {
    info!("Reading kubeconfig from {}", path.display());
    tokio::fs::read_to_string(path).await.map_err(|e| {
        AddonError::KubeconfigError(format!("Failed to read {}: {}", path.display(), e))
    })
}

/// Create a Kubernetes client from a kubeconfig string
async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| AddonError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| AddonError::KubeconfigError(format!("Failed to create config: {}", e)))?;

    Client::try_from(client_config)
        .map_err(|e| AddonError::KubeconfigError(format!("Failed to create client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_kubeconfig() {
        match create_client_from_kubeconfig("clusters: [not, a, map").await {
            Err(AddonError::KubeconfigError(msg)) => assert!(msg.contains("parse"), "{}", msg),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("invalid kubeconfig was accepted"),
        }
    }

    #[tokio::test]
    async fn test_missing_kubeconfig_file() {
        let err = read_kubeconfig(Path::new("/nonexistent/kubeconfig"))
            .await
            .unwrap_err();

        assert!(matches!(err, AddonError::KubeconfigError(msg) if msg.contains("/nonexistent/kubeconfig")));
    }
}
