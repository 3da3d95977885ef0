// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deployment of a resolved plan through the cluster, secret store and chart installer.

pub mod helm;
pub mod orchestrator;

pub use helm::HelmCli;
pub use orchestrator::Deployer;

use crate::error::{Result, SecretStoreError};
use crate::options::ChartRef;
use crate::resolver::KeyMapping;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A resource that exists in the cluster after a create call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceHandle {
    pub kind: &'static str,
    pub name: String,
    pub namespace: Option<String>,
}

impl ResourceHandle {
    pub fn cluster_scoped(kind: &'static str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: None,
        }
    }

    pub fn namespaced(kind: &'static str, name: &str, namespace: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
        }
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// An installed Helm release
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstalledRelease {
    pub release: String,
    pub namespace: String,
    pub version: String,
}

/// Source of external secrets, keyed by field name
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(
        &self,
        name: &str,
    ) -> std::result::Result<BTreeMap<String, String>, SecretStoreError>;
}

/// Cluster-side operations needed to materialize secrets
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Whether the Secrets Store CSI driver's `SecretProviderClass` is served
    async fn projection_driver_available(&self) -> Result<bool>;

    async fn ensure_namespace(&self, name: &str) -> Result<ResourceHandle>;

    async fn apply_service_identity(&self, name: &str, namespace: &str) -> Result<ResourceHandle>;

    async fn apply_projection(
        &self,
        name: &str,
        namespace: &str,
        source_secret_name: &str,
        secret_name: &str,
        key_mappings: &[KeyMapping],
    ) -> Result<ResourceHandle>;

    async fn apply_placeholder_workload(
        &self,
        name: &str,
        namespace: &str,
        identity: &str,
        projection: &str,
    ) -> Result<ResourceHandle>;

    async fn apply_native_secret(
        &self,
        name: &str,
        namespace: &str,
        data: BTreeMap<String, String>,
    ) -> Result<ResourceHandle>;

    /// Wait until the native secret `name` exists
    async fn await_materialized_secret(
        &self,
        name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<()>;
}

#[async_trait]
pub trait ChartInstaller: Send + Sync {
    /// Install or upgrade the chart. `prerequisites` already exist when called.
    async fn install(
        &self,
        chart: &ChartRef,
        values: &Value,
        prerequisites: &[ResourceHandle],
    ) -> Result<InstalledRelease>;
}
