// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Executes a [`DeploymentPlan`] against the external collaborators.

use super::{ChartInstaller, ClusterApi, InstalledRelease, ResourceHandle, SecretStore};
use crate::error::{AddonError, Result, SecretStoreError};
use crate::resolver::{
    DeploymentPlan, KeyMapping, PlannedResource, RequestId, ResourcePlan, ResourceRequest,
};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Applies the resource plan in dependency order, then installs the chart.
///
/// Any failure aborts the deployment; the chart is never installed after one.
pub struct Deployer<C, S, H> {
    cluster: C,
    secrets: S,
    installer: H,
    secret_wait_timeout: Duration,
}

impl<C, S, H> Deployer<C, S, H>
where
    C: ClusterApi,
    S: SecretStore,
    H: ChartInstaller,
{
    pub fn new(cluster: C, secrets: S, installer: H, secret_wait_timeout: Duration) -> Self {
        Self {
            cluster,
            secrets,
            installer,
            secret_wait_timeout,
        }
    }

    #[instrument(skip_all, fields(release = %plan.chart.release, namespace = %plan.chart.namespace))]
    pub async fn deploy(&self, plan: &DeploymentPlan) -> Result<InstalledRelease> {
        if plan.resources.has_projections() && !self.cluster.projection_driver_available().await? {
            return Err(AddonError::ProjectionDriverUnavailable(
                "SecretProviderClass (secrets-store.csi.x-k8s.io/v1) is not served".to_string(),
            ));
        }

        let handles = self.apply_resources(&plan.resources).await?;
        let prerequisites = self.await_prerequisites(&plan.resources, &handles).await?;

        info!(
            "Installing chart {} {} with {} prerequisites",
            plan.chart.chart,
            plan.chart.version,
            prerequisites.len()
        );
        let release = self
            .installer
            .install(&plan.chart, &plan.values, &prerequisites)
            .await?;

        info!(
            "Release {}/{} installed",
            release.namespace, release.release
        );
        Ok(release)
    }

    /// Apply every request, one dependency wave at a time.
    async fn apply_resources(&self, plan: &ResourcePlan) -> Result<BTreeMap<RequestId, ResourceHandle>> {
        let mut handles = BTreeMap::new();

        for (level, wave) in plan.waves().into_iter().enumerate() {
            debug!("Applying wave {} with {} resources", level, wave.len());
            let created = try_join_all(wave.iter().map(|r| self.apply(&r.request))).await?;
            handles.extend(wave.iter().map(|r| r.id).zip(created));
        }

        Ok(handles)
    }

    async fn apply(&self, request: &ResourceRequest) -> Result<ResourceHandle> {
        debug!("Applying {}", request);

        match request {
            ResourceRequest::Namespace { name } => self.cluster.ensure_namespace(name).await,
            ResourceRequest::ServiceIdentity { name, namespace } => {
                self.cluster.apply_service_identity(name, namespace).await
            }
            ResourceRequest::SecretProjection {
                name,
                namespace,
                source_secret_name,
                materialized_secret_name,
                key_mappings,
            } => {
                self.cluster
                    .apply_projection(
                        name,
                        namespace,
                        source_secret_name,
                        materialized_secret_name,
                        key_mappings,
                    )
                    .await
            }
            ResourceRequest::PlaceholderWorkload {
                name,
                namespace,
                identity,
                mounted_projection,
            } => {
                self.cluster
                    .apply_placeholder_workload(name, namespace, identity, mounted_projection)
                    .await
            }
            ResourceRequest::NativeSecret {
                name,
                namespace,
                source_secret_name,
                key_mappings,
            } => {
                let source = self.secrets.get_secret(source_secret_name).await?;
                let data = map_secret_fields(source_secret_name, &source, key_mappings)?;
                self.cluster.apply_native_secret(name, namespace, data).await
            }
        }
    }

    /// Wait for the chart prerequisites and return their handles.
    async fn await_prerequisites(
        &self,
        plan: &ResourcePlan,
        handles: &BTreeMap<RequestId, ResourceHandle>,
    ) -> Result<Vec<ResourceHandle>> {
        let waits = plan.chart_prerequisites().iter().filter_map(|id| {
            let resource = plan.get(*id)?;
            let (secret, namespace) = projected_secret(plan, resource)?;
            Some(async move {
                info!("Waiting for secret {}/{} to be materialized", namespace, secret);
                self.cluster
                    .await_materialized_secret(secret, namespace, self.secret_wait_timeout)
                    .await
            })
        });
        try_join_all(waits).await?;

        Ok(plan
            .chart_prerequisites()
            .iter()
            .filter_map(|id| handles.get(id).cloned())
            .collect())
    }
}

/// The native secret a placeholder workload causes to be synced
fn projected_secret<'a>(
    plan: &'a ResourcePlan,
    workload: &'a PlannedResource,
) -> Option<(&'a str, &'a str)> {
    if !matches!(workload.request, ResourceRequest::PlaceholderWorkload { .. }) {
        return None;
    }

    workload
        .depends_on
        .iter()
        .filter_map(|dep| plan.get(*dep))
        .find_map(|dep| match &dep.request {
            ResourceRequest::SecretProjection {
                namespace,
                materialized_secret_name,
                ..
            } => Some((materialized_secret_name.as_str(), namespace.as_str())),
            _ => None,
        })
}

/// Pick the mapped fields out of a fetched secret, keyed by destination key.
fn map_secret_fields(
    secret_name: &str,
    source: &BTreeMap<String, String>,
    key_mappings: &[KeyMapping],
) -> std::result::Result<BTreeMap<String, String>, SecretStoreError> {
    key_mappings
        .iter()
        .map(|m| {
            source
                .get(&m.source_field)
                .map(|value| (m.destination_key.clone(), value.clone()))
                .ok_or_else(|| SecretStoreError::MissingField {
                    secret: secret_name.to_string(),
                    field: m.source_field.clone(),
                })
        })
        .collect()
}
