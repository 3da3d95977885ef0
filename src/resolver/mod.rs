// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Configuration resolver: credential strategy, resource plan and chart values.

pub mod composer;
pub mod credentials;
pub mod planner;

pub use composer::compose_values;
pub use credentials::{
    resolve_cluster_name, resolve_strategy, validate_secret_names, CredentialStrategy,
};
pub use planner::{
    materialized_secret_name, plan_resources, KeyMapping, PlannedResource, RequestId,
    ResourcePlan, ResourceRequest,
};

use crate::error::Result;
use crate::options::{AddOnOptions, ChartRef};
use serde_json::Value;
use std::str::FromStr;
use tracing::{info, instrument};

/// What to do when no New Relic cluster name is configured
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingClusterNamePolicy {
    /// Fall back to the infrastructure's own cluster name
    #[default]
    Default,
    Fail,
}

impl FromStr for MissingClusterNamePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown missing cluster name policy '{}'", other)),
        }
    }
}

/// What to do when no credential source is configured
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingCredentialsPolicy {
    #[default]
    Allow,
    Fail,
}

impl FromStr for MissingCredentialsPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown missing credentials policy '{}'", other)),
        }
    }
}

/// How an external secret becomes a native Kubernetes secret.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SecretMaterializer {
    /// The Secrets Store CSI driver syncs the secret once a running pod mounts
    /// the projected volume, so a placeholder pod is planned per secret.
    #[default]
    ProjectionDriven,
    /// The secret store contents are written as a native secret directly.
    Native,
}

impl FromStr for SecretMaterializer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "projection" | "csi" => Ok(Self::ProjectionDriven),
            "native" => Ok(Self::Native),
            other => Err(format!("unknown secret materializer '{}'", other)),
        }
    }
}

/// Policies and environment facts the resolver needs besides the options
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveSettings {
    pub on_missing_cluster_name: MissingClusterNamePolicy,
    pub on_missing_credentials: MissingCredentialsPolicy,
    pub materializer: SecretMaterializer,
    /// Name of the cluster as known to the infrastructure
    pub infra_cluster_name: Option<String>,
}

/// Everything needed to perform one deployment
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentPlan {
    pub strategy: CredentialStrategy,
    pub cluster_name: String,
    pub resources: ResourcePlan,
    pub values: Value,
    pub chart: ChartRef,
}

/// Validate `options` and produce the full deployment plan.
///
/// Fails before any cluster call on conflicting or missing inputs.
#[instrument(skip_all, fields(release = %options.chart.release))]
pub fn resolve_and_plan(options: &AddOnOptions, settings: &ResolveSettings) -> Result<DeploymentPlan> {
    let (strategy, cluster_name) = credentials::preflight(options, settings)?;
    let resources = plan_resources(&strategy, options, settings.materializer);
    let values = compose_values(options, &strategy, &cluster_name);

    info!(
        "Resolved deployment for cluster '{}': {} auxiliary resources",
        cluster_name,
        resources.len()
    );

    Ok(DeploymentPlan {
        strategy,
        cluster_name,
        resources,
        values,
        chart: options.chart.clone(),
    })
}
