// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AddonError {
    #[error("Conflicting credential sources: {}", .0.join(", "))]
    ConflictingCredentialSources(Vec<&'static str>),

    #[error("Incomplete split secret: {0} is set but {1} is missing")]
    IncompleteSplitSecret(&'static str, &'static str),

    #[error("External secret name '{0}' has no characters usable in a Kubernetes name")]
    InvalidSecretName(String),

    #[error("External secrets '{0}' and '{1}' map to the same Kubernetes secret '{2}'")]
    SecretNameCollision(String, String, String),

    #[error("Cannot determine the New Relic cluster name")]
    MissingClusterIdentifier,

    #[error("No license key or license key secret configured")]
    MissingCredentials,

    #[error("Secret fetch failed: {0}")]
    SecretFetchFailure(#[from] SecretStoreError),

    #[error("Failed to create {resource}: {source}")]
    ResourceCreationFailure {
        resource: String,
        #[source]
        source: kube::Error,
    },

    #[error("Secrets Store CSI driver is not available: {0}")]
    ProjectionDriverUnavailable(String),

    #[error("Secret {0} was not materialized in time")]
    SecretMaterializationTimeout(String),

    #[error("Failed to watch secret {0}: {1}")]
    SecretWatchFailure(String, #[source] kube_runtime::wait::Error),

    #[error("Failed to render YAML: {0}")]
    RenderError(#[from] serde_yaml::Error),

    #[error("Chart install failed: {0}")]
    ChartInstallFailure(String),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),
}

/// Failures reported by a [`SecretStore`](crate::deploy::SecretStore).
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("secret {0} not found")]
    NotFound(String),

    #[error("access to secret {0} denied")]
    AccessDenied(String),

    #[error("secret {secret} has no field {field}")]
    MissingField { secret: String, field: String },

    #[error("field {field} of secret {secret} is not valid UTF-8")]
    InvalidEncoding { secret: String, field: String },

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

pub type Result<T> = std::result::Result<T, AddonError>;
