// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Composition of the nri-bundle values tree.

use super::credentials::CredentialStrategy;
use super::planner::materialized_secret_name;
use crate::constants::secret_fields;
use crate::options::AddOnOptions;
use crate::values::{remove_path, set_path};
use serde_json::Value;
use tracing::{debug, warn};

/// Value paths written by the composer
pub mod paths {
    pub const CLUSTER: &str = "global.cluster";
    pub const LICENSE_KEY: &str = "global.licenseKey";
    pub const CUSTOM_SECRET_NAME: &str = "global.customSecretName";
    pub const CUSTOM_SECRET_LICENSE_KEY: &str = "global.customSecretLicenseKey";
    pub const LOW_DATA_MODE: &str = "global.lowDataMode";

    pub const INFRASTRUCTURE: &str = "infrastructure.enabled";
    pub const INFRASTRUCTURE_PRIVILEGED: &str = "newrelic-infrastructure.privileged";
    pub const PROMETHEUS: &str = "prometheus.enabled";
    pub const LOGGING: &str = "logging.enabled";
    pub const KSM: &str = "ksm.enabled";
    pub const KUBE_EVENTS: &str = "kubeEvents.enabled";
    pub const METRICS_ADAPTER: &str = "metrics-adapter.enabled";

    pub const PIXIE: &str = "pixie-chart.enabled";
    pub const PIXIE_CLUSTER_NAME: &str = "pixie-chart.clusterName";
    pub const PIXIE_DEPLOY_KEY: &str = "pixie-chart.deployKey";
    pub const PIXIE_DEPLOY_KEY_SECRET: &str = "pixie-chart.customDeployKeySecret";

    pub const PIXIE_INTEGRATION: &str = "newrelic-pixie.enabled";
    pub const PIXIE_API_KEY: &str = "newrelic-pixie.apiKey";
    pub const PIXIE_API_KEY_SECRET_NAME: &str = "newrelic-pixie.customSecretApiKeyName";
    pub const PIXIE_API_KEY_SECRET_KEY: &str = "newrelic-pixie.customSecretApiKeyKey";

    /// Paths holding credentials or references to them
    pub const CREDENTIALS: &[&str] = &[
        LICENSE_KEY,
        CUSTOM_SECRET_NAME,
        CUSTOM_SECRET_LICENSE_KEY,
        PIXIE_DEPLOY_KEY,
        PIXIE_DEPLOY_KEY_SECRET,
        PIXIE_API_KEY,
        PIXIE_API_KEY_SECRET_NAME,
        PIXIE_API_KEY_SECRET_KEY,
    ];
}

/// A value the composer manages; `None` leaves the path untouched.
type ManagedWrite = (&'static str, Option<Value>);

fn flag(enabled: bool) -> Option<Value> {
    enabled.then_some(Value::Bool(true))
}

fn text(value: &str) -> Option<Value> {
    Some(Value::String(value.to_string()))
}

/// Secret the Pixie keys are read from when not given in plaintext
fn pixie_secret(strategy: &CredentialStrategy) -> Option<&str> {
    match strategy {
        CredentialStrategy::SingleExternalSecret { secret_name } => Some(secret_name),
        CredentialStrategy::SplitExternalSecret {
            aux_key_secret_name,
            ..
        } => Some(aux_key_secret_name),
        _ => None,
    }
}

fn license_secret(strategy: &CredentialStrategy) -> Option<&str> {
    match strategy {
        CredentialStrategy::SingleExternalSecret { secret_name } => Some(secret_name),
        CredentialStrategy::SplitExternalSecret {
            license_secret_name,
            ..
        } => Some(license_secret_name),
        _ => None,
    }
}

/// The full table of managed writes, in application order.
fn managed_writes(
    options: &AddOnOptions,
    strategy: &CredentialStrategy,
    cluster_name: &str,
) -> Vec<ManagedWrite> {
    let toggles = &options.toggles;
    let credentials = &options.credentials;

    let license_key = match strategy {
        CredentialStrategy::Direct { license_key } => text(license_key),
        _ => None,
    };
    let license_secret = license_secret(strategy).map(materialized_secret_name);
    let pixie_secret = pixie_secret(strategy).map(materialized_secret_name);

    let pixie = toggles.pixie;
    let deploy_key = credentials.pixie_deploy_key.as_deref().filter(|_| pixie);
    let deploy_key_secret = pixie_secret
        .as_deref()
        .filter(|_| pixie && deploy_key.is_none());

    let integration = toggles.pixie_integration;
    let api_key = credentials.pixie_api_key.as_deref().filter(|_| integration);
    let api_key_secret = pixie_secret
        .as_deref()
        .filter(|_| integration && api_key.is_none());

    vec![
        (paths::CLUSTER, text(cluster_name)),
        (paths::LICENSE_KEY, license_key),
        (paths::CUSTOM_SECRET_NAME, license_secret.as_deref().and_then(text)),
        (
            paths::CUSTOM_SECRET_LICENSE_KEY,
            license_secret
                .as_ref()
                .and_then(|_| text(secret_fields::LICENSE_KEY_KEY)),
        ),
        (paths::LOW_DATA_MODE, flag(toggles.low_data_mode)),
        (paths::INFRASTRUCTURE, flag(toggles.infrastructure)),
        (
            paths::INFRASTRUCTURE_PRIVILEGED,
            toggles
                .infrastructure
                .then_some(Value::Bool(toggles.infrastructure_privileged)),
        ),
        (paths::LOGGING, flag(toggles.logging)),
        (paths::PROMETHEUS, flag(toggles.prometheus)),
        (paths::KSM, flag(toggles.ksm)),
        (paths::KUBE_EVENTS, flag(toggles.kube_events)),
        (paths::METRICS_ADAPTER, flag(toggles.metrics_adapter)),
        (paths::PIXIE, flag(pixie)),
        (paths::PIXIE_CLUSTER_NAME, text(cluster_name).filter(|_| pixie)),
        (paths::PIXIE_DEPLOY_KEY, deploy_key.and_then(text)),
        (paths::PIXIE_DEPLOY_KEY_SECRET, deploy_key_secret.and_then(text)),
        (paths::PIXIE_INTEGRATION, flag(integration)),
        (paths::PIXIE_API_KEY, api_key.and_then(text)),
        (paths::PIXIE_API_KEY_SECRET_NAME, api_key_secret.and_then(text)),
        (
            paths::PIXIE_API_KEY_SECRET_KEY,
            api_key_secret.and_then(|_| text(secret_fields::PIXIE_API_KEY_KEY)),
        ),
    ]
}

/// Build the chart values: caller overrides first, managed writes on top.
pub fn compose_values(
    options: &AddOnOptions,
    strategy: &CredentialStrategy,
    cluster_name: &str,
) -> Value {
    let mut values = options.values.clone();

    if *strategy != CredentialStrategy::None {
        for path in paths::CREDENTIALS {
            if remove_path(&mut values, path).is_some() {
                warn!("Ignoring override for credential path {}", path);
            }
        }
    }

    for (path, value) in managed_writes(options, strategy, cluster_name) {
        if let Some(value) = value {
            debug!("Setting {}", path);
            set_path(&mut values, path, value);
        }
    }

    values
}
