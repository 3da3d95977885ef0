// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Add-on options: the caller-supplied partial record and its merge over compiled-in defaults.

use crate::constants::chart;
use serde::Deserialize;
use serde_json::Value;

/// Partial add-on options as supplied by the caller (camelCase YAML/JSON).
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddOnProps {
    pub namespace: Option<String>,
    pub repository: Option<String>,
    pub chart: Option<String>,
    pub release: Option<String>,
    pub version: Option<String>,

    /// Kubernetes cluster name in New Relic
    pub new_relic_cluster_name: Option<String>,
    /// Plaintext license key
    pub new_relic_license_key: Option<String>,
    /// External secret holding the license key and, optionally, the Pixie keys
    pub aws_secret_name: Option<String>,
    /// External secret holding only the license key
    pub aws_license_key_secret_name: Option<String>,
    /// External secret holding only the Pixie keys
    pub aws_pixie_secret_name: Option<String>,
    pub pixie_deploy_key: Option<String>,
    pub pixie_api_key: Option<String>,

    pub low_data_mode: Option<bool>,
    pub install_infrastructure: Option<bool>,
    pub install_infrastructure_privileged: Option<bool>,
    #[serde(rename = "installKSM")]
    pub install_ksm: Option<bool>,
    pub install_kube_events: Option<bool>,
    pub install_logging: Option<bool>,
    pub install_metrics_adapter: Option<bool>,
    pub install_prometheus: Option<bool>,
    pub install_pixie: Option<bool>,
    pub install_pixie_integration: Option<bool>,

    /// Free-form chart values, lowest precedence
    pub values: Option<Value>,
}

/// Install toggles with their resolved values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallToggles {
    pub low_data_mode: bool,
    pub infrastructure: bool,
    pub infrastructure_privileged: bool,
    pub ksm: bool,
    pub kube_events: bool,
    pub logging: bool,
    pub metrics_adapter: bool,
    pub prometheus: bool,
    pub pixie: bool,
    pub pixie_integration: bool,
}

impl Default for InstallToggles {
    fn default() -> Self {
        Self {
            low_data_mode: true,
            infrastructure: true,
            infrastructure_privileged: true,
            ksm: true,
            kube_events: true,
            logging: true,
            metrics_adapter: false,
            prometheus: true,
            pixie: false,
            pixie_integration: false,
        }
    }
}

/// Chart coordinates for the Helm release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartRef {
    pub repository: String,
    pub chart: String,
    pub release: String,
    pub version: String,
    pub namespace: String,
}

impl Default for ChartRef {
    fn default() -> Self {
        Self {
            repository: chart::REPOSITORY.to_string(),
            chart: chart::NAME.to_string(),
            release: chart::RELEASE.to_string(),
            version: chart::VERSION.to_string(),
            namespace: chart::NAMESPACE.to_string(),
        }
    }
}

/// Credential inputs as supplied. Exclusivity is checked by the resolver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialInputs {
    pub license_key: Option<String>,
    pub secret_name: Option<String>,
    pub license_secret_name: Option<String>,
    pub pixie_secret_name: Option<String>,
    pub pixie_deploy_key: Option<String>,
    pub pixie_api_key: Option<String>,
}

/// Compiled-in defaults that caller props are merged over.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Defaults {
    pub chart: ChartRef,
    pub toggles: InstallToggles,
}

/// Effective options for one deployment. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct AddOnOptions {
    pub chart: ChartRef,
    pub cluster_name: Option<String>,
    pub credentials: CredentialInputs,
    pub toggles: InstallToggles,
    pub values: Value,
}

impl AddOnOptions {
    pub fn namespace(&self) -> &str {
        &self.chart.namespace
    }
}

/// Build effective options by merging caller props over `defaults`.
///
/// Empty strings count as unset so that blank YAML entries do not select a
/// credential source.
pub fn merge_defaults(props: AddOnProps, defaults: &Defaults) -> AddOnOptions {
    let d = &defaults.toggles;
    let toggles = InstallToggles {
        low_data_mode: props.low_data_mode.unwrap_or(d.low_data_mode),
        infrastructure: props.install_infrastructure.unwrap_or(d.infrastructure),
        infrastructure_privileged: props
            .install_infrastructure_privileged
            .unwrap_or(d.infrastructure_privileged),
        ksm: props.install_ksm.unwrap_or(d.ksm),
        kube_events: props.install_kube_events.unwrap_or(d.kube_events),
        logging: props.install_logging.unwrap_or(d.logging),
        metrics_adapter: props.install_metrics_adapter.unwrap_or(d.metrics_adapter),
        prometheus: props.install_prometheus.unwrap_or(d.prometheus),
        pixie: props.install_pixie.unwrap_or(d.pixie),
        pixie_integration: props.install_pixie_integration.unwrap_or(d.pixie_integration),
    };

    let c = &defaults.chart;
    let chart = ChartRef {
        repository: non_empty(props.repository).unwrap_or_else(|| c.repository.clone()),
        chart: non_empty(props.chart).unwrap_or_else(|| c.chart.clone()),
        release: non_empty(props.release).unwrap_or_else(|| c.release.clone()),
        version: non_empty(props.version).unwrap_or_else(|| c.version.clone()),
        namespace: non_empty(props.namespace).unwrap_or_else(|| c.namespace.clone()),
    };

    let credentials = CredentialInputs {
        license_key: non_empty(props.new_relic_license_key),
        secret_name: non_empty(props.aws_secret_name),
        license_secret_name: non_empty(props.aws_license_key_secret_name),
        pixie_secret_name: non_empty(props.aws_pixie_secret_name),
        pixie_deploy_key: non_empty(props.pixie_deploy_key),
        pixie_api_key: non_empty(props.pixie_api_key),
    };

    AddOnOptions {
        chart,
        cluster_name: non_empty(props.new_relic_cluster_name),
        credentials,
        toggles,
        values: props
            .values
            .filter(Value::is_object)
            .unwrap_or_else(|| Value::Object(Default::default())),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
