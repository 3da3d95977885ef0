// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::resolver::{
    MissingClusterNamePolicy, MissingCredentialsPolicy, ResolveSettings, SecretMaterializer,
};
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SECRET_STORE_NAMESPACE: &str = "default";
const DEFAULT_SECRET_WAIT_TIMEOUT_SECS: u64 = 120;

/// Deployer configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// YAML file holding the add-on options
    pub options_file: PathBuf,
    pub on_missing_cluster_name: MissingClusterNamePolicy,
    pub on_missing_credentials: MissingCredentialsPolicy,
    /// Name of the target cluster as known to the infrastructure
    pub infra_cluster_name: Option<String>,
    pub materializer: SecretMaterializer,
    /// Namespace the native secret store reads from
    pub secret_store_namespace: String,
    pub secret_wait_timeout: Duration,
    pub helm_bin: String,
    /// Kubeconfig of the target cluster; the inferred config is used when unset
    pub target_kubeconfig: Option<PathBuf>,
    /// Print the plan and values instead of deploying
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let options_file = env::var("ADDON_OPTIONS_FILE")
            .context("ADDON_OPTIONS_FILE environment variable not set")?;

        let on_missing_cluster_name: MissingClusterNamePolicy =
            parse_var("ON_MISSING_CLUSTER_NAME")?.unwrap_or_default();
        let on_missing_credentials: MissingCredentialsPolicy =
            parse_var("ON_MISSING_CREDENTIALS")?.unwrap_or_default();
        let materializer: SecretMaterializer = parse_var("SECRET_MATERIALIZER")?.unwrap_or_default();
        let secret_wait_timeout = parse_var("SECRET_WAIT_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_SECRET_WAIT_TIMEOUT_SECS));

        let dry_run: bool = env::var("DRY_RUN")
            .unwrap_or("false".to_string())
            .parse()
            .unwrap_or(false);

        Ok(Config {
            options_file: PathBuf::from(options_file),
            on_missing_cluster_name,
            on_missing_credentials,
            infra_cluster_name: optional_var("INFRA_CLUSTER_NAME"),
            materializer,
            secret_store_namespace: optional_var("SECRET_STORE_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_SECRET_STORE_NAMESPACE.to_string()),
            secret_wait_timeout,
            helm_bin: optional_var("HELM_BIN").unwrap_or_else(|| "helm".to_string()),
            target_kubeconfig: optional_var("TARGET_KUBECONFIG").map(PathBuf::from),
            dry_run,
        })
    }

    pub fn resolve_settings(&self) -> ResolveSettings {
        ResolveSettings {
            on_missing_cluster_name: self.on_missing_cluster_name,
            on_missing_credentials: self.on_missing_credentials,
            materializer: self.materializer,
            infra_cluster_name: self.infra_cluster_name.clone(),
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(name)
        .map(|v| v.parse::<T>().map_err(|e| anyhow!("Invalid value for {}: {}", name, e)))
        .transpose()
}
