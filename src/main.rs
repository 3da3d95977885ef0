// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use tracing::info;

use nri_bundle_addon::config::Config;
use nri_bundle_addon::deploy::{Deployer, HelmCli};
use nri_bundle_addon::kubernetes::{create_target_client, KubeCluster, KubeSecretStore};
use nri_bundle_addon::options::{merge_defaults, AddOnProps, Defaults};
use nri_bundle_addon::resolver::{resolve_and_plan, DeploymentPlan};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting nri-bundle add-on deployer");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: options_file={}, materializer={:?}",
        config.options_file.display(),
        config.materializer
    );

    let raw = tokio::fs::read_to_string(&config.options_file)
        .await
        .with_context(|| format!("Failed to read {}", config.options_file.display()))?;
    let props: AddOnProps = serde_yaml::from_str(&raw)
        .with_context(|| format!("Invalid add-on options in {}", config.options_file.display()))?;

    let options = merge_defaults(props, &Defaults::default());
    let plan = resolve_and_plan(&options, &config.resolve_settings())?;

    if config.dry_run {
        return print_plan(&plan);
    }

    // Create Kubernetes client
    let client = create_target_client(&config).await?;
    info!("Connected to Kubernetes cluster");

    let mut helm = HelmCli::new(&config.helm_bin);
    if let Some(kubeconfig) = &config.target_kubeconfig {
        helm = helm.with_kubeconfig(kubeconfig.display().to_string());
    }

    let deployer = Deployer::new(
        KubeCluster::new(client.clone()),
        KubeSecretStore::new(client, &config.secret_store_namespace),
        helm,
        config.secret_wait_timeout,
    );

    let release = deployer.deploy(&plan).await?;
    info!(
        "Release {}/{} installed at version {}",
        release.namespace, release.release, release.version
    );
    Ok(())
}

fn print_plan(plan: &DeploymentPlan) -> Result<()> {
    println!("# cluster: {}", plan.cluster_name);
    println!("# credentials: {}", plan.strategy);
    for resource in plan.resources.resources() {
        println!("# resource: {}", resource.request);
    }
    print!("{}", serde_yaml::to_string(&plan.values)?);
    Ok(())
}
