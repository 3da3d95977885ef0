// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Server-side apply of the auxiliary resources that materialize external secrets.

use super::{ensure_namespace_exists, secret_provider_class_available};
use crate::constants::{csi, resources, FIELD_MANAGER};
use crate::deploy::{ClusterApi, ResourceHandle};
use crate::error::{AddonError, Result};
use crate::resolver::KeyMapping;
use crate::types::SecretProviderClass;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    CSIVolumeSource, Container, Pod, PodSpec, Secret, ServiceAccount, Volume, VolumeMount,
};
use kube::{
    api::{ObjectMeta, Patch, PatchParams},
    core::NamespaceResourceScope,
    Api, Client, Resource,
};
use kube_runtime::wait::await_condition;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, info, instrument};

const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

fn metadata(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(BTreeMap::from([(
            MANAGED_BY_LABEL.to_string(),
            FIELD_MANAGER.to_string(),
        )])),
        ..Default::default()
    }
}

/// Service account the placeholder pod runs as
pub fn service_account(name: &str, namespace: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: metadata(name, namespace),
        ..Default::default()
    }
}

/// Pod whose only purpose is mounting the CSI volume, which makes the driver
/// sync the provider class's `secretObjects` into native secrets.
pub fn placeholder_pod(name: &str, namespace: &str, identity: &str, projection: &str) -> Pod {
    Pod {
        metadata: metadata(name, namespace),
        spec: Some(PodSpec {
            service_account_name: Some(identity.to_string()),
            containers: vec![Container {
                name: "secrets-sync".to_string(),
                image: Some(resources::PLACEHOLDER_IMAGE.to_string()),
                command: Some(vec!["sleep".to_string(), "infinity".to_string()]),
                volume_mounts: Some(vec![VolumeMount {
                    name: resources::SECRETS_VOLUME.to_string(),
                    mount_path: resources::SECRETS_MOUNT_PATH.to_string(),
                    read_only: Some(true),
                    ..Default::default()
                }]),
                ..Default::default()
            }],
            volumes: Some(vec![Volume {
                name: resources::SECRETS_VOLUME.to_string(),
                csi: Some(CSIVolumeSource {
                    driver: csi::DRIVER.to_string(),
                    read_only: Some(true),
                    volume_attributes: Some(BTreeMap::from([(
                        "secretProviderClass".to_string(),
                        projection.to_string(),
                    )])),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Opaque secret holding `data` as string data
pub fn native_secret(name: &str, namespace: &str, data: BTreeMap<String, String>) -> Secret {
    Secret {
        metadata: metadata(name, namespace),
        string_data: Some(data),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

/// [`ClusterApi`] backed by a Kubernetes client.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create or update `object` in `namespace` through server-side apply
    async fn apply<K>(&self, kind: &'static str, namespace: &str, object: &K) -> Result<ResourceHandle>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + Debug
            + Serialize
            + DeserializeOwned,
    {
        let name = object.meta().name.clone().unwrap_or_default();
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);

        let pp = PatchParams::apply(FIELD_MANAGER).force();
        api.patch(&name, &pp, &Patch::Apply(object))
            .await
            .map_err(|source| AddonError::ResourceCreationFailure {
                resource: format!("{} {}/{}", kind, namespace, name),
                source,
            })?;

        info!("Applied {} {}/{}", kind, namespace, name);
        Ok(ResourceHandle::namespaced(kind, &name, namespace))
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn projection_driver_available(&self) -> Result<bool> {
        secret_provider_class_available(&self.client).await
    }

    async fn ensure_namespace(&self, name: &str) -> Result<ResourceHandle> {
        ensure_namespace_exists(&self.client, name).await?;
        Ok(ResourceHandle::cluster_scoped("Namespace", name))
    }

    async fn apply_service_identity(&self, name: &str, namespace: &str) -> Result<ResourceHandle> {
        self.apply("ServiceAccount", namespace, &service_account(name, namespace))
            .await
    }

    async fn apply_projection(
        &self,
        name: &str,
        namespace: &str,
        source_secret_name: &str,
        secret_name: &str,
        key_mappings: &[KeyMapping],
    ) -> Result<ResourceHandle> {
        let mut class = SecretProviderClass::for_secret(
            name,
            namespace,
            source_secret_name,
            secret_name,
            key_mappings,
        )?;
        class
            .metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert(MANAGED_BY_LABEL.to_string(), FIELD_MANAGER.to_string());
        debug!(
            "{} {} syncs secrets {:?}",
            csi::KIND,
            name,
            class.synced_secret_names()
        );
        self.apply(csi::KIND, namespace, &class).await
    }

    async fn apply_placeholder_workload(
        &self,
        name: &str,
        namespace: &str,
        identity: &str,
        projection: &str,
    ) -> Result<ResourceHandle> {
        let pod = placeholder_pod(name, namespace, identity, projection);
        self.apply("Pod", namespace, &pod).await
    }

    async fn apply_native_secret(
        &self,
        name: &str,
        namespace: &str,
        data: BTreeMap<String, String>,
    ) -> Result<ResourceHandle> {
        self.apply("Secret", namespace, &native_secret(name, namespace, data))
            .await
    }

    #[instrument(skip(self))]
    async fn await_materialized_secret(
        &self,
        name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<()> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let exists = |secret: Option<&Secret>| secret.is_some();

        match tokio::time::timeout(timeout, await_condition(secrets, name, exists)).await {
            Ok(Ok(_)) => {
                info!("Secret {}/{} is materialized", namespace, name);
                Ok(())
            }
            Ok(Err(e)) => Err(AddonError::SecretWatchFailure(
                format!("{}/{}", namespace, name),
                e,
            )),
            Err(_) => Err(AddonError::SecretMaterializationTimeout(format!(
                "{}/{}",
                namespace, name
            ))),
        }
    }
}
