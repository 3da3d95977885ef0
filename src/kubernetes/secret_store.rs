// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret store reading credentials from Kubernetes secrets in a fixed namespace.

use crate::deploy::SecretStore;
use crate::error::SecretStoreError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
    namespace: String,
}

impl KubeSecretStore {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    async fn get_secret(&self, name: &str) -> Result<BTreeMap<String, String>, SecretStoreError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);

        let secret = secrets.get(name).await.map_err(|e| match e {
            kube::Error::Api(ref response) if response.code == 404 => {
                SecretStoreError::NotFound(name.to_string())
            }
            kube::Error::Api(ref response) if response.code == 403 => {
                SecretStoreError::AccessDenied(name.to_string())
            }
            e => SecretStoreError::Kube(e),
        })?;

        let mut fields = BTreeMap::new();
        for (key, value) in secret.data.unwrap_or_default() {
            let decoded =
                String::from_utf8(value.0).map_err(|_| SecretStoreError::InvalidEncoding {
                    secret: name.to_string(),
                    field: key.clone(),
                })?;
            fields.insert(key, decoded);
        }
        if let Some(string_data) = secret.string_data {
            fields.extend(string_data);
        }

        debug!("Read {} fields from secret {}", fields.len(), name);
        Ok(fields)
    }
}
