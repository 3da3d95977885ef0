// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::csi;
use crate::resolver::KeyMapping;
use kube::api::ObjectMeta;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(
    group = "secrets-store.csi.x-k8s.io",
    version = "v1",
    kind = "SecretProviderClass"
)]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct SecretProviderClassSpec {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_objects: Option<Vec<SecretObject>>,
}

/// A native secret the CSI driver syncs from mounted objects
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretObject {
    pub secret_name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: Vec<SecretObjectData>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretObjectData {
    pub object_name: String,
    pub key: String,
}

/// Entry of the AWS provider `objects` parameter
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ProviderObject {
    object_name: String,
    object_type: String,
    jmes_path: Vec<JmesPath>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct JmesPath {
    path: String,
    object_alias: String,
}

impl SecretProviderClass {
    /// Build a provider class that pulls `key_mappings` out of the JSON secret
    /// `source_secret_name` and syncs them into the native secret `secret_name`.
    pub fn for_secret(
        name: &str,
        namespace: &str,
        source_secret_name: &str,
        secret_name: &str,
        key_mappings: &[KeyMapping],
    ) -> Result<Self, serde_yaml::Error> {
        let objects = vec![ProviderObject {
            object_name: source_secret_name.to_string(),
            object_type: csi::OBJECT_TYPE.to_string(),
            jmes_path: key_mappings
                .iter()
                .map(|m| JmesPath {
                    path: m.source_field.clone(),
                    object_alias: m.destination_alias.clone(),
                })
                .collect(),
        }];

        let spec = SecretProviderClassSpec {
            provider: csi::PROVIDER.to_string(),
            parameters: Some(BTreeMap::from([(
                "objects".to_string(),
                serde_yaml::to_string(&objects)?,
            )])),
            secret_objects: Some(vec![SecretObject {
                secret_name: secret_name.to_string(),
                type_: "Opaque".to_string(),
                data: key_mappings
                    .iter()
                    .map(|m| SecretObjectData {
                        object_name: m.destination_alias.clone(),
                        key: m.destination_key.clone(),
                    })
                    .collect(),
            }]),
        };

        let mut class = SecretProviderClass::new(name, spec);
        class.metadata = ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        };
        Ok(class)
    }

    /// Names of the native secrets this class syncs
    pub fn synced_secret_names(&self) -> Vec<&str> {
        self.spec
            .secret_objects
            .iter()
            .flatten()
            .map(|o| o.secret_name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::ResourceExt;

    fn mappings() -> Vec<KeyMapping> {
        vec![
            KeyMapping {
                source_field: "newRelicLicenseKey".to_string(),
                destination_alias: "nr-license-key".to_string(),
                destination_key: "licenseKey".to_string(),
            },
            KeyMapping {
                source_field: "pixieDeployKey".to_string(),
                destination_alias: "pixie-deploy-key".to_string(),
                destination_key: "deploy-key".to_string(),
            },
        ]
    }

    #[test]
    fn test_for_secret_metadata() {
        let class = SecretProviderClass::for_secret(
            "newrelic-secret-provider-class",
            "newrelic",
            "sec1",
            "sec1",
            &mappings(),
        )
        .unwrap();

        assert_eq!(class.name_any(), "newrelic-secret-provider-class");
        assert_eq!(class.namespace().unwrap(), "newrelic");
        assert_eq!(class.spec.provider, "aws");
        assert_eq!(class.synced_secret_names(), vec!["sec1"]);
    }

    #[test]
    fn test_for_secret_objects_parameter() {
        let class =
            SecretProviderClass::for_secret("spc", "newrelic", "prod/nr", "prod-nr", &mappings())
                .unwrap();

        let objects = &class.spec.parameters.as_ref().unwrap()["objects"];
        let parsed: Vec<ProviderObject> = serde_yaml::from_str(objects).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].object_name, "prod/nr");
        assert_eq!(parsed[0].object_type, "secretsmanager");
        assert_eq!(parsed[0].jmes_path[1].path, "pixieDeployKey");
        assert_eq!(parsed[0].jmes_path[1].object_alias, "pixie-deploy-key");
    }

    #[test]
    fn test_for_secret_secret_objects() {
        let class =
            SecretProviderClass::for_secret("spc", "newrelic", "prod/nr", "prod-nr", &mappings())
                .unwrap();

        let secret_objects = class.spec.secret_objects.unwrap();
        assert_eq!(secret_objects[0].secret_name, "prod-nr");
        assert_eq!(
            secret_objects[0].data[0],
            SecretObjectData {
                object_name: "nr-license-key".to_string(),
                key: "licenseKey".to_string(),
            }
        );
    }

    #[test]
    fn test_serializes_with_api_version_and_kind() {
        let class =
            SecretProviderClass::for_secret("spc", "newrelic", "sec1", "sec1", &mappings())
                .unwrap();

        let json = serde_json::to_value(&class).unwrap();

        assert_eq!(json["apiVersion"], "secrets-store.csi.x-k8s.io/v1");
        assert_eq!(json["kind"], "SecretProviderClass");
        assert_eq!(json["spec"]["secretObjects"][0]["type"], "Opaque");
    }
}
