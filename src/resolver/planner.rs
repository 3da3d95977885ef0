// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Planning of the cluster resources that bridge external secrets into native secrets.

use super::credentials::CredentialStrategy;
use super::SecretMaterializer;
use crate::constants::{resources, secret_fields};
use crate::options::AddOnOptions;
use std::fmt;

/// Position of a request inside a [`ResourcePlan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub usize);

/// One field pulled from an external secret into the materialized native secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMapping {
    pub source_field: String,
    pub destination_alias: String,
    pub destination_key: String,
}

impl KeyMapping {
    fn new(source_field: &str, destination_alias: &str, destination_key: &str) -> Self {
        Self {
            source_field: source_field.to_string(),
            destination_alias: destination_alias.to_string(),
            destination_key: destination_key.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceRequest {
    Namespace {
        name: String,
    },
    ServiceIdentity {
        name: String,
        namespace: String,
    },
    SecretProjection {
        name: String,
        namespace: String,
        source_secret_name: String,
        materialized_secret_name: String,
        key_mappings: Vec<KeyMapping>,
    },
    PlaceholderWorkload {
        name: String,
        namespace: String,
        identity: String,
        mounted_projection: String,
    },
    /// Native secret written directly from the secret store contents
    NativeSecret {
        name: String,
        namespace: String,
        source_secret_name: String,
        key_mappings: Vec<KeyMapping>,
    },
}

impl ResourceRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Namespace { .. } => "Namespace",
            Self::ServiceIdentity { .. } => "ServiceAccount",
            Self::SecretProjection { .. } => "SecretProviderClass",
            Self::PlaceholderWorkload { .. } => "Pod",
            Self::NativeSecret { .. } => "Secret",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Namespace { name }
            | Self::ServiceIdentity { name, .. }
            | Self::SecretProjection { name, .. }
            | Self::PlaceholderWorkload { name, .. }
            | Self::NativeSecret { name, .. } => name,
        }
    }
}

impl fmt::Display for ResourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedResource {
    pub id: RequestId,
    pub request: ResourceRequest,
    pub depends_on: Vec<RequestId>,
}

/// Ordered resource requests; every dependency points at an earlier request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourcePlan {
    resources: Vec<PlannedResource>,
    chart_prerequisites: Vec<RequestId>,
}

impl ResourcePlan {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn resources(&self) -> &[PlannedResource] {
        &self.resources
    }

    pub fn get(&self, id: RequestId) -> Option<&PlannedResource> {
        self.resources.get(id.0)
    }

    /// Requests the chart install has to wait for
    pub fn chart_prerequisites(&self) -> &[RequestId] {
        &self.chart_prerequisites
    }

    pub fn has_projections(&self) -> bool {
        self.resources
            .iter()
            .any(|r| matches!(r.request, ResourceRequest::SecretProjection { .. }))
    }

    /// Group requests into waves whose members only depend on earlier waves.
    pub fn waves(&self) -> Vec<Vec<&PlannedResource>> {
        let mut depth = vec![0usize; self.resources.len()];
        let mut waves: Vec<Vec<&PlannedResource>> = Vec::new();

        for resource in &self.resources {
            let level = resource
                .depends_on
                .iter()
                .map(|dep| depth[dep.0] + 1)
                .max()
                .unwrap_or(0);
            depth[resource.id.0] = level;

            if waves.len() <= level {
                waves.resize_with(level + 1, Vec::new);
            }
            waves[level].push(resource);
        }

        waves
    }

    fn push(&mut self, request: ResourceRequest, depends_on: Vec<RequestId>) -> RequestId {
        let id = RequestId(self.resources.len());
        debug_assert!(depends_on.iter().all(|dep| dep.0 < id.0));
        self.resources.push(PlannedResource {
            id,
            request,
            depends_on,
        });
        id
    }
}

/// One external secret to materialize, with the fields it contributes.
struct SecretChain {
    prefix: &'static str,
    source_secret_name: String,
    key_mappings: Vec<KeyMapping>,
}

/// Name of the native secret materialized from the external secret `source`.
///
/// External secret names may contain characters Kubernetes rejects, so they are
/// lowercased and every run of other characters becomes a single dash.
pub fn materialized_secret_name(source: &str) -> String {
    let mut name = String::with_capacity(source.len());
    for c in source.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
        } else if !name.ends_with('-') {
            name.push('-');
        }
    }
    let name = name.trim_matches('-');
    name.chars().take(253).collect()
}

fn license_mapping() -> KeyMapping {
    KeyMapping::new(
        secret_fields::LICENSE_KEY,
        "nr-license-key",
        secret_fields::LICENSE_KEY_KEY,
    )
}

fn pixie_deploy_mapping() -> KeyMapping {
    KeyMapping::new(
        secret_fields::PIXIE_DEPLOY_KEY,
        "pixie-deploy-key",
        secret_fields::PIXIE_DEPLOY_KEY_KEY,
    )
}

fn pixie_api_mapping() -> KeyMapping {
    KeyMapping::new(
        secret_fields::PIXIE_API_KEY,
        "pixie-api-key",
        secret_fields::PIXIE_API_KEY_KEY,
    )
}

/// Pixie fields the external secret has to supply, given the toggles and plaintext keys
fn pixie_mappings(options: &AddOnOptions) -> Vec<KeyMapping> {
    let mut key_mappings = Vec::new();
    if options.toggles.pixie && options.credentials.pixie_deploy_key.is_none() {
        key_mappings.push(pixie_deploy_mapping());
    }
    if options.toggles.pixie_integration && options.credentials.pixie_api_key.is_none() {
        key_mappings.push(pixie_api_mapping());
    }
    key_mappings
}

fn secret_chains(strategy: &CredentialStrategy, options: &AddOnOptions) -> Vec<SecretChain> {
    match strategy {
        CredentialStrategy::Direct { .. } | CredentialStrategy::None => Vec::new(),
        CredentialStrategy::SingleExternalSecret { secret_name } => {
            let mut key_mappings = vec![license_mapping()];
            key_mappings.extend(pixie_mappings(options));
            vec![SecretChain {
                prefix: resources::COMBINED_PREFIX,
                source_secret_name: secret_name.clone(),
                key_mappings,
            }]
        }
        CredentialStrategy::SplitExternalSecret {
            license_secret_name,
            aux_key_secret_name,
        } => {
            let mut chains = vec![SecretChain {
                prefix: resources::LICENSE_PREFIX,
                source_secret_name: license_secret_name.clone(),
                key_mappings: vec![license_mapping()],
            }];
            // The Pixie secret is only materialized when a Pixie component reads it.
            let key_mappings = pixie_mappings(options);
            if !key_mappings.is_empty() {
                chains.push(SecretChain {
                    prefix: resources::PIXIE_PREFIX,
                    source_secret_name: aux_key_secret_name.clone(),
                    key_mappings,
                });
            }
            chains
        }
    }
}

/// Plan the auxiliary resources needed for `strategy`.
///
/// Direct and absent credentials need nothing. External secrets get one shared
/// namespace and one independent chain per secret, so that secrets with
/// different access policies never share a service account.
pub fn plan_resources(
    strategy: &CredentialStrategy,
    options: &AddOnOptions,
    materializer: SecretMaterializer,
) -> ResourcePlan {
    let mut plan = ResourcePlan::default();
    let chains = secret_chains(strategy, options);
    if chains.is_empty() {
        return plan;
    }

    let namespace = options.namespace().to_string();
    let namespace_id = plan.push(
        ResourceRequest::Namespace {
            name: namespace.clone(),
        },
        vec![],
    );

    for chain in chains {
        let secret_name = materialized_secret_name(&chain.source_secret_name);
        let prerequisite = match materializer {
            SecretMaterializer::ProjectionDriven => {
                let identity = format!("{}-{}", chain.prefix, resources::SERVICE_ACCOUNT_SUFFIX);
                let projection = format!("{}-{}", chain.prefix, resources::PROVIDER_CLASS_SUFFIX);

                let identity_id = plan.push(
                    ResourceRequest::ServiceIdentity {
                        name: identity.clone(),
                        namespace: namespace.clone(),
                    },
                    vec![namespace_id],
                );
                let projection_id = plan.push(
                    ResourceRequest::SecretProjection {
                        name: projection.clone(),
                        namespace: namespace.clone(),
                        source_secret_name: chain.source_secret_name,
                        materialized_secret_name: secret_name,
                        key_mappings: chain.key_mappings,
                    },
                    vec![namespace_id],
                );
                plan.push(
                    ResourceRequest::PlaceholderWorkload {
                        name: format!("{}-{}", chain.prefix, resources::POD_SUFFIX),
                        namespace: namespace.clone(),
                        identity,
                        mounted_projection: projection,
                    },
                    vec![identity_id, projection_id],
                )
            }
            SecretMaterializer::Native => plan.push(
                ResourceRequest::NativeSecret {
                    name: secret_name,
                    namespace: namespace.clone(),
                    source_secret_name: chain.source_secret_name,
                    key_mappings: chain.key_mappings,
                },
                vec![namespace_id],
            ),
        };
        plan.chart_prerequisites.push(prerequisite);
    }

    plan
}
