// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Credential strategy selection and pre-flight validation.

use super::planner::materialized_secret_name;
use super::{MissingClusterNamePolicy, MissingCredentialsPolicy, ResolveSettings};
use crate::error::{AddonError, Result};
use crate::options::{AddOnOptions, CredentialInputs};
use std::fmt;
use tracing::{debug, warn};

/// How the license key reaches the chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// Plaintext key written straight into the values
    Direct { license_key: String },
    /// One external secret holding the license and, optionally, the Pixie keys
    SingleExternalSecret { secret_name: String },
    /// License and Pixie keys in two external secrets with separate access policies
    SplitExternalSecret {
        license_secret_name: String,
        aux_key_secret_name: String,
    },
    None,
}

impl CredentialStrategy {
    /// Whether the strategy pulls from the external secret store
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::SingleExternalSecret { .. } | Self::SplitExternalSecret { .. }
        )
    }
}

impl fmt::Display for CredentialStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { .. } => write!(f, "plaintext license key"),
            Self::SingleExternalSecret { secret_name } => {
                write!(f, "external secret {}", secret_name)
            }
            Self::SplitExternalSecret {
                license_secret_name,
                aux_key_secret_name,
            } => write!(
                f,
                "external secrets {} (license) and {} (pixie)",
                license_secret_name, aux_key_secret_name
            ),
            Self::None => write!(f, "none"),
        }
    }
}

/// Pick the single credential strategy matching the supplied inputs.
pub fn resolve_strategy(
    credentials: &CredentialInputs,
    policy: MissingCredentialsPolicy,
) -> Result<CredentialStrategy> {
    let split_supplied =
        credentials.license_secret_name.is_some() || credentials.pixie_secret_name.is_some();

    let mut sources = Vec::new();
    if credentials.license_key.is_some() {
        sources.push("newRelicLicenseKey");
    }
    if credentials.secret_name.is_some() {
        sources.push("awsSecretName");
    }
    if split_supplied {
        sources.push("awsLicenseKeySecretName/awsPixieSecretName");
    }
    if sources.len() > 1 {
        return Err(AddonError::ConflictingCredentialSources(sources));
    }

    if let Some(license_key) = &credentials.license_key {
        return Ok(CredentialStrategy::Direct {
            license_key: license_key.clone(),
        });
    }

    if let Some(secret_name) = &credentials.secret_name {
        return Ok(CredentialStrategy::SingleExternalSecret {
            secret_name: secret_name.clone(),
        });
    }

    match (&credentials.license_secret_name, &credentials.pixie_secret_name) {
        (Some(license), Some(aux)) => {
            let mut plaintext = Vec::new();
            if credentials.pixie_deploy_key.is_some() {
                plaintext.push("pixieDeployKey");
            }
            if credentials.pixie_api_key.is_some() {
                plaintext.push("pixieApiKey");
            }
            if !plaintext.is_empty() {
                plaintext.push("awsPixieSecretName");
                return Err(AddonError::ConflictingCredentialSources(plaintext));
            }
            return Ok(CredentialStrategy::SplitExternalSecret {
                license_secret_name: license.clone(),
                aux_key_secret_name: aux.clone(),
            });
        }
        (Some(_), None) => {
            return Err(AddonError::IncompleteSplitSecret(
                "awsLicenseKeySecretName",
                "awsPixieSecretName",
            ))
        }
        (None, Some(_)) => {
            return Err(AddonError::IncompleteSplitSecret(
                "awsPixieSecretName",
                "awsLicenseKeySecretName",
            ))
        }
        (None, None) => {}
    }

    match policy {
        MissingCredentialsPolicy::Allow => {
            warn!("No license key configured, the chart must obtain it elsewhere");
            Ok(CredentialStrategy::None)
        }
        MissingCredentialsPolicy::Fail => Err(AddonError::MissingCredentials),
    }
}

/// Determine the New Relic cluster name under the configured policy.
pub fn resolve_cluster_name(
    options: &AddOnOptions,
    policy: MissingClusterNamePolicy,
    infra_cluster_name: Option<&str>,
) -> Result<String> {
    if let Some(name) = &options.cluster_name {
        return Ok(name.clone());
    }

    match policy {
        MissingClusterNamePolicy::Default => match infra_cluster_name {
            Some(name) if !name.is_empty() => {
                debug!("Defaulting New Relic cluster name to '{}'", name);
                Ok(name.to_string())
            }
            _ => Err(AddonError::MissingClusterIdentifier),
        },
        MissingClusterNamePolicy::Fail => Err(AddonError::MissingClusterIdentifier),
    }
}

/// Run all pre-flight credential checks for `options`.
fn native_name(source: &str) -> Result<String> {
    let name = materialized_secret_name(source);
    if name.is_empty() {
        return Err(AddonError::InvalidSecretName(source.to_string()));
    }
    Ok(name)
}

/// Check the external secrets map to distinct, non-empty native secret names.
pub fn validate_secret_names(strategy: &CredentialStrategy) -> Result<()> {
    match strategy {
        CredentialStrategy::SingleExternalSecret { secret_name } => {
            native_name(secret_name)?;
        }
        CredentialStrategy::SplitExternalSecret {
            license_secret_name,
            aux_key_secret_name,
        } => {
            let license = native_name(license_secret_name)?;
            if native_name(aux_key_secret_name)? == license {
                return Err(AddonError::SecretNameCollision(
                    license_secret_name.clone(),
                    aux_key_secret_name.clone(),
                    license,
                ));
            }
        }
        CredentialStrategy::Direct { .. } | CredentialStrategy::None => {}
    }
    Ok(())
}

pub(crate) fn preflight(
    options: &AddOnOptions,
    settings: &ResolveSettings,
) -> Result<(CredentialStrategy, String)> {
    let strategy = resolve_strategy(&options.credentials, settings.on_missing_credentials)?;
    validate_secret_names(&strategy)?;
    let cluster_name = resolve_cluster_name(
        options,
        settings.on_missing_cluster_name,
        settings.infra_cluster_name.as_deref(),
    )?;

    let has_pixie_secret = strategy.is_external();
    if options.toggles.pixie
        && options.credentials.pixie_deploy_key.is_none()
        && !has_pixie_secret
    {
        warn!("Pixie is enabled without a deploy key source");
    }
    if options.toggles.pixie_integration
        && options.credentials.pixie_api_key.is_none()
        && !has_pixie_secret
    {
        warn!("Pixie integration is enabled without an API key source");
    }

    Ok((strategy, cluster_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{merge_defaults, AddOnProps, Defaults};

    fn inputs() -> CredentialInputs {
        CredentialInputs::default()
    }

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_direct_strategy() {
        let credentials = CredentialInputs {
            license_key: some("abc"),
            ..inputs()
        };

        let strategy = resolve_strategy(&credentials, MissingCredentialsPolicy::Fail).unwrap();

        assert_eq!(
            strategy,
            CredentialStrategy::Direct {
                license_key: "abc".to_string()
            }
        );
        assert!(!strategy.is_external());
    }

    #[test]
    fn test_single_external_secret_strategy() {
        let credentials = CredentialInputs {
            secret_name: some("sec1"),
            ..inputs()
        };

        let strategy = resolve_strategy(&credentials, MissingCredentialsPolicy::Fail).unwrap();

        assert_eq!(
            strategy,
            CredentialStrategy::SingleExternalSecret {
                secret_name: "sec1".to_string()
            }
        );
        assert!(strategy.is_external());
    }

    #[test]
    fn test_single_external_secret_with_plaintext_pixie_key() {
        let credentials = CredentialInputs {
            secret_name: some("sec1"),
            pixie_deploy_key: some("xyz"),
            ..inputs()
        };

        let strategy = resolve_strategy(&credentials, MissingCredentialsPolicy::Fail).unwrap();

        assert_eq!(
            strategy,
            CredentialStrategy::SingleExternalSecret {
                secret_name: "sec1".to_string()
            }
        );
    }

    #[test]
    fn test_split_external_secret_strategy() {
        let credentials = CredentialInputs {
            license_secret_name: some("nr-license"),
            pixie_secret_name: some("nr-pixie"),
            ..inputs()
        };

        let strategy = resolve_strategy(&credentials, MissingCredentialsPolicy::Fail).unwrap();

        assert_eq!(
            strategy,
            CredentialStrategy::SplitExternalSecret {
                license_secret_name: "nr-license".to_string(),
                aux_key_secret_name: "nr-pixie".to_string(),
            }
        );
    }

    #[test]
    fn test_conflicting_sources() {
        let cases = [
            CredentialInputs {
                license_key: some("abc"),
                secret_name: some("sec1"),
                ..inputs()
            },
            CredentialInputs {
                license_key: some("abc"),
                license_secret_name: some("nr-license"),
                pixie_secret_name: some("nr-pixie"),
                ..inputs()
            },
            CredentialInputs {
                secret_name: some("sec1"),
                license_secret_name: some("nr-license"),
                ..inputs()
            },
            CredentialInputs {
                license_key: some("abc"),
                secret_name: some("sec1"),
                pixie_secret_name: some("nr-pixie"),
                ..inputs()
            },
        ];

        for credentials in cases {
            let err = resolve_strategy(&credentials, MissingCredentialsPolicy::Allow).unwrap_err();
            assert!(
                matches!(err, AddonError::ConflictingCredentialSources(ref s) if s.len() >= 2),
                "unexpected result for {:?}: {}",
                credentials,
                err
            );
        }
    }

    #[test]
    fn test_split_secret_with_plaintext_pixie_key_conflicts() {
        let credentials = CredentialInputs {
            license_secret_name: some("nr-license"),
            pixie_secret_name: some("nr-pixie"),
            pixie_api_key: some("key"),
            ..inputs()
        };

        let err = resolve_strategy(&credentials, MissingCredentialsPolicy::Fail).unwrap_err();

        assert!(matches!(err, AddonError::ConflictingCredentialSources(_)));
    }

    #[test]
    fn test_incomplete_split_secret() {
        let credentials = CredentialInputs {
            license_secret_name: some("nr-license"),
            ..inputs()
        };

        let err = resolve_strategy(&credentials, MissingCredentialsPolicy::Fail).unwrap_err();

        assert!(matches!(err, AddonError::IncompleteSplitSecret(..)));
    }

    #[test]
    fn test_no_credentials_allowed() {
        let strategy = resolve_strategy(&inputs(), MissingCredentialsPolicy::Allow).unwrap();
        assert_eq!(strategy, CredentialStrategy::None);
    }

    #[test]
    fn test_no_credentials_fail_policy() {
        let err = resolve_strategy(&inputs(), MissingCredentialsPolicy::Fail).unwrap_err();
        assert!(matches!(err, AddonError::MissingCredentials));
    }

    #[test]
    fn test_cluster_name_explicit_wins() {
        let options = merge_defaults(
            AddOnProps {
                new_relic_cluster_name: some("nr-name"),
                ..Default::default()
            },
            &Defaults::default(),
        );

        for policy in [MissingClusterNamePolicy::Default, MissingClusterNamePolicy::Fail] {
            let name = resolve_cluster_name(&options, policy, Some("eks-name")).unwrap();
            assert_eq!(name, "nr-name");
        }
    }

    #[test]
    fn test_cluster_name_defaults_to_infra_name() {
        let options = merge_defaults(AddOnProps::default(), &Defaults::default());

        let name =
            resolve_cluster_name(&options, MissingClusterNamePolicy::Default, Some("eks-name"))
                .unwrap();

        assert_eq!(name, "eks-name");
    }

    #[test]
    fn test_cluster_name_missing() {
        let options = merge_defaults(AddOnProps::default(), &Defaults::default());

        let err = resolve_cluster_name(&options, MissingClusterNamePolicy::Default, None)
            .unwrap_err();
        assert!(matches!(err, AddonError::MissingClusterIdentifier));

        let err =
            resolve_cluster_name(&options, MissingClusterNamePolicy::Fail, Some("eks-name"))
                .unwrap_err();
        assert!(matches!(err, AddonError::MissingClusterIdentifier));
    }

    #[test]
    fn test_display_hides_license_key() {
        let strategy = CredentialStrategy::Direct {
            license_key: "abc".to_string(),
        };

        assert_eq!(strategy.to_string(), "plaintext license key");
    }

    #[test]
    fn test_secret_name_without_usable_characters() {
        let strategy = CredentialStrategy::SingleExternalSecret {
            secret_name: "___".to_string(),
        };

        let err = validate_secret_names(&strategy).unwrap_err();

        assert!(matches!(err, AddonError::InvalidSecretName(ref name) if name == "___"));
    }

    #[test]
    fn test_split_secret_names_collide_after_sanitizing() {
        let strategy = CredentialStrategy::SplitExternalSecret {
            license_secret_name: "nr/Keys".to_string(),
            aux_key_secret_name: "nr-keys".to_string(),
        };

        let err = validate_secret_names(&strategy).unwrap_err();

        match err {
            AddonError::SecretNameCollision(license, pixie, native) => {
                assert_eq!(license, "nr/Keys");
                assert_eq!(pixie, "nr-keys");
                assert_eq!(native, "nr-keys");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_distinct_secret_names_are_valid() {
        let strategy = CredentialStrategy::SplitExternalSecret {
            license_secret_name: "nr/license".to_string(),
            aux_key_secret_name: "nr/pixie".to_string(),
        };

        validate_secret_names(&strategy).unwrap();
    }
}
