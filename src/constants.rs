// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The field manager name used for server-side apply
pub const FIELD_MANAGER: &str = "nri-bundle-addon";

/// Compiled-in chart coordinates
pub mod chart {
    pub const REPOSITORY: &str = "https://helm-charts.newrelic.com";
    pub const NAME: &str = "nri-bundle";
    pub const RELEASE: &str = "newrelic-bundle";
    pub const VERSION: &str = "4.2.0-beta";
    pub const NAMESPACE: &str = "newrelic";
}

/// Field names inside the external secret and keys of the materialized native secret
pub mod secret_fields {
    /// Field holding the license key in the external secret
    pub const LICENSE_KEY: &str = "newRelicLicenseKey";
    /// Field holding the Pixie deploy key in the external secret
    pub const PIXIE_DEPLOY_KEY: &str = "pixieDeployKey";
    /// Field holding the Pixie API key in the external secret
    pub const PIXIE_API_KEY: &str = "pixieApiKey";

    /// Key of the license in the materialized secret
    pub const LICENSE_KEY_KEY: &str = "licenseKey";
    /// The Pixie chart only reads this key from `customDeployKeySecret`
    pub const PIXIE_DEPLOY_KEY_KEY: &str = "deploy-key";
    pub const PIXIE_API_KEY_KEY: &str = "pixieApiKey";
}

/// Names of the auxiliary resources created to materialize external secrets
pub mod resources {
    pub const COMBINED_PREFIX: &str = "newrelic-secret";
    pub const LICENSE_PREFIX: &str = "newrelic-license-secret";
    pub const PIXIE_PREFIX: &str = "newrelic-pixie-secret";

    pub const SERVICE_ACCOUNT_SUFFIX: &str = "sa";
    pub const PROVIDER_CLASS_SUFFIX: &str = "provider-class";
    pub const POD_SUFFIX: &str = "pod";

    pub const PLACEHOLDER_IMAGE: &str = "public.ecr.aws/docker/library/busybox:1.36";
    pub const SECRETS_MOUNT_PATH: &str = "/mnt/secrets-store";
    pub const SECRETS_VOLUME: &str = "secrets-store-inline";
}

/// Secrets Store CSI driver coordinates
pub mod csi {
    pub const DRIVER: &str = "secrets-store.csi.k8s.io";
    pub const GROUP: &str = "secrets-store.csi.x-k8s.io";
    pub const KIND: &str = "SecretProviderClass";
    pub const VERSION: &str = "v1";
    pub const PROVIDER: &str = "aws";
    pub const OBJECT_TYPE: &str = "secretsmanager";
}
