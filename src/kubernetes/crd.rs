// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::csi::{GROUP, KIND, VERSION};
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use tracing::{debug, info};

/// Check if the Secrets Store CSI driver's SecretProviderClass CRD is served.
///
/// Checked once before planning resources; a missing driver is not waited for.
pub async fn secret_provider_class_available(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[GROUP])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() == GROUP {
            for (ar, _) in group.recommended_resources() {
                if ar.kind == KIND && ar.version == VERSION {
                    info!("{} CRD ({}/{}) is available", KIND, GROUP, VERSION);
                    return Ok(true);
                }
            }
        }
    }

    debug!("{} CRD ({}/{}) not found", KIND, GROUP, VERSION);
    Ok(false)
}
