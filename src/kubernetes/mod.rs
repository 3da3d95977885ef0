// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes-backed collaborators: client creation, CRD discovery, resource apply and secret reads.

pub mod client;
pub mod crd;
pub mod namespaces;
pub mod resources;
pub mod secret_store;

pub use client::create_target_client;
pub use crd::secret_provider_class_available;
pub use namespaces::ensure_namespace_exists;
pub use resources::KubeCluster;
pub use secret_store::KubeSecretStore;
