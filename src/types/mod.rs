// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types the add-on creates.

pub mod secret_provider_class;

pub use secret_provider_class::{SecretProviderClass, SecretProviderClassSpec};
