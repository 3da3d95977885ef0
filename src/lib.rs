// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod deploy;
pub mod error;
pub mod kubernetes;
pub mod options;
pub mod resolver;
pub mod types;
pub mod values;

#[cfg(test)]
pub mod test_utils;
