// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod cycle;
pub mod error;
pub mod format;
pub mod metrics;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod telegram;
