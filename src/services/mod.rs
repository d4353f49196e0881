// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod nonce;
pub mod payments;
pub mod siwe;
pub mod world_id;

pub use payments::PaymentService;
pub use siwe::{SiweError, SiwePayload, SiweVerifier};
pub use world_id::{ProofPayload, VerifyOutcome, WorldIdService};
