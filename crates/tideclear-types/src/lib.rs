//! Tideclear Types - Canonical domain types for batch settlement
//!
//! This crate contains all foundational types for Tideclear with zero
//! dependencies on other tideclear crates. It defines:
//!
//! - Order and interaction entities as they appear on the wire
//! - Token-index resolution over the sorted settlement token list
//! - The complete settlement error taxonomy
//!
//! # Architectural Invariants
//!
//! These types support the core Tideclear safety invariants:
//!
//! 1. An order's owner is never supplied by the caller; it is always
//!    recovered from the order's signature
//! 2. Interactions may never target the custody account
//! 3. A settlement call either fully succeeds or has no effect

pub mod error;
pub mod interaction;
pub mod order;
pub mod token;

pub use error::*;
pub use interaction::*;
pub use order::*;
pub use token::*;

pub use alloy_primitives::{Address, B256, U256};

/// Version of the Tideclear types schema
pub const TYPES_VERSION: &str = "0.1.0";
