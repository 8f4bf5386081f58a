//! BranchLedger - a UTXO ledger that keeps every fork and follows the deepest one
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Block tree, per-block UTXO snapshots and fork choice
//! - [`transaction`] - Transaction types and validation against a snapshot
//! - [`mempool`] - Transactions waiting to be included in a block
//!
//! ## Cryptography
//! - [`crypto`] - Signatures and verification (secp256k1)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`logging`] - Tracing subscriber setup
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;
