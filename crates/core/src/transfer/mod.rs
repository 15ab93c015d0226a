//! Transfer engine.
//!
//! This module provides:
//! - Account-to-account transfers
//! - QR intent generation and payment
//! - Self-deposits
//! - Execution of claimed scheduled transfers

mod engine;
mod types;

#[cfg(test)]
mod props;

pub use engine::TransferEngine;
pub use types::{
    DepositResult, QrCodeResult, QrGenerateRequest, QrPayRequest, QrPayResult, SelfDepositRequest,
    TransferRequest, TransferResult,
};
