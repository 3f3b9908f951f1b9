//! Core business logic for CampusPay.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Wallet types, validation rules and money-movement decisions live here.
//!
//! # Modules
//!
//! - `wallet` - Balances, escrow, transfers, withdrawals, direct payments and
//!   gateway reconciliation

pub mod wallet;
