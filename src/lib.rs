//! RealTrust Library
//!
//! Core modules for the RealTrust & ApArt Hotel booking-assistance backend.

pub mod analytics;
pub mod calc;
pub mod config;
pub mod db;
pub mod error;
pub mod functions;
pub mod fuzzy;
pub mod offline;
pub mod push;
pub mod worker;
