//! Canonical in-memory model representations.
//!
//! - [`gbdt`]: decision trees and forests
//! - [`gblinear`]: linear boosters

pub mod gbdt;
pub mod gblinear;
