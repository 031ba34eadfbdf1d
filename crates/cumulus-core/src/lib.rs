//! Cumulus Core Types
//!
//! This crate provides the foundational types shared by the Cumulus
//! word-cloud layout engine and its surfaces. It includes:
//!
//! - **Geometry**: Points, sizes, and bounding boxes ([`geometry`] module)
//! - **Units**: Physical pixel to logical unit conversion ([`units`] module)

pub mod geometry;
pub mod units;
