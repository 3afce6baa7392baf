//! Parking-Lot Simulation Library
//!
//! A tile-grid parking simulation that can run headless or behind any
//! renderer that consumes its query surface.

pub mod simulation;
