//! Junction Simulation Library
//!
//! Adaptive traffic-signal simulation for one junction or a coordinated
//! two-junction corridor.

pub mod simulation;
