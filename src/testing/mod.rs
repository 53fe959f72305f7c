//! Synthetic recordings with analytically known results.
//!
//! Used by unit tests, integration tests and the `gauge_factor synth`
//! command to produce shots whose gauge factor and wave speed are known.

pub mod synthetic;

pub use synthetic::SyntheticShot;
