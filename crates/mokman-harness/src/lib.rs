//! # mokman-harness
//!
//! Conformance tooling for the MOK manager: scenario fixtures describe a
//! staged request, a keystroke script, and the expected post-state; the
//! runner replays them against the simulated firmware and reports every
//! check. The built-in set covers the canonical end-to-end scenarios.

pub mod builtin;
pub mod runner;
pub mod scenario;

pub use runner::{CheckResult, Report, run_scenario};
pub use scenario::{Expectations, FixtureError, FsFixture, Part, Scenario};

/// Demo certificate used by the built-in scenarios (a throwaway self-signed
/// CA, DER form).
pub const DEMO_CERT: &[u8] = include_bytes!("data/demo_cert.der");
