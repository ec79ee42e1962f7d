//! # mokman-efi
//!
//! Firmware interface layer for the MOK manager.
//!
//! The pre-boot environment hands the manager a handful of process-global
//! services: a text console, the non-volatile variable store, the simple
//! filesystem protocol instances, and the shim-lock protocol. This crate
//! models each of them as an injected capability (one object-safe trait per
//! collaborator) so the core never touches ambient state.
//!
//! The `sim` module provides deterministic in-memory implementations of all
//! of them, used by the test suites and the conformance harness.

pub mod console;
pub mod fs;
pub mod guid;
pub mod registry;
pub mod shimlock;
pub mod sim;
pub mod status;
pub mod varstore;

pub use console::{Colour, Console, Key, ScanCode};
pub use fs::{FileHandle, FileInfo, SimpleFileSystem};
pub use guid::Guid;
pub use registry::ProtocolRegistry;
pub use shimlock::{ImageDigests, PeCoffContext, ShimLock};
pub use status::Status;
pub use varstore::VariableStore;
