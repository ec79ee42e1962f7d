//! # mokman-core
//!
//! Portable core of the MOK (Machine Owner Key) manager: the pre-boot
//! screens and protocols that turn a staged trust-set change into
//! persistent firmware state after operator review.
//!
//! Everything here runs against the capability traits of `mokman-efi`;
//! nothing touches ambient firmware state, so the whole flow is testable
//! against the simulated services.
//!
//! Control flows top-down: [`manager`] builds the top menu, which routes
//! into the review screens ([`screens`]), the delete prompt, or the disk
//! enrollment pipeline ([`browse`]). Data flows bottom-up: [`siglist`]
//! parses bytes into entries, [`inspect`] renders them, and [`mokvars`]
//! persists approved sets.

#![deny(unsafe_code)]

pub mod auth;
pub mod browse;
pub mod inspect;
pub mod line;
pub mod manager;
pub mod menu;
pub mod mokvars;
pub mod screens;
pub mod siglist;

use mokman_efi::{Console, ProtocolRegistry, VariableStore};

/// The injected firmware capabilities a session runs against.
pub struct Services<'a> {
    pub console: &'a mut dyn Console,
    pub vars: &'a mut dyn VariableStore,
    pub registry: &'a mut dyn ProtocolRegistry,
}

impl menu::HasConsole for Services<'_> {
    fn console(&mut self) -> &mut dyn Console {
        &mut *self.console
    }
}
