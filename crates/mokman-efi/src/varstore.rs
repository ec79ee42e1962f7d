//! Non-volatile variable store capability.

use crate::guid::Guid;
use crate::status::Status;

/// Variable attribute bits.
pub mod attr {
    pub const NON_VOLATILE: u32 = 0x0000_0001;
    pub const BOOTSERVICE_ACCESS: u32 = 0x0000_0002;
    pub const RUNTIME_ACCESS: u32 = 0x0000_0004;
    /// Append-write: the data is concatenated onto the existing value. A
    /// zero-length append-write removes every entry (full clear).
    pub const APPEND_WRITE: u32 = 0x0000_0040;
}

/// The variable store capability.
///
/// Writes are serialized by the firmware; callers hold no locks.
pub trait VariableStore {
    /// Reads the full value of a variable.
    fn get(&self, name: &str, vendor: &Guid) -> Result<Vec<u8>, Status>;

    /// Writes a variable with the given attributes. With
    /// [`attr::APPEND_WRITE`], `data` is concatenated onto the current
    /// value, and an empty `data` clears the variable.
    fn set(
        &mut self,
        name: &str,
        vendor: &Guid,
        attributes: u32,
        data: &[u8],
    ) -> Result<(), Status>;

    /// Deletes a variable. `Err(Status::NotFound)` if it does not exist.
    fn delete(&mut self, name: &str, vendor: &Guid) -> Result<(), Status>;
}
