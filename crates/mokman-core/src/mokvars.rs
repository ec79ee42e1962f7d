//! Variable commit layer.
//!
//! Turns an approved trust set into persistent state. `MokList` is only
//! ever written with append semantics, so each commit concatenates onto the
//! accumulated set; the delete-all commit is a zero-length append, which the
//! firmware defines as a full clear.

use mokman_efi::guid;
use mokman_efi::varstore::attr;
use mokman_efi::{Console, Status, VariableStore};

use crate::auth;

/// Staged trust-set candidate, created by the OS-side stager.
pub const MOK_NEW: &str = "MokNew";

/// Authenticator digest paired with the staged request.
pub const MOK_AUTH: &str = "MokAuth";

/// The persistent trust set the shim consults.
pub const MOK_LIST: &str = "MokList";

const MOK_LIST_ATTRIBUTES: u32 = attr::NON_VOLATILE | attr::BOOTSERVICE_ACCESS | attr::APPEND_WRITE;

/// Appends `trust_set` onto the persistent trust variable.
pub fn append(vars: &mut dyn VariableStore, trust_set: &[u8]) -> Result<(), Status> {
    vars.set(MOK_LIST, &guid::SHIM_LOCK, MOK_LIST_ATTRIBUTES, trust_set)
}

/// Removes every entry from the persistent trust variable.
pub fn clear(vars: &mut dyn VariableStore) -> Result<(), Status> {
    vars.set(MOK_LIST, &guid::SHIM_LOCK, MOK_LIST_ATTRIBUTES, &[])
}

/// Commits `request`: authenticates first when `require_auth`, then appends
/// a non-empty request or clears on an empty one. Store failures are
/// reported to the operator and propagated.
pub fn commit(
    con: &mut dyn Console,
    vars: &mut dyn VariableStore,
    request: &[u8],
    require_auth: bool,
) -> Result<(), Status> {
    if require_auth {
        auth::authenticate(con, vars, request)?;
    }

    let result = if request.is_empty() {
        clear(vars)
    } else {
        append(vars, request)
    };

    if let Err(status) = result {
        con.write(&format!("Failed to set variable {status}\n"));
        return Err(status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mokman_efi::sim::{SimConsole, SimVarStore};

    #[test]
    fn test_append_concatenates() {
        let mut vars = SimVarStore::new();
        append(&mut vars, b"list-a").unwrap();
        append(&mut vars, b"list-b").unwrap();
        assert_eq!(
            vars.peek(MOK_LIST, &guid::SHIM_LOCK),
            Some(b"list-alist-b".as_slice())
        );
    }

    #[test]
    fn test_clear_empties() {
        let mut vars = SimVarStore::new();
        append(&mut vars, b"list-a").unwrap();
        clear(&mut vars).unwrap();
        assert_eq!(vars.peek(MOK_LIST, &guid::SHIM_LOCK), None);
    }

    #[test]
    fn test_commit_without_auth() {
        let mut con = SimConsole::new();
        let mut vars = SimVarStore::new();
        commit(&mut con, &mut vars, b"from-disk", false).unwrap();
        assert_eq!(
            vars.peek(MOK_LIST, &guid::SHIM_LOCK),
            Some(b"from-disk".as_slice())
        );
    }

    #[test]
    fn test_commit_with_auth_gate() {
        let mut con = SimConsole::new();
        let mut vars = SimVarStore::new();
        let digest = auth::compute_pw_hash(b"staged", &"goodpass".encode_utf16().collect::<Vec<_>>());
        vars.seed(MOK_AUTH, &guid::SHIM_LOCK, &digest);

        con.script_line("badpass1");
        con.script_line("badpass2");
        con.script_line("badpass3");
        assert_eq!(
            commit(&mut con, &mut vars, b"staged", true),
            Err(Status::AccessDenied)
        );
        assert_eq!(vars.peek(MOK_LIST, &guid::SHIM_LOCK), None);

        con.script_line("goodpass");
        commit(&mut con, &mut vars, b"staged", true).unwrap();
        assert_eq!(
            vars.peek(MOK_LIST, &guid::SHIM_LOCK),
            Some(b"staged".as_slice())
        );
    }

    #[test]
    fn test_commit_empty_clears() {
        let mut con = SimConsole::new();
        let mut vars = SimVarStore::new();
        append(&mut vars, b"old").unwrap();
        let digest = auth::compute_pw_hash(&[], &"erase-me!".encode_utf16().collect::<Vec<_>>());
        vars.seed(MOK_AUTH, &guid::SHIM_LOCK, &digest);
        con.script_line("erase-me!");
        commit(&mut con, &mut vars, &[], true).unwrap();
        assert_eq!(vars.peek(MOK_LIST, &guid::SHIM_LOCK), None);
    }
}
