//! Password-hash authenticator.
//!
//! A staged request is bound to the operator session that created it by a
//! digest the OS-side stager leaves in `MokAuth`:
//! `SHA-256(request_bytes ‖ password_utf16_codepoints)`. The password is
//! hashed as the raw little-endian UTF-16 code units the console delivered,
//! with no length prefix, terminator, or normalization; that is the
//! contract with the stager and must not change.

use mokman_efi::guid;
use mokman_efi::{Console, Status, VariableStore};
use sha2::{Digest, Sha256};

use crate::line;
use crate::mokvars;

/// Longest password read from the console, in UTF-16 code units.
pub const PASSWORD_MAX: usize = 16;

/// Advisory minimum length. Shorter attempts are warned about but still
/// hashed and compared, to keep the check shape identical to the stager's.
pub const PASSWORD_MIN: usize = 8;

/// Attempts allowed before the commit is refused.
const MAX_ATTEMPTS: u32 = 3;

/// The digest bound to `request` and `password`.
pub fn compute_pw_hash(request: &[u8], password: &[u16]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    if !request.is_empty() {
        hasher.update(request);
    }
    for unit in password {
        hasher.update(unit.to_le_bytes());
    }
    hasher.finalize().into()
}

/// Prompts for the session password, at most three times, and verifies the
/// candidate digest against `MokAuth`.
pub fn authenticate(
    con: &mut dyn Console,
    vars: &dyn VariableStore,
    request: &[u8],
) -> Result<(), Status> {
    let auth = match vars.get(mokvars::MOK_AUTH, &guid::SHIM_LOCK) {
        Ok(auth) => auth,
        Err(status) => {
            con.write(&format!("Failed to get MokAuth {status}\n"));
            return Err(status);
        }
    };
    if auth.len() != 32 {
        con.write(&format!(
            "Failed to get MokAuth {}\n",
            Status::InvalidParameter
        ));
        return Err(Status::InvalidParameter);
    }

    for _ in 0..MAX_ATTEMPTS {
        con.write(&format!(
            "Password({PASSWORD_MIN}-{PASSWORD_MAX} characters): "
        ));
        let password = line::read_line(con, PASSWORD_MAX, false);

        if password.len() < PASSWORD_MIN {
            con.write(&format!(
                "At least {PASSWORD_MIN} characters for the password\n"
            ));
        }

        let candidate = compute_pw_hash(request, &password);
        if candidate[..] == auth[..] {
            return Ok(());
        }
        con.write("Password doesn't match\n");
    }

    Err(Status::AccessDenied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mokman_efi::sim::{SimConsole, SimVarStore};

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn seed_auth(vars: &mut SimVarStore, request: &[u8], password: &str) {
        let digest = compute_pw_hash(request, &utf16(password));
        vars.seed(mokvars::MOK_AUTH, &guid::SHIM_LOCK, &digest);
    }

    #[test]
    fn test_hash_is_request_then_utf16le() {
        let digest = compute_pw_hash(b"req", &utf16("ab"));
        let mut hasher = Sha256::new();
        hasher.update(b"req");
        hasher.update([b'a', 0, b'b', 0]);
        let expected: [u8; 32] = hasher.finalize().into();
        assert_eq!(digest, expected);
    }

    #[test]
    fn test_empty_request_hashes_password_only() {
        let digest = compute_pw_hash(&[], &utf16("pw"));
        let mut hasher = Sha256::new();
        hasher.update([b'p', 0, b'w', 0]);
        let expected: [u8; 32] = hasher.finalize().into();
        assert_eq!(digest, expected);
    }

    #[test]
    fn test_accepts_matching_password() {
        let mut con = SimConsole::new();
        let mut vars = SimVarStore::new();
        seed_auth(&mut vars, b"request", "hunter22");
        con.script_line("hunter22");
        assert_eq!(authenticate(&mut con, &vars, b"request"), Ok(()));
    }

    #[test]
    fn test_retries_then_denies() {
        let mut con = SimConsole::new();
        let mut vars = SimVarStore::new();
        seed_auth(&mut vars, b"request", "rightpass");
        for _ in 0..3 {
            con.script_line("wrongpass");
        }
        assert_eq!(
            authenticate(&mut con, &vars, b"request"),
            Err(Status::AccessDenied)
        );
        assert_eq!(con.output().matches("Password doesn't match").count(), 3);
    }

    #[test]
    fn test_second_attempt_can_succeed() {
        let mut con = SimConsole::new();
        let mut vars = SimVarStore::new();
        seed_auth(&mut vars, &[], "deletepw");
        con.script_line("nope nope");
        con.script_line("deletepw");
        assert_eq!(authenticate(&mut con, &vars, &[]), Ok(()));
    }

    #[test]
    fn test_short_password_warned_but_checked() {
        let mut con = SimConsole::new();
        let mut vars = SimVarStore::new();
        seed_auth(&mut vars, &[], "abc");
        con.script_line("abc");
        assert_eq!(authenticate(&mut con, &vars, &[]), Ok(()));
        assert!(con.contains("At least 8 characters for the password"));
    }

    #[test]
    fn test_missing_auth_variable() {
        let mut con = SimConsole::new();
        let vars = SimVarStore::new();
        assert_eq!(
            authenticate(&mut con, &vars, &[]),
            Err(Status::NotFound)
        );
        assert!(con.contains("Failed to get MokAuth EFI_NOT_FOUND"));
    }

    #[test]
    fn test_wrong_sized_auth_variable() {
        let mut con = SimConsole::new();
        let mut vars = SimVarStore::new();
        vars.seed(mokvars::MOK_AUTH, &guid::SHIM_LOCK, &[0u8; 16]);
        assert_eq!(
            authenticate(&mut con, &vars, &[]),
            Err(Status::InvalidParameter)
        );
    }
}
