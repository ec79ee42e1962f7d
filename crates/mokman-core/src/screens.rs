//! Review and confirmation screens.
//!
//! The key-list viewer, the enroll prompt, and the delete prompt. These
//! borrow the request bytes from their caller; nothing here owns staged
//! state.

use mokman_efi::{Console, VariableStore};

use crate::siglist::{self, ListVerdict, SignatureEntry};
use crate::{inspect, line, mokvars};

/// Shows the numeric review loop over a staged request.
///
/// Returns `false` when the request holds no recognizable keys (after the
/// "No keys" notice), `true` once the operator types `0` to move on.
pub fn list_keys(con: &mut dyn Console, request: &[u8]) -> bool {
    let mut num = 0usize;
    for verdict in siglist::scan(request) {
        match verdict {
            ListVerdict::Entries(n) => num += n,
            ListVerdict::UnknownType => con.write("Doesn't look like a key or hash\n"),
            ListVerdict::BadHashEntrySize | ListVerdict::BadEntrySize => {
                con.write("Doesn't look like a valid hash\n");
            }
        }
    }

    if num == 0 {
        con.write("No keys\n");
        line::pause(con);
        return false;
    }

    let keys: Vec<SignatureEntry<'_>> = siglist::iterate(request).collect();
    let mut initial = true;
    let mut selection: Option<u64> = None;

    loop {
        con.clear();
        con.write(
            "Input the key number to show the details of the key or\n\
             type '0' to continue\n\n",
        );
        con.write(&format!("{num} key(s) in the new key list\n\n"));

        if let Some(k) = selection {
            if k as usize > num {
                con.write(&format!("[Key {k}]\n"));
                con.write("No such key\n\n");
            } else if !initial && k > 0 {
                con.write(&format!("[Key {k}]\n"));
                inspect::render_entry(con, &keys[k as usize - 1]);
            }
        }

        con.write("Key Number: ");
        match line::read_number(con) {
            None => con.write("\n\n"),
            Some(n) => {
                con.write("\n\n");
                initial = false;
                selection = Some(n);
                if n == 0 {
                    break;
                }
            }
        }
    }
    true
}

/// Review-then-confirm loop gating a commit of `request`.
pub fn enroll_prompt(
    con: &mut dyn Console,
    vars: &mut dyn VariableStore,
    request: &[u8],
    require_auth: bool,
) {
    loop {
        if !list_keys(con, request) {
            return;
        }

        con.write("Enroll the key(s)? (y/n): ");
        let answer = line::read_line(con, 1, true);
        match answer.first().copied().unwrap_or(0) {
            u if u == u16::from(b'y') || u == u16::from(b'Y') => {
                if mokvars::commit(con, vars, request, require_auth).is_err() {
                    con.write("Failed to enroll keys\n");
                }
                return;
            }
            u if u == u16::from(b'n') || u == u16::from(b'N') => return,
            _ => {}
        }
    }
}

/// Single-shot confirmation gating the delete-all commit.
pub fn delete_prompt(con: &mut dyn Console, vars: &mut dyn VariableStore) {
    con.write("Erase all stored keys? (y/N): ");
    let answer = line::read_line(con, 1, true);
    match answer.first().copied().unwrap_or(0) {
        u if u == u16::from(b'y') || u == u16::from(b'Y') => {
            if mokvars::commit(con, vars, &[], true).is_err() {
                con.write("Failed to erase keys\n");
            }
        }
        _ => {}
    }
}
