//! Session orchestrator.
//!
//! Entered by the shim when a MOK change has been staged (or the operator
//! asked for key management). Reads the staged request, runs the top menu,
//! and on the way out deletes the staging variables unconditionally: a
//! staged request is single-use whether it was committed, declined, or
//! never touched.

use mokman_efi::{Colour, Status, guid};

use crate::menu::{self, MenuItem};
use crate::{Services, browse, mokvars, screens};

/// Title row of every management screen.
pub const TITLE: &str = "Shim UEFI key management";

/// Seconds before the top menu auto-selects "Continue boot".
const BOOT_TIMEOUT_SECS: u32 = 10;

/// What each top-menu row does.
enum TopAction<'a> {
    EnrollRequest(&'a [u8]),
    DeleteAll,
    EnrollKeyFromDisk,
    EnrollHashFromDisk,
}

fn enter_mok_menu(svc: &mut Services<'_>, request: Option<&[u8]>) {
    let have_auth = matches!(
        svc.vars.get(mokvars::MOK_AUTH, &guid::SHIM_LOCK),
        Ok(auth) if auth.len() == 32
    );

    let mut items = vec![MenuItem::exit("Continue boot", Colour::White)];
    if let Some(request) = request {
        items.push(MenuItem::new(
            "Enroll MOK",
            Colour::White,
            TopAction::EnrollRequest(request),
        ));
    } else if have_auth {
        items.push(MenuItem::new("Delete MOK", Colour::White, TopAction::DeleteAll));
    }
    items.push(MenuItem::new(
        "Enroll key from disk",
        Colour::White,
        TopAction::EnrollKeyFromDisk,
    ));
    items.push(MenuItem::new(
        "Enroll hash from disk",
        Colour::White,
        TopAction::EnrollHashFromDisk,
    ));

    menu::run(svc, TITLE, &items, BOOT_TIMEOUT_SECS, |svc, action| match action {
        TopAction::EnrollRequest(request) => {
            screens::enroll_prompt(svc.console, svc.vars, request, true);
        }
        TopAction::DeleteAll => screens::delete_prompt(svc.console, svc.vars),
        TopAction::EnrollKeyFromDisk => browse::enroll_from_disk(svc, false),
        TopAction::EnrollHashFromDisk => browse::enroll_from_disk(svc, true),
    });

    svc.console.clear();
}

/// Runs one management session. This is the image entry point minus the
/// firmware handshake: state comes exclusively from the variable store.
pub fn run(svc: &mut Services<'_>) -> Status {
    let request = svc.vars.get(mokvars::MOK_NEW, &guid::SHIM_LOCK).ok();

    enter_mok_menu(svc, request.as_deref());

    // Commit point of the staging lifecycle: the request and its
    // authenticator never survive the session.
    if request.is_some() && svc.vars.delete(mokvars::MOK_NEW, &guid::SHIM_LOCK).is_err() {
        svc.console.write("Failed to delete MokNew\n");
    }
    let _ = svc.vars.delete(mokvars::MOK_AUTH, &guid::SHIM_LOCK);

    Status::Success
}
