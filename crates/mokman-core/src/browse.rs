//! File enrollment pipeline.
//!
//! Walks the installed filesystems, lets the operator pick a file, and
//! turns it into a one-entry signature list: certificates are validated
//! and wrapped as-is, executables are hashed through the shim-lock
//! protocol. The resulting list goes through the same enroll screen as a
//! staged request, but without the password gate, since no authenticator
//! was ever staged for disk-originated material.

use mokman_efi::{Colour, FileHandle, guid};

use crate::manager::TITLE;
use crate::menu::{self, MenuItem};
use crate::{Services, inspect, line, screens, siglist};

/// Action behind one directory-listing row.
enum Entry {
    Dir(usize),
    File(usize),
}

/// Top of the pipeline: filesystem selection menu.
pub fn enroll_from_disk(svc: &mut Services<'_>, want_hash: bool) {
    let filesystems = svc.registry.filesystems();
    if filesystems.is_empty() {
        svc.console.write("No filesystems?\n");
        return;
    }

    let mut items = vec![MenuItem::exit("Exit", Colour::Yellow)];
    for (index, fs) in filesystems.iter().enumerate() {
        let mut label = fs.device_path();
        if let Some(volume_label) = fs.volume_label() {
            label.push_str(&volume_label);
        }
        items.push(MenuItem::new(label, Colour::Yellow, index));
    }

    menu::run(svc, TITLE, &items, 0, |svc, &index| {
        let Ok(mut root) = filesystems[index].open_volume() else {
            return;
        };
        browse_directory(svc, root.as_mut(), "Return to filesystem list", want_hash);
    });
}

/// One directory screen. Directories recurse, files feed the pipeline.
fn browse_directory(
    svc: &mut Services<'_>,
    dir: &mut dyn FileHandle,
    exit_label: &str,
    want_hash: bool,
) {
    if dir.set_position(0).is_err() {
        svc.console.write("Failed to read directory\n");
        return;
    }
    let mut entries = Vec::new();
    loop {
        match dir.read_dir_entry() {
            Ok(Some(info)) => {
                if info.name != "." && info.name != ".." {
                    entries.push(info);
                }
            }
            Ok(None) => break,
            Err(_) => {
                svc.console.write("Failed to read directory\n");
                return;
            }
        }
    }

    let mut items = vec![MenuItem::exit(exit_label, Colour::Yellow)];
    for (index, info) in entries.iter().enumerate() {
        if info.directory {
            items.push(MenuItem::new(info.name.clone(), Colour::Yellow, Entry::Dir(index)));
        } else {
            items.push(MenuItem::new(info.name.clone(), Colour::White, Entry::File(index)));
        }
    }

    menu::run(svc, TITLE, &items, 0, |svc, entry| match entry {
        Entry::Dir(index) => match dir.open(&entries[*index].name) {
            Ok(mut sub) => browse_directory(svc, sub.as_mut(), "..", want_hash),
            Err(_) => svc.console.write("Failed to read directory\n"),
        },
        Entry::File(index) => match dir.open(&entries[*index].name) {
            Ok(mut file) => enroll_file(svc, file.as_mut(), want_hash),
            Err(_) => svc.console.write("Failed to read file\n"),
        },
    });
}

/// Reads one file and runs the chosen sub-pipeline over it.
fn enroll_file(svc: &mut Services<'_>, file: &mut dyn FileHandle, want_hash: bool) {
    let Ok(data) = file.read_to_end() else {
        svc.console.write("Failed to read file\n");
        return;
    };

    let request = if want_hash {
        let Some(shim) = svc.registry.shim_lock() else {
            return;
        };
        let Ok(context) = shim.context(&data) else {
            return;
        };
        let Ok(digests) = shim.hash(&data, &context) else {
            return;
        };
        siglist::encode_hash(&digests.sha256, &guid::SHIM_LOCK)
    } else {
        if !inspect::is_valid_x509(&data) {
            svc.console.write("Invalid X509 certificate\n");
            line::pause(svc.console);
            return;
        }
        siglist::encode_cert(&data, &guid::SHIM_LOCK)
    };

    screens::enroll_prompt(svc.console, svc.vars, &request, false);
}
