//! Built-in scenario set.
//!
//! The canonical end-to-end sessions, expressed as ordinary fixtures so
//! `mokman-harness run --builtin` and the fixture format exercise exactly
//! the same path.

use mokman_core::siglist;
use mokman_efi::guid;

use crate::DEMO_CERT;
use crate::scenario::{Expectations, FsFixture, Part, Scenario};

fn cert_part() -> Part {
    Part::CertDer {
        hex: hex::encode(DEMO_CERT),
    }
}

fn cert_list_hex() -> String {
    hex::encode(siglist::encode_cert(DEMO_CERT, &guid::SHIM_LOCK))
}

fn keys(script: &[&str]) -> Vec<String> {
    script.iter().map(|s| (*s).to_owned()).collect()
}

/// The six canonical sessions.
pub fn builtin_scenarios() -> Vec<Scenario> {
    let mut malformed_request = siglist::encode_cert(DEMO_CERT, &guid::SHIM_LOCK);
    malformed_request.extend_from_slice(&[0xab; 40]);

    vec![
        Scenario {
            name: "enroll-accept".into(),
            staged: vec![cert_part()],
            password: Some("hunter2".into()),
            mok_list: None,
            filesystems: vec![],
            shim_lock: false,
            keys: keys(&[
                "down", "enter", "line:0", "line:y", "line:hunter2", "enter",
            ]),
            expect: Expectations {
                mok_list_hex: Some(cert_list_hex()),
                mok_new_deleted: true,
                mok_auth_deleted: true,
                output_contains: vec!["1 key(s) in the new key list".into()],
                ..Default::default()
            },
        },
        Scenario {
            name: "enroll-decline".into(),
            staged: vec![cert_part()],
            password: Some("hunter2".into()),
            mok_list: None,
            filesystems: vec![],
            shim_lock: false,
            keys: keys(&["down", "enter", "line:0", "line:n", "enter"]),
            expect: Expectations {
                mok_list_absent: true,
                mok_new_deleted: true,
                mok_auth_deleted: true,
                ..Default::default()
            },
        },
        Scenario {
            name: "password-lockout".into(),
            staged: vec![cert_part()],
            password: Some("the real one".into()),
            mok_list: None,
            filesystems: vec![],
            shim_lock: false,
            keys: keys(&[
                "down",
                "enter",
                "line:0",
                "line:y",
                "line:not it 1",
                "line:not it 2",
                "line:not it 3",
                "enter",
            ]),
            expect: Expectations {
                mok_list_absent: true,
                mok_new_deleted: true,
                mok_auth_deleted: true,
                output_contains: vec![
                    "Password doesn't match".into(),
                    "Failed to enroll keys".into(),
                ],
                ..Default::default()
            },
        },
        Scenario {
            name: "delete-all".into(),
            staged: vec![],
            password: Some("erase-pass".into()),
            mok_list: Some(hex::encode(b"previously accumulated lists")),
            filesystems: vec![],
            shim_lock: false,
            keys: keys(&["down", "enter", "line:y", "line:erase-pass", "enter"]),
            expect: Expectations {
                mok_list_absent: true,
                mok_auth_deleted: true,
                output_contains: vec!["Erase all stored keys? (y/N): ".into()],
                ..Default::default()
            },
        },
        Scenario {
            name: "disk-import-cert".into(),
            staged: vec![],
            password: None,
            mok_list: None,
            filesystems: vec![FsFixture {
                device_path: "PciRoot(0x0)/Pci(0x1,0x1)/Sata(0x0)/HD(1)".into(),
                label: Some("ESP".into()),
                files: [("keys/vendor.der".to_owned(), hex::encode(DEMO_CERT))]
                    .into_iter()
                    .collect(),
            }],
            shim_lock: false,
            keys: keys(&[
                "down", "enter", // Enroll key from disk
                "down", "enter", // the filesystem
                "down", "enter", // keys/
                "down", "enter", // vendor.der
                "line:1", "line:0", "line:y", // review and accept
                "enter", "enter", "enter", "enter", // unwind to Continue boot
            ]),
            expect: Expectations {
                mok_list_hex: Some(cert_list_hex()),
                output_contains: vec!["Serial Number:".into()],
                output_lacks: vec!["Password(".into()],
                ..Default::default()
            },
        },
        Scenario {
            name: "malformed-staged-request".into(),
            staged: vec![
                cert_part(),
                Part::Raw {
                    hex: "ab".repeat(40),
                },
            ],
            password: Some("longenough".into()),
            mok_list: None,
            filesystems: vec![],
            shim_lock: false,
            keys: keys(&[
                "down",
                "enter",
                "line:0",
                "line:y",
                "line:longenough",
                "enter",
            ]),
            expect: Expectations {
                mok_list_hex: Some(hex::encode(&malformed_request)),
                mok_new_deleted: true,
                mok_auth_deleted: true,
                output_contains: vec!["1 key(s) in the new key list".into()],
                ..Default::default()
            },
        },
    ]
}
