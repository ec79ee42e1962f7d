//! Scenario replay.
//!
//! Builds a simulated firmware world from a fixture, runs one management
//! session, and evaluates every expectation into a per-check report.

use log::{debug, info};

use mokman_core::{Services, manager, mokvars};
use mokman_efi::guid;
use mokman_efi::sim::{SimConsole, SimFileSystem, SimRegistry, SimShimLock, SimVarStore};
use mokman_efi::{Key, ScanCode};

use crate::scenario::{FixtureError, Scenario, decode_hex};

/// One evaluated expectation.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub description: String,
    pub passed: bool,
}

/// Everything a scenario replay produced.
#[derive(Debug, Clone)]
pub struct Report {
    pub name: String,
    pub checks: Vec<CheckResult>,
    /// Captured console output, for diagnosis of failed checks.
    pub output: String,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

fn script(con: &mut SimConsole, keys: &[String]) -> Result<(), FixtureError> {
    for key in keys {
        match key.as_str() {
            "up" => con.script_scan(ScanCode::Up),
            "down" => con.script_scan(ScanCode::Down),
            "enter" => con.script_keys([Key::enter()]),
            other => {
                if let Some(text) = other.strip_prefix("text:") {
                    con.script_text(text);
                } else if let Some(line) = other.strip_prefix("line:") {
                    con.script_line(line);
                } else {
                    return Err(FixtureError::BadKeystroke(other.to_owned()));
                }
            }
        }
    }
    Ok(())
}

/// Replays one scenario and evaluates its expectations.
pub fn run_scenario(scenario: &Scenario) -> Result<Report, FixtureError> {
    info!("replaying scenario {}", scenario.name);

    let mut con = SimConsole::new();
    script(&mut con, &scenario.keys)?;

    let mut vars = SimVarStore::new();
    if let Some(request) = scenario.request_bytes()? {
        debug!("staging {} request bytes", request.len());
        vars.seed(mokvars::MOK_NEW, &guid::SHIM_LOCK, &request);
    }
    if let Some(digest) = scenario.auth_digest()? {
        vars.seed(mokvars::MOK_AUTH, &guid::SHIM_LOCK, &digest);
    }
    if let Some(mok_list) = &scenario.mok_list {
        let bytes = decode_hex("mok_list", mok_list)?;
        vars.seed(mokvars::MOK_LIST, &guid::SHIM_LOCK, &bytes);
    }

    let mut registry = SimRegistry::new();
    for fs_fixture in &scenario.filesystems {
        let fs = SimFileSystem::new(&fs_fixture.device_path, fs_fixture.label.as_deref());
        for (path, contents) in &fs_fixture.files {
            let bytes = decode_hex("file contents", contents)?;
            fs.add_file(path, &bytes);
        }
        registry.filesystems.push(fs);
    }
    if scenario.shim_lock {
        registry.shim_lock = Some(SimShimLock::new());
    }

    {
        let mut svc = Services {
            console: &mut con,
            vars: &mut vars,
            registry: &mut registry,
        };
        manager::run(&mut svc);
    }

    let mut checks = Vec::new();
    let expect = &scenario.expect;

    if let Some(expected_hex) = &expect.mok_list_hex {
        let expected = decode_hex("expect.mok_list_hex", expected_hex)?;
        let actual = vars.peek(mokvars::MOK_LIST, &guid::SHIM_LOCK);
        checks.push(CheckResult {
            description: "MokList matches expected bytes".into(),
            passed: actual == Some(expected.as_slice()),
        });
    }
    if expect.mok_list_absent {
        checks.push(CheckResult {
            description: "MokList absent".into(),
            passed: vars.peek(mokvars::MOK_LIST, &guid::SHIM_LOCK).is_none(),
        });
    }
    if expect.mok_new_deleted {
        checks.push(CheckResult {
            description: "MokNew deleted".into(),
            passed: vars.peek(mokvars::MOK_NEW, &guid::SHIM_LOCK).is_none(),
        });
    }
    if expect.mok_auth_deleted {
        checks.push(CheckResult {
            description: "MokAuth deleted".into(),
            passed: vars.peek(mokvars::MOK_AUTH, &guid::SHIM_LOCK).is_none(),
        });
    }
    for needle in &expect.output_contains {
        checks.push(CheckResult {
            description: format!("output contains {needle:?}"),
            passed: con.contains(needle),
        });
    }
    for needle in &expect.output_lacks {
        checks.push(CheckResult {
            description: format!("output lacks {needle:?}"),
            passed: !con.contains(needle),
        });
    }

    Ok(Report {
        name: scenario.name.clone(),
        checks,
        output: con.output().to_owned(),
    })
}
