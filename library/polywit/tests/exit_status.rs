// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Checks how replay processes end. Every `child_*` test does nothing unless it was started by
//! `run_child`, which re-executes this test binary with a trace file and reports how the child
//! process exited.

use polywit::exit_codes;
use polywit::{ReplayTrace, assume, replay_from_env, verifier};
use polywit_metadata::TRACE_ENV_VAR;
use std::process::{Command, Output};

const CHILD_ENV_VAR: &str = "POLYWIT_TEST_CHILD";

fn is_child() -> bool {
    std::env::var_os(CHILD_ENV_VAR).is_some()
}

fn run_child(test_name: &str, tokens: &[&str]) -> Output {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("trace.json");
    let trace = ReplayTrace::new(None, tokens.iter().map(|t| t.to_string()).collect());
    std::fs::write(&trace_path, serde_json::to_string(&trace).unwrap()).unwrap();
    run_child_with_trace(test_name, trace_path.as_os_str())
}

fn run_child_with_trace(test_name: &str, trace_path: &std::ffi::OsStr) -> Output {
    Command::new(std::env::current_exe().unwrap())
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV_VAR, "1")
        .env(TRACE_ENV_VAR, trace_path)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn child_scenario() {
    if !is_child() {
        return;
    }
    replay_from_env(|queue| {
        assert!(queue.nondet_boolean()?);
        let x = queue.nondet_int()?;
        assert_eq!(x, 5);
        assume(x < 10)?;
        assert_eq!(queue.nondet_int()?, 10);
        println!("REACHED_LAST_ASSUME");
        assume(false)?;
        println!("PAST_LAST_ASSUME");
        queue.nondet_boolean()?;
        Ok(())
    });
}

#[test]
fn scenario_ends_with_assumption_status() {
    let output = run_child("child_scenario", &["true", "5", "10", "false"]);
    assert_eq!(output.status.code(), Some(exit_codes::ASSUMPTION_VIOLATED));
    assert!(stdout(&output).contains("REACHED_LAST_ASSUME"));
    assert!(!stdout(&output).contains("PAST_LAST_ASSUME"));
    assert!(!stderr(&output).contains("polywit:"));
}

#[test]
fn child_read_all() {
    if !is_child() {
        return;
    }
    replay_from_env(|queue| {
        let x = queue.nondet_int()?;
        let y = queue.nondet_int()?;
        println!("SUM={}", x + y);
        Ok(())
    });
}

#[test]
fn complete_replay_succeeds() {
    let output = run_child("child_read_all", &["3", "4"]);
    assert_eq!(output.status.code(), Some(exit_codes::SUCCESS));
    assert!(stdout(&output).contains("SUM=7"));
}

#[test]
fn exhausted_trace_status() {
    let output = run_child("child_read_all", &["3"]);
    assert_eq!(output.status.code(), Some(exit_codes::EXHAUSTED_TRACE));
    assert!(stderr(&output).contains("replay trace exhausted"));
    assert!(!stdout(&output).contains("SUM="));
}

#[test]
fn malformed_token_status() {
    let output = run_child("child_read_all", &["3", "notanumber"]);
    assert_eq!(output.status.code(), Some(exit_codes::MALFORMED_TOKEN));
    assert!(stderr(&output).contains("`notanumber` is not a valid int"));
}

#[test]
fn missing_trace_status() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_child_with_trace("child_read_all", dir.path().join("absent.json").as_os_str());
    assert_eq!(output.status.code(), Some(exit_codes::TRACE_UNAVAILABLE));
}

#[test]
fn child_failed_assertion() {
    if !is_child() {
        return;
    }
    replay_from_env(|queue| {
        let x = queue.nondet_int()?;
        assert!(x != 42, "property violated");
        Ok(())
    });
}

#[test]
fn failed_assertion_panics() {
    let output = run_child("child_failed_assertion", &["42"]);
    assert_eq!(output.status.code(), Some(exit_codes::PANIC));
    let output = run_child("child_failed_assertion", &["41"]);
    assert_eq!(output.status.code(), Some(exit_codes::SUCCESS));
}

#[test]
fn child_verifier_functions() {
    if !is_child() {
        return;
    }
    let trace = polywit::trace::from_env().unwrap();
    verifier::with_trace(trace.tokens, || {
        let c = verifier::nondet_char();
        let s = verifier::nondet_string();
        println!("READ={c}{s}");
        verifier::assume(c == 'B');
        println!("PAST_ASSUME");
        verifier::nondet_short();
    });
}

#[test]
fn verifier_functions_terminate() {
    let output = run_child("child_verifier_functions", &["65", "xyz"]);
    assert_eq!(output.status.code(), Some(exit_codes::ASSUMPTION_VIOLATED));
    assert!(stdout(&output).contains("READ=Axyz"));
    assert!(!stdout(&output).contains("PAST_ASSUME"));

    let output = run_child("child_verifier_functions", &["66", "xyz"]);
    assert_eq!(output.status.code(), Some(exit_codes::EXHAUSTED_TRACE));
    assert!(stdout(&output).contains("PAST_ASSUME"));

    let output = run_child("child_verifier_functions", &["66", "xyz", "70000"]);
    assert_eq!(output.status.code(), Some(exit_codes::MALFORMED_TOKEN));
}
