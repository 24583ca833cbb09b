// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! End-to-end tests for the claude2html binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const CONVERSATION: &str = r#"{
    "name": "CLI test",
    "chat_messages": [
        {"index": 1, "sender": "assistant", "content": [
            {"type": "thinking", "thinking": "pondering"},
            {"type": "text", "text": "second"}
        ]},
        {"index": 0, "sender": "human", "text": "first",
         "files": [{"file_name": "pic.png", "file_kind": "image", "file_uuid": "u1"}]}
    ]
}"#;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_claude2html"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run claude2html")
}

fn write_input(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, CONVERSATION).unwrap();
    path
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn writes_page_into_output_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "chat.json");
    let out_dir = tmp.path().join("out");

    let output = run(&["-o", path_str(&out_dir), path_str(&input)]);
    assert!(output.status.success(), "{output:?}");

    let html = fs::read_to_string(out_dir.join("chat.html")).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.find("<p>first</p>").unwrap() < html.find("<p>second</p>").unwrap());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Wrote"));
}

#[test]
fn writes_single_input_to_html_file() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "chat.json");
    let target = tmp.path().join("nested/page.html");

    let output = run(&["-q", "-o", path_str(&target), path_str(&input)]);
    assert!(output.status.success(), "{output:?}");
    assert!(target.exists());
    assert!(output.stderr.is_empty());
}

#[test]
fn writes_fragment_to_stdout() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "chat.json");

    let output = run(&["--fragment", "--hide-thinking", "-o", "-", path_str(&input)]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with(r#"<main class="conversation">"#));
    assert!(!stdout.contains("pondering"));
}

#[test]
fn inlines_uploads_from_attachment_map() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "chat.json");
    let map = tmp.path().join("files.map");
    fs::write(&map, r#"{"u1": "data:image/png;base64,AAAA"}"#).unwrap();

    let output = run(&["--attachments", path_str(&map), "-o", "-", path_str(&input)]);
    assert!(output.status.success(), "{output:?}");
    assert!(String::from_utf8_lossy(&output.stdout).contains(r#"src="data:image/png;base64,AAAA""#));
}

#[test]
fn applies_dark_theme() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "chat.json");

    let output = run(&["--theme", "dark", "-o", "-", path_str(&input)]);
    assert!(String::from_utf8_lossy(&output.stdout).contains(r#"data-theme="dark""#));

    let output = run(&["--theme", "sepia", "-o", "-", path_str(&input)]);
    assert!(!output.status.success());
}

#[test]
fn walks_directories_for_json_files() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = tmp.path().join("exports");
    fs::create_dir_all(inputs.join("sub")).unwrap();
    write_input(&inputs, "a.json");
    write_input(&inputs.join("sub"), "b.json");
    fs::write(inputs.join("notes.txt"), "ignored").unwrap();
    let out_dir = tmp.path().join("out");

    let output = run(&["-o", path_str(&out_dir), path_str(&inputs)]);
    assert!(output.status.success(), "{output:?}");
    assert!(out_dir.join("a.html").exists());
    assert!(out_dir.join("b.html").exists());
    assert!(!out_dir.join("notes.html").exists());
}

#[test]
fn refuses_multiple_inputs_to_stdout() {
    let tmp = tempfile::tempdir().unwrap();
    let a = write_input(tmp.path(), "a.json");
    let b = write_input(tmp.path(), "b.json");

    let output = run(&["-o", "-", path_str(&a), path_str(&b)]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn skips_existing_output_unless_forced() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "chat.json");
    let target = tmp.path().join("chat.html");
    fs::write(&target, "keep me").unwrap();

    let output = run(&["-o", path_str(&target), path_str(&input)]);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&target).unwrap(), "keep me");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Skipping"));

    let output = run(&["-f", "-o", path_str(&target), path_str(&input)]);
    assert!(output.status.success());
    assert!(fs::read_to_string(&target).unwrap().contains("CLI test"));
}

#[test]
fn dry_run_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "chat.json");
    let out_dir = tmp.path().join("out");

    let output = run(&["-n", "-o", path_str(&out_dir), path_str(&input)]);
    assert!(output.status.success());
    assert!(!out_dir.exists());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Would write"));
}

#[test]
fn reports_invalid_json() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("broken.json");
    fs::write(&input, "{not json").unwrap();

    let output = run(&["-o", "-", path_str(&input)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ParseFile"));
}
