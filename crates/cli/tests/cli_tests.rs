// Integration tests for the `luminance` binary.
// Run with: cargo test -p luminance-cli --test cli_tests -- --nocapture

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn luminance() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_luminance"));
    cmd.env_remove("LUMINANCE_SETTINGS");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(args: &[&str]) -> Output {
    luminance().args(args).output().expect("run luminance")
}

fn with_settings(settings: &Path, args: &[&str]) -> Output {
    luminance()
        .arg("--settings")
        .arg(settings)
        .args(args)
        .output()
        .expect("run luminance")
}

fn canonical(path: &Path) -> String {
    std::fs::canonicalize(path).unwrap().to_string_lossy().to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// 2x1 RGB frame in the PFS stream format
fn write_sample_pfs(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("sample.pfs");
    let mut bytes = b"PFS1\n2 1\n3\n0\nR\n0\nG\n0\nB\n0\nENDH".to_vec();
    for v in [1.0f32, 0.0, 0.0, 1.0, 0.5, 0.25] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn check_passes() {
    let output = run(&["check"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout(&output);
    assert!(out.starts_with("ok: 72 keys, 7 groups"), "{}", out);
    assert!(out.contains("2.1.0-alpha1"));
}

#[test]
fn keys_lists_every_key() {
    let output = run(&["keys"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert_eq!(out.lines().count(), 72);
    assert!(out.contains("KEY_GUI_LANG"));
    assert!(out.contains("UserInterfaceLanguage"));
}

#[test]
fn keys_filtered_by_group_as_json() {
    let output = run(&["keys", "--group", "recent-paths", "--json"]);
    assert!(output.status.success());
    let entries: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(entries.len(), 7);
    assert!(entries.iter().all(|e| e["section"] == "General"));
    assert!(entries.iter().any(|e| e["key"] == "Recent_files_list"));
}

#[test]
fn keys_general_section_lists_all_its_keys() {
    let output = run(&["keys", "--group", "General", "--json"]);
    assert!(output.status.success());
    let entries: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(entries.len(), 11);
    assert!(entries.iter().any(|e| e["key"] == "UserInterfaceLanguage"));
    assert!(entries.iter().any(|e| e["key"] == "Recent_path_save_ldr"));
}

#[test]
fn keys_unknown_group_is_usage_error() {
    let output = run(&["keys", "--group", "nope"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown group"));
}

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

#[test]
fn set_get_unset_roundtrip() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("nested").join("settings.json");

    let output = with_settings(&settings, &["set", "KEY_NUM_BATCH_THREADS", "4"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(settings.exists());

    // by token as well as by constant name
    let output = with_settings(&settings, &["get", "Num_Batch_Threads"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "4");

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&settings).unwrap()).unwrap();
    assert_eq!(json["version"], "2.1.0-alpha1");
    assert_eq!(json["sections"]["Tonemapping_Options"]["Num_Batch_Threads"], 4);

    let output = with_settings(&settings, &["unset", "KEY_NUM_BATCH_THREADS"]);
    assert!(output.status.success());
    let output = with_settings(&settings, &["get", "KEY_NUM_BATCH_THREADS"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn set_list_value() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    let output = with_settings(&settings, &["set", "KEY_RECENT_FILES", "a.hdr", "b.hdr"]);
    assert!(output.status.success());

    let output = with_settings(&settings, &["get", "KEY_RECENT_FILES"]);
    assert_eq!(stdout(&output).lines().collect::<Vec<_>>(), vec!["a.hdr", "b.hdr"]);
}

#[test]
fn unknown_key_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    let output = with_settings(&settings, &["set", "KEY_DOES_NOT_EXIST", "1"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!settings.exists());
}

#[test]
fn corrupt_settings_file_fails() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    std::fs::write(&settings, "{ not json").unwrap();
    let output = with_settings(&settings, &["get", "KEY_GUI_LANG"]);
    assert_eq!(output.status.code(), Some(1));
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[test]
fn info_reads_pfs() {
    let dir = TempDir::new().unwrap();
    let input = write_sample_pfs(dir.path());
    let settings = dir.path().join("settings.json");

    let output = with_settings(&settings, &["info", input.to_str().unwrap(), "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["width"], 2);
    assert_eq!(summary["height"], 1);
    assert_eq!(summary["channels"], serde_json::json!(["R", "G", "B"]));
    assert_eq!(summary["max"], 1.0);
}

#[test]
fn convert_writes_png_and_records_recent_paths() {
    let dir = TempDir::new().unwrap();
    let input = write_sample_pfs(dir.path());
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    let output_png = out_dir.join("frame.png");
    let settings = dir.path().join("settings.json");

    let output = with_settings(
        &settings,
        &["convert", input.to_str().unwrap(), output_png.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output_png.exists());

    let output = with_settings(&settings, &["get", "KEY_RECENT_FILES"]);
    assert_eq!(stdout(&output).trim(), canonical(&input));
    let output = with_settings(&settings, &["get", "KEY_RECENT_PATH_SAVE_LDR"]);
    assert_eq!(stdout(&output).trim(), canonical(&out_dir));

    // PNG is an output-only format
    let back = dir.path().join("back.pfs");
    let output = with_settings(&settings, &["convert", output_png.to_str().unwrap(), back.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!back.exists());
}

#[test]
fn convert_records_absolute_paths_for_relative_arguments() {
    let dir = TempDir::new().unwrap();
    write_sample_pfs(dir.path());
    let settings = dir.path().join("settings.json");

    let output = luminance()
        .current_dir(dir.path())
        .arg("--settings")
        .arg(&settings)
        .args(["convert", "sample.pfs", "frame.png"])
        .output()
        .expect("run luminance");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("frame.png").exists());

    let output = with_settings(&settings, &["get", "KEY_RECENT_FILES"]);
    assert_eq!(stdout(&output).trim(), canonical(&dir.path().join("sample.pfs")));
    let output = with_settings(&settings, &["get", "KEY_RECENT_PATH_SAVE_LDR"]);
    assert_eq!(stdout(&output).trim(), canonical(dir.path()));
}

#[test]
fn convert_missing_input_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    let missing = dir.path().join("missing.tif");
    let output = with_settings(
        &settings,
        &["convert", missing.to_str().unwrap(), dir.path().join("o.png").to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn convert_rejects_bad_quality() {
    let output = run(&["convert", "a.tif", "b.jpg", "--quality", "0"]);
    assert_eq!(output.status.code(), Some(2));
}
