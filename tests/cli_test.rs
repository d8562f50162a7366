//! End-to-end tests of the spacey-pack binary

use std::process::{Command, Output};
use tempfile::tempdir;

fn spacey_pack(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spacey-pack"))
        .args(args)
        .output()
        .expect("failed to run spacey-pack")
}

#[test]
fn test_probe_prints_export_names() {
    let output = spacey_pack(&["probe", "node:timers"]);
    assert!(output.status.success());

    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        names,
        vec![
            "setTimeout",
            "setInterval",
            "setImmediate",
            "clearTimeout",
            "clearInterval",
            "clearImmediate",
        ]
    );
}

#[test]
fn test_probe_mirrors_child_failure() {
    let output = spacey_pack(&["probe", "left-pad"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No such built-in module: 'left-pad'"), "{}", stderr);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_run_shims() {
    let output = spacey_pack(&["run-shims", "--", "--flag"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].starts_with("spacey-pack v"), "{}", stdout);
    assert_eq!(lines.last(), Some(&"timers drained"));
}

#[test]
fn test_load_addon_failure_leaves_no_file() {
    let dir = tempdir().unwrap();
    let temp_dir = dir.path().join("addons");
    std::fs::create_dir(&temp_dir).unwrap();

    let config = dir.path().join("spacey-pack.toml");
    std::fs::write(
        &config,
        format!("[host]\ntemp_dir = {:?}\nnative_addons = true\n", temp_dir),
    )
    .unwrap();
    let payload = dir.path().join("broken.b64");
    std::fs::write(&payload, "bm90IGEgbGlicmFyeQ==\n").unwrap();

    let output = spacey_pack(&[
        "load-addon",
        "broken.node",
        payload.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load addon"), "{}", stderr);
    assert_eq!(std::fs::read_dir(&temp_dir).unwrap().count(), 0);
}
