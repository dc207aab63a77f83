use std::{
    env, fs,
    path::PathBuf,
    process::{Command, Output},
};

fn stoon(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stoon"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run stoon binary")
}

fn scratch_file(name: &str) -> PathBuf {
    env::temp_dir().join(format!("stoon-cli-{}-{name}", std::process::id()))
}

#[test]
fn generate_then_inspect_and_probe() {
    let snapshot = scratch_file("world.txt");
    let path = snapshot.to_str().expect("utf-8 temp path");

    let generated = stoon(&["generate", "--count", "25", "--seed", "7", "--transfer", "-o", path]);
    assert!(generated.status.success(), "{}", String::from_utf8_lossy(&generated.stderr));
    let contents = fs::read_to_string(&snapshot).expect("snapshot written");
    assert!(contents.starts_with("stoon:v1:25x"));

    let inspected = stoon(&["inspect", path]);
    assert!(inspected.status.success());
    let summary = String::from_utf8_lossy(&inspected.stdout);
    assert!(summary.contains("triangles: 25"), "{summary}");

    let probed = stoon(&["probe", path, "--coord", "0,0", "--pos", "500,500"]);
    assert!(probed.status.success());
    let answers = String::from_utf8_lossy(&probed.stdout);
    assert!(answers.contains("coord 0,0 Upward"), "{answers}");
    assert!(answers.contains("ground none walkable false"), "{answers}");

    let _ = fs::remove_file(&snapshot);
}

#[test]
fn unreadable_snapshot_fails_with_context() {
    let missing = scratch_file("missing.json");
    let output = stoon(&["inspect", missing.to_str().expect("utf-8 temp path")]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}
