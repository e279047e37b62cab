use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("onboarding_cli").unwrap();
    cmd.env("ONBOARDING_HOME", home.path())
        .env_remove("ONBOARDING_DEV_MODE")
        .env_remove("ONBOARDING_API_BASE_URL");
    cmd
}

#[test]
fn validate_accepts_good_email() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .args(["validate", "email", "dana@reyesdental.com"])
        .assert()
        .success()
        .stdout("valid\n");
}

#[test]
fn validate_rejects_short_phone_for_country() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .args(["validate", "phone", "555 0142", "--country", "US"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("too short for US"));
}

#[test]
fn validate_uses_field_label() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .args(["validate", "required", "", "--field", "Greeting script"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Greeting script is required"));
}

#[test]
fn unknown_field_type_fails() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .args(["validate", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown field type"));
}

#[test]
fn version_prints_build_info() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("receptionist_onboarding ")
                .and(predicate::str::is_match(r"(?m)^receptionist_onboarding \d+\.\d+\.\d+$").unwrap())
                .and(predicate::str::is_match(r"(?m)^target: +\S+ \[\w+\]$").unwrap()),
        );
}

#[test]
fn calls_renders_report_from_file() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("calls.json");
    std::fs::write(
        &file,
        r#"[
            {"started_at": "2026-03-02T15:04:00Z", "caller": "+1 512 555 0142", "duration_secs": 125, "outcome": "answered"},
            {"started_at": "2026-03-02T16:30:00Z", "caller": "Unknown", "duration_secs": 0, "outcome": "missed"}
        ]"#,
    )
    .unwrap();
    cli(&home)
        .args(["calls", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown").and(predicate::str::contains("Calls: 2  Answered: 1  Missed: 1")));
}
