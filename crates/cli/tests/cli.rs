use assert_cmd::Command;

fn prerna() -> Command {
    Command::cargo_bin("prerna").unwrap()
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn help_lists_commands() {
    let out = stdout_of(prerna().arg("--help"));
    assert!(out.contains("migrate"));
    assert!(out.contains("rewrite-images"));
    assert!(out.contains("fetch-images"));
}

#[test]
fn token_prints_hex() {
    let out = stdout_of(prerna().arg("token"));
    let token = out.trim_end();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn token_rejects_short_lengths() {
    prerna().args(["token", "--bytes", "8"]).assert().failure();
}

#[test]
fn migrate_and_seed_against_temporary_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("cli.db").display());

    let run = |args: &[&str]| {
        stdout_of(
            prerna()
                .current_dir(dir.path())
                .env("PRERNA_DATABASE__URL", &url)
                .args(args),
        )
    };

    assert!(run(&["migrate"]).contains("migration(s)"));
    assert!(run(&["seed"]).contains("\"products\": 3"));
    assert!(run(&["rewrite-images", "--public-root", "."]).contains("mode: dry-run"));

    let fetched = run(&["fetch-images", "--public-root", "."]);
    assert!(fetched.contains("mode: dry-run"));
    assert!(fetched.contains("hosted urls seen: 0"));
}
