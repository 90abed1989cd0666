use assert_cmd::Command;

#[test]
fn help_lists_the_admin_commands() {
    let output = Command::cargo_bin("bookstore")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in [
        "serve",
        "migrate",
        "createsuperuser",
        "changepassword",
        "list-accounts",
        "add-book",
        "grant",
        "deactivate",
    ] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn unknown_command_fails() {
    Command::cargo_bin("bookstore")
        .unwrap()
        .arg("reindex")
        .assert()
        .failure();
}
