use assert_cmd::Command;
use predicates::str::{contains, diff};

fn debug(commands: &str) -> Command {
    let mut cmd = Command::cargo_bin("ase").unwrap();
    cmd.args(["debug", "tests/files/counter.asm", "--minimal", "--command"])
        .arg(commands)
        .write_stdin("");
    cmd
}

#[test]
fn steps_and_inspects() {
    debug("step 2;registers;where;continue")
        .assert()
        .success()
        .stderr(diff("AX 10\nBX 0\nCX 4\nDX 0\nline 5: DEC cx\n"));
}

#[test]
fn reads_commands_from_stdin() {
    let mut cmd = Command::cargo_bin("ase").unwrap();
    cmd.args(["debug", "tests/files/counter.asm", "--minimal"])
        .write_stdin("\nflags\n");
    cmd.assert()
        .success()
        .stderr(diff("CF 0\nZF 1\nSF 0\nOF 0\nPF 1\nDF 0\nIF 0\nAF 0\n"));
}

#[test]
fn inspects_memory_and_stack() {
    debug("step 14;memory;stack;continue")
        .assert()
        .success()
        .stderr(diff("100 40\n"));
}

#[test]
fn detaching_still_dumps() {
    let mut cmd = Command::cargo_bin("ase").unwrap();
    cmd.args(["debug", "tests/files/counter.asm", "-r", "--minimal", "-c", "continue"]);
    cmd.assert()
        .success()
        .stdout(diff("Registers\nAX 40\nBX 0\nCX 0\nDX 0\n"));
}

#[test]
fn rejects_unknown_commands() {
    debug("bogus;step 0;continue")
        .assert()
        .success()
        .stderr(contains("Not a command: `bogus`"))
        .stderr(contains("Step count must be a positive integer, not `0`"));
}

#[test]
fn prints_help_message() {
    debug("help;continue")
        .assert()
        .success()
        .stderr(diff(format!(
            "{}\n",
            include_str!("../src/debugger/help.txt")
        )));
}
