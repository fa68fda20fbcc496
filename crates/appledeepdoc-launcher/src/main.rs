use std::env;
use std::process::Command;

use appledeepdoc_launcher::{
    command_for, enter_directory, resolve_launcher_dir, select_interpreter,
};

fn main() {
    let dir = match resolve_launcher_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("appledeepdoc-launcher: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = enter_directory(&dir) {
        eprintln!("appledeepdoc-launcher: {err}");
        std::process::exit(1);
    }

    let interpreter = select_interpreter(&dir);
    let command = command_for(&dir, &interpreter, env::args_os().skip(1));

    run(command, &interpreter);
}

#[cfg(unix)]
fn run(mut command: Command, interpreter: &std::path::Path) -> ! {
    use std::io::ErrorKind;
    use std::os::unix::process::CommandExt;

    // exec only returns on failure; on success the interpreter owns the
    // process image, stdio, and exit status from here on.
    let err = command.exec();
    eprintln!(
        "appledeepdoc-launcher: failed to execute {}: {err}",
        interpreter.display()
    );
    let code = if err.kind() == ErrorKind::NotFound {
        127
    } else {
        126
    };
    std::process::exit(code);
}

#[cfg(not(unix))]
fn run(mut command: Command, interpreter: &std::path::Path) -> ! {
    // No process replacement here: spawn, forward stdio, and exit with the
    // child's exact status to preserve the exit-code contract.
    match command.status() {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(err) => {
            eprintln!(
                "appledeepdoc-launcher: failed to execute {}: {err}",
                interpreter.display()
            );
            let code = if err.kind() == std::io::ErrorKind::NotFound {
                127
            } else {
                126
            };
            std::process::exit(code);
        }
    }
}
