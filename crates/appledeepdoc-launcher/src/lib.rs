use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Module executed by the selected interpreter.
pub const TARGET_MODULE: &str = "appledeepdoc_mcp.main";

/// Environment variable carrying the module search path.
pub const MODULE_PATH_ENV: &str = "PYTHONPATH";

/// Interpreter name used when no virtual environment is present; resolution
/// is left to the executable search path at exec time.
pub const FALLBACK_INTERPRETER: &str = "python3";

/// Virtual-environment interpreter candidates, in priority order.
const VENV_CANDIDATES: [&str; 2] = [".venv/bin/python", "venv/bin/python"];

const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("cannot resolve launcher location: {0}")]
    Resolve(#[source] std::io::Error),
    #[error("launcher path {} has no parent directory", .0.display())]
    NoParent(PathBuf),
    #[error("cannot enter launcher directory {}: {source}", .dir.display())]
    EnterDirectory {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory containing the launcher executable, with symbolic links resolved
/// before taking the parent.
pub fn resolve_launcher_dir() -> Result<PathBuf, LaunchError> {
    let exe = env::current_exe().map_err(LaunchError::Resolve)?;
    resolve_script_dir(&exe)
}

/// Resolves the directory containing `script`, following symbolic links.
pub fn resolve_script_dir(script: &Path) -> Result<PathBuf, LaunchError> {
    let resolved = fs::canonicalize(script).map_err(LaunchError::Resolve)?;
    match resolved.parent() {
        Some(parent) => Ok(parent.to_path_buf()),
        None => Err(LaunchError::NoParent(resolved)),
    }
}

/// Enters the launcher directory; a missing or unreadable directory is a
/// fatal startup error.
pub fn enter_directory(dir: &Path) -> Result<(), LaunchError> {
    env::set_current_dir(dir).map_err(|source| LaunchError::EnterDirectory {
        dir: dir.to_path_buf(),
        source,
    })
}

/// Picks the interpreter: the first existing-and-executable virtual
/// environment candidate under `dir` wins; otherwise the bare fallback name.
pub fn select_interpreter(dir: &Path) -> PathBuf {
    for candidate in VENV_CANDIDATES {
        let path = dir.join(candidate);
        if is_executable_file(&path) {
            return path;
        }
    }
    PathBuf::from(FALLBACK_INTERPRETER)
}

/// `<dir>` alone when the prior value is absent or empty, otherwise
/// `<dir><separator><prior>`.
pub fn compose_module_search_path(dir: &Path, prior: Option<&OsStr>) -> OsString {
    let mut value = OsString::from(dir);
    if let Some(prior) = prior {
        if !prior.is_empty() {
            value.push(PATH_SEPARATOR.to_string());
            value.push(prior);
        }
    }
    value
}

/// Builds the interpreter invocation: `-m` plus the target module, the
/// caller's arguments verbatim, and the composed module search path passed
/// explicitly into the child environment.
pub fn command_for(
    dir: &Path,
    interpreter: &Path,
    args: impl IntoIterator<Item = OsString>,
) -> Command {
    let search_path = compose_module_search_path(dir, env::var_os(MODULE_PATH_ENV).as_deref());

    let mut command = Command::new(interpreter);
    command
        .arg("-m")
        .arg(TARGET_MODULE)
        .args(args)
        .env(MODULE_PATH_ENV, search_path);
    command
}

fn is_executable_file(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path)
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    fn write_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn search_path_is_the_directory_alone_when_prior_is_absent() {
        let dir = Path::new("/opt/appledeepdoc");
        assert_eq!(
            compose_module_search_path(dir, None),
            OsString::from("/opt/appledeepdoc")
        );
    }

    #[test]
    fn search_path_treats_empty_prior_as_absent() {
        let dir = Path::new("/opt/appledeepdoc");
        assert_eq!(
            compose_module_search_path(dir, Some(OsStr::new(""))),
            OsString::from("/opt/appledeepdoc")
        );
    }

    #[cfg(unix)]
    #[test]
    fn search_path_prepends_to_a_prior_value() {
        let dir = Path::new("/opt/appledeepdoc");
        assert_eq!(
            compose_module_search_path(dir, Some(OsStr::new("/usr/lib/py"))),
            OsString::from("/opt/appledeepdoc:/usr/lib/py")
        );
    }

    #[cfg(unix)]
    #[test]
    fn dot_venv_wins_over_venv() {
        let temp = tempdir().unwrap();
        write_executable(&temp.path().join(".venv/bin/python"));
        write_executable(&temp.path().join("venv/bin/python"));

        assert_eq!(
            select_interpreter(temp.path()),
            temp.path().join(".venv/bin/python")
        );
    }

    #[cfg(unix)]
    #[test]
    fn venv_is_used_when_dot_venv_is_missing() {
        let temp = tempdir().unwrap();
        write_executable(&temp.path().join("venv/bin/python"));

        assert_eq!(
            select_interpreter(temp.path()),
            temp.path().join("venv/bin/python")
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_candidates_are_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let python = temp.path().join(".venv/bin/python");
        fs::create_dir_all(python.parent().unwrap()).unwrap();
        fs::write(&python, "not runnable").unwrap();
        fs::set_permissions(&python, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(
            select_interpreter(temp.path()),
            PathBuf::from(FALLBACK_INTERPRETER)
        );
    }

    #[test]
    fn fallback_interpreter_is_a_bare_name() {
        let temp = tempdir().unwrap();
        assert_eq!(
            select_interpreter(temp.path()),
            PathBuf::from(FALLBACK_INTERPRETER)
        );
    }

    #[cfg(unix)]
    #[test]
    fn script_dir_resolves_through_symlinks() {
        let temp = tempdir().unwrap();
        let real_dir = temp.path().join("real");
        let other_dir = temp.path().join("elsewhere");
        fs::create_dir_all(&real_dir).unwrap();
        fs::create_dir_all(&other_dir).unwrap();

        let script = real_dir.join("launch");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        let link = other_dir.join("launch");
        std::os::unix::fs::symlink(&script, &link).unwrap();

        let resolved = resolve_script_dir(&link).unwrap();
        assert_eq!(resolved, fs::canonicalize(&real_dir).unwrap());
    }

    #[test]
    fn missing_scripts_fail_resolution() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("gone");
        assert!(matches!(
            resolve_script_dir(&missing),
            Err(LaunchError::Resolve(_))
        ));
    }
}
