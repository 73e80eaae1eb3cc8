use std::{
    env,
    ffi::OsStr,
    fmt,
    path::{Path, PathBuf},
};

/// Result of probing a language's compiler/interpreter at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toolchain {
    /// The language declares no program to look up (e.g. an executable script).
    NotRequired,
    Found(PathBuf),
    NotFound(String),
}

impl Toolchain {
    /// Look `program` up once. `None` means nothing needs to be installed.
    pub fn locate(program: Option<&str>) -> Self {
        let Some(program) = program else {
            return Self::NotRequired;
        };
        match self::find_executable(program, env::var_os("PATH").as_deref()) {
            Some(path) => Self::Found(path),
            None => {
                log::debug!("Toolchain '{}' is not found", program);
                Self::NotFound(program.to_owned())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }

    /// Value substituted for `#{program}` in command templates.
    pub fn program(&self) -> String {
        match self {
            Self::NotRequired => String::new(),
            Self::Found(path) => path.to_string_lossy().into_owned(),
            Self::NotFound(name) => name.clone(),
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequired => write!(f, "-"),
            Self::Found(path) => write!(f, "{}", path.to_string_lossy()),
            Self::NotFound(name) => write!(f, "{} (not found)", name),
        }
    }
}

/// Resolve `program` the way a shell would: paths containing a separator are
/// checked as-is, bare names are searched in every `PATH` entry.
pub fn find_executable(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let program = program.trim();
    if program.is_empty() {
        return None;
    }
    let candidate = Path::new(program);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return is_executable_file(candidate).then(|| candidate.to_owned());
    }

    env::split_paths(path_var?)
        .map(|dir| dir.join(program))
        .find(|path| is_executable_file(path))
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod test {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn finds_sh_in_path() {
        let path_var = OsString::from("/nonexistent-dir:/bin:/usr/bin");
        let found = find_executable("sh", Some(&path_var)).unwrap();
        assert!(found.ends_with("sh"));
        assert!(found.is_absolute());
    }

    #[test]
    fn absolute_path_is_checked_directly() {
        assert_eq!(
            find_executable("/bin/sh", None),
            Some(PathBuf::from("/bin/sh"))
        );
        assert_eq!(find_executable("/bin/definitely-not-here-42", None), None);
    }

    #[test]
    fn missing_program_is_not_found() {
        let path_var = OsString::from("/bin:/usr/bin");
        assert_eq!(
            find_executable("langbench-no-such-compiler", Some(&path_var)),
            None
        );
        assert_eq!(find_executable("", Some(&path_var)), None);
    }

    #[test]
    fn locate_classifies_availability() {
        assert_eq!(Toolchain::locate(None), Toolchain::NotRequired);
        assert!(Toolchain::locate(None).is_available());

        let t = Toolchain::locate(Some("langbench-no-such-compiler"));
        assert_eq!(
            t,
            Toolchain::NotFound("langbench-no-such-compiler".to_owned())
        );
        assert!(!t.is_available());
        assert_eq!(t.to_string(), "langbench-no-such-compiler (not found)");

        assert!(Toolchain::locate(Some("/bin/sh")).is_available());
    }
}
