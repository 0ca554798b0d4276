use crate::command::{ExitCode, FAILURE, SUCCESS};
use crate::env::{get_var, set_var};
use crate::process::flush_std_streams;
use crate::tree::Word;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Built-in commands known to the shell at compile time.
///
/// Builtins run directly in the calling process without forking, so that their
/// effects (working directory, process exit) are observable by the caller. Any
/// builtin added here has to keep that property or its effects are lost with the
/// child that ran it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `cd [dir]`
    Cd,
    /// `exit` / `quit`
    Exit,
}

impl Builtin {
    /// Find the builtin named `name`, if any.
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Builtin::Cd),
            "exit" | "quit" => Some(Builtin::Exit),
            _ => None,
        }
    }

    /// Executes the builtin with the given parameters.
    ///
    /// `Exit` does not return.
    pub fn execute(self, params: &[Word]) -> ExitCode {
        match self {
            Builtin::Cd => match cd(params.first()) {
                Ok(dir) => {
                    debug!(dir = %dir.display(), "cd");
                    SUCCESS
                }
                Err(e) => {
                    warn!("{:#}", e);
                    FAILURE
                }
            },
            Builtin::Exit => exit(),
        }
    }
}

/// Directory `cd` should move to, before looking anything up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdTarget {
    /// `$HOME`
    Home,
    /// `$OLDPWD`
    Previous,
    /// A literal path, absolute or relative to the current directory.
    Path(String),
}

impl CdTarget {
    /// Classify the argument of `cd`.
    ///
    /// Absent, empty and `~` go home; exactly `-` goes back to `OLDPWD`; anything
    /// else is taken literally.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None | Some("") | Some("~") => CdTarget::Home,
            Some("-") => CdTarget::Previous,
            Some(path) => CdTarget::Path(path.to_string()),
        }
    }
}

/// Change the working directory of the current process.
///
/// On success `OLDPWD` holds the directory that was left and `PWD` the new one.
/// On failure the working directory is unchanged.
pub fn cd(dir: Option<&Word>) -> Result<PathBuf> {
    let arg = dir.map(Word::resolve);
    let target = match CdTarget::from_arg(arg.as_deref()) {
        CdTarget::Home => get_var("HOME").context("cd: HOME not set")?,
        CdTarget::Previous => get_var("OLDPWD").context("cd: OLDPWD not set")?,
        CdTarget::Path(path) => path,
    };

    let previous = env::current_dir().ok();
    env::set_current_dir(&target).with_context(|| format!("cd: can't chdir to {}", target))?;

    let current = env::current_dir().unwrap_or_else(|_| PathBuf::from(&target));
    if let Some(previous) = previous {
        set_var("OLDPWD", &previous.to_string_lossy())?;
    }
    set_var("PWD", &current.to_string_lossy())?;
    Ok(current)
}

/// Terminate the current process with a success status.
///
/// Buffered standard streams are flushed first; nothing else is unwound.
pub fn exit() -> ! {
    flush_std_streams();
    std::process::exit(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::tests::lock_process_state;
    use std::fs;

    /// Restores the working directory and the variables `cd` touches.
    struct Restore {
        dir: PathBuf,
        vars: Vec<(&'static str, Option<String>)>,
    }

    impl Restore {
        fn capture() -> Self {
            Self {
                dir: env::current_dir().unwrap(),
                vars: ["HOME", "OLDPWD", "PWD"]
                    .into_iter()
                    .map(|k| (k, get_var(k)))
                    .collect(),
            }
        }
    }

    impl Drop for Restore {
        fn drop(&mut self) {
            let _ = env::set_current_dir(&self.dir);
            for (key, value) in &self.vars {
                match value {
                    Some(v) => set_var(key, v).unwrap(),
                    None => unsafe { env::remove_var(key) },
                }
            }
        }
    }

    #[test]
    fn test_lookup_knows_cd_exit_quit() {
        assert_eq!(Builtin::lookup("cd"), Some(Builtin::Cd));
        assert_eq!(Builtin::lookup("exit"), Some(Builtin::Exit));
        assert_eq!(Builtin::lookup("quit"), Some(Builtin::Exit));
        assert_eq!(Builtin::lookup("echo"), None);
        assert_eq!(Builtin::lookup("CD"), None);
    }

    #[test]
    fn test_cd_target_resolution_order() {
        assert_eq!(CdTarget::from_arg(None), CdTarget::Home);
        assert_eq!(CdTarget::from_arg(Some("")), CdTarget::Home);
        assert_eq!(CdTarget::from_arg(Some("~")), CdTarget::Home);
        assert_eq!(CdTarget::from_arg(Some("-")), CdTarget::Previous);
        assert_eq!(
            CdTarget::from_arg(Some("--")),
            CdTarget::Path("--".to_string())
        );
        assert_eq!(
            CdTarget::from_arg(Some("~/src")),
            CdTarget::Path("~/src".to_string())
        );
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_process_state();
        let _restore = Restore::capture();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();

        let word = Word::literal(canonical_temp.to_string_lossy());
        let status = Builtin::Cd.execute(std::slice::from_ref(&word));

        assert_eq!(status, SUCCESS);
        assert_eq!(
            fs::canonicalize(env::current_dir().unwrap()).unwrap(),
            canonical_temp
        );
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let _lock = lock_process_state();
        let _restore = Restore::capture();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        set_var("HOME", &canonical_temp.to_string_lossy()).unwrap();

        for arg in [None, Some(Word::literal("")), Some(Word::literal("~"))] {
            env::set_current_dir("/").unwrap();
            let dir = cd(arg.as_ref()).unwrap();
            assert_eq!(fs::canonicalize(dir).unwrap(), canonical_temp);
        }
    }

    #[test]
    fn test_cd_dash_goes_to_oldpwd() {
        let _lock = lock_process_state();
        let _restore = Restore::capture();
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let first_path = fs::canonicalize(first.path()).unwrap();
        let second_path = fs::canonicalize(second.path()).unwrap();

        cd(Some(&Word::literal(first_path.to_string_lossy()))).unwrap();
        cd(Some(&Word::literal(second_path.to_string_lossy()))).unwrap();
        assert_eq!(get_var("OLDPWD"), Some(first_path.to_string_lossy().into()));

        let dir = cd(Some(&Word::literal("-"))).unwrap();
        assert_eq!(fs::canonicalize(dir).unwrap(), first_path);
        // and back again
        let dir = cd(Some(&Word::literal("-"))).unwrap();
        assert_eq!(fs::canonicalize(dir).unwrap(), second_path);
    }

    #[test]
    fn test_cd_nonexistent_path_fails() {
        let _lock = lock_process_state();
        let _restore = Restore::capture();
        let orig = env::current_dir().unwrap();

        let name = format!("nonexistent_dir_for_minishell_test_{}", std::process::id());
        let status = Builtin::Cd.execute(&[Word::literal(name)]);

        assert_eq!(status, FAILURE);
        assert_eq!(env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_into_regular_file_fails() {
        let _lock = lock_process_state();
        let _restore = Restore::capture();
        let orig = env::current_dir().unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();

        let word = Word::literal(file.path().to_string_lossy());
        assert!(cd(Some(&word)).is_err());
        assert_eq!(env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_dash_without_oldpwd_fails() {
        let _lock = lock_process_state();
        let _restore = Restore::capture();
        unsafe { env::remove_var("OLDPWD") };
        let orig = env::current_dir().unwrap();

        assert_eq!(Builtin::Cd.execute(&[Word::literal("-")]), FAILURE);
        assert_eq!(env::current_dir().unwrap(), orig);
    }
}
