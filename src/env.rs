//! Access to the process environment table.
//!
//! The interpreter never keeps a private copy of the environment: assignments go
//! straight to the process table so that they are inherited by every child forked
//! afterwards, and are invisible to children forked before.

use anyhow::{Result, bail};
use std::env as stdenv;

/// Get the value of an environment variable.
///
/// Values that are not valid UTF-8 are converted lossily.
pub fn get_var(key: &str) -> Option<String> {
    if !is_valid_name(key) {
        return None;
    }
    stdenv::var_os(key).map(|v| v.to_string_lossy().into_owned())
}

/// Set or override an environment variable of the current process.
///
/// Fails for names the OS cannot store (empty, containing `=` or NUL) and for
/// values containing NUL.
pub fn set_var(key: &str, val: &str) -> Result<()> {
    if !is_valid_name(key) {
        bail!("invalid variable name: {:?}", key);
    }
    if val.contains('\0') {
        bail!("value of {} contains a NUL byte", key);
    }
    // SAFETY: the interpreter is single-threaded; concurrency only ever comes from
    // forked processes, each with its own copy of the environment.
    unsafe { stdenv::set_var(key, val) };
    Ok(())
}

/// Whether `name` can be used as an environment variable name.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains('\0')
}
