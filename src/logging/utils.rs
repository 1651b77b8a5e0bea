//! Per-user directories and terminal geometry.
use std::fs;
use std::path::PathBuf;

/// Resolve an XDG base directory: `$var` when set, otherwise
/// `$HOME/<fallback>` (`%USERPROFILE%` on Windows, `.` as a last resort).
pub(crate) fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    std::env::var_os(var).map_or_else(
        || {
            std::env::var_os("HOME")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .map_or_else(|| PathBuf::from("."), PathBuf::from)
                .join(fallback)
        },
        PathBuf::from,
    )
}

/// Log file for `command` under `$XDG_CACHE_HOME/invsync/`, creating the
/// directory. `None` when it cannot be created.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let dir = xdg_dir("XDG_CACHE_HOME", ".cache").join("invsync");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Terminal width from `COLUMNS`, 80 when unset or zero.
pub(super) fn terminal_columns() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(80)
}

#[cfg(test)]
#[allow(unsafe_code)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::TEST_ENV_MUTEX;

    #[test]
    fn xdg_dir_prefers_variable() {
        let _lock = TEST_ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let home = std::env::var_os("HOME");
        // SAFETY: Protected by TEST_ENV_MUTEX; HOME is restored below.
        unsafe {
            std::env::set_var("INVSYNC_TEST_XDG", "/srv/xdg");
            std::env::set_var("HOME", "/home/ops");
        }
        let set = xdg_dir("INVSYNC_TEST_XDG", ".cache");
        // SAFETY: Protected by TEST_ENV_MUTEX.
        unsafe {
            std::env::remove_var("INVSYNC_TEST_XDG");
        }
        let unset = xdg_dir("INVSYNC_TEST_XDG", ".cache");
        // SAFETY: Protected by TEST_ENV_MUTEX.
        unsafe {
            match home {
                Some(home) => std::env::set_var("HOME", home),
                None => std::env::remove_var("HOME"),
            }
        }
        assert_eq!(set, PathBuf::from("/srv/xdg"));
        assert_eq!(unset, PathBuf::from("/home/ops/.cache"));
    }

    #[test]
    fn log_file_is_named_after_command() {
        let tmp = tempfile::tempdir().unwrap();
        let _lock = TEST_ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // SAFETY: Protected by TEST_ENV_MUTEX.
        unsafe {
            std::env::set_var("XDG_CACHE_HOME", tmp.path());
        }
        let path = log_file_path("update");
        // SAFETY: Protected by TEST_ENV_MUTEX.
        unsafe {
            std::env::remove_var("XDG_CACHE_HOME");
        }
        assert_eq!(path.unwrap(), tmp.path().join("invsync").join("update.log"));
        assert!(tmp.path().join("invsync").is_dir());
    }

    #[test]
    fn zero_columns_falls_back() {
        let _lock = TEST_ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // SAFETY: Protected by TEST_ENV_MUTEX.
        unsafe {
            std::env::set_var("COLUMNS", "0");
        }
        let cols = terminal_columns();
        // SAFETY: Protected by TEST_ENV_MUTEX.
        unsafe {
            std::env::remove_var("COLUMNS");
        }
        assert_eq!(cols, 80);
    }
}
