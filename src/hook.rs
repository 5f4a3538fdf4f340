//! `SQLITE_EXTRA_INIT` hook for builds that compile sqlite-vec into the amalgamation.
//!
//! When SQLite is built with [`EXTRA_INIT_DEFINE`], `sqlite3_initialize()` calls
//! [`sqlite3_wasm_extra_init`] once during library start-up. The natural thing to do
//! there would be `sqlite3_auto_extension(sqlite3_vec_init)`, but WASM targets cannot
//! pass the function pointer through, so the hook only reports success.
//!
//! Every connection has to be initialized explicitly after it is opened, e.g. with
//! [`crate::ext::init_connection`] (which is `sqlite3_vec_init(db, NULL, NULL)`).

use std::ffi::{c_char, c_int, CStr};

use rusqlite::ffi;

/// Exported symbol name of the hook.
pub const EXTRA_INIT_SYMBOL: &str = "sqlite3_wasm_extra_init";

/// Compiler flag that wires the hook into the SQLite amalgamation.
pub const EXTRA_INIT_DEFINE: &str = "-DSQLITE_EXTRA_INIT=sqlite3_wasm_extra_init";

/// Safe form of the hook. The argument is ignored.
pub fn extra_init(_arg: Option<&CStr>) -> c_int {
    ffi::SQLITE_OK
}

/// Called by `sqlite3_initialize()`. Always returns `SQLITE_OK`.
///
/// `z` is never read, so a null pointer is fine. Nothing is registered.
#[no_mangle]
pub extern "C" fn sqlite3_wasm_extra_init(_z: *const c_char) -> c_int {
    extra_init(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_init_none() {
        assert_eq!(extra_init(None), ffi::SQLITE_OK);
    }

    #[test]
    fn test_extra_init_with_text() {
        assert_eq!(extra_init(Some(c"anything")), ffi::SQLITE_OK);
    }

    #[test]
    fn test_raw_hook_null_pointer() {
        assert_eq!(sqlite3_wasm_extra_init(std::ptr::null()), ffi::SQLITE_OK);
    }

    #[test]
    fn test_raw_hook_with_text() {
        let arg = c"anything";
        assert_eq!(sqlite3_wasm_extra_init(arg.as_ptr()), ffi::SQLITE_OK);
    }

    #[test]
    fn test_raw_hook_repeated_calls() {
        for _ in 0..1000 {
            assert_eq!(sqlite3_wasm_extra_init(std::ptr::null()), ffi::SQLITE_OK);
        }
    }

    #[test]
    fn test_raw_hook_from_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| sqlite3_wasm_extra_init(std::ptr::null())))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), ffi::SQLITE_OK);
        }
    }

    #[test]
    fn test_define_names_symbol() {
        assert!(EXTRA_INIT_DEFINE.ends_with(EXTRA_INIT_SYMBOL));
    }
}
