//! Runs in its own process: nothing here may register an auto extension.

use std::ffi::CString;

use rusqlite::{ffi, Connection};

use sqlite_vec_init::error::VecInitError;
use sqlite_vec_init::ext::init_connection;
use sqlite_vec_init::hook::{extra_init, sqlite3_wasm_extra_init};
use sqlite_vec_init::store::vec_version;
use sqlite_vec_init_test::has_vec_functions;

#[test]
fn test_hook_returns_ok_for_any_input() {
    assert_eq!(sqlite3_wasm_extra_init(std::ptr::null()), ffi::SQLITE_OK);

    let text = CString::new("anything").unwrap();
    assert_eq!(sqlite3_wasm_extra_init(text.as_ptr()), ffi::SQLITE_OK);
    assert_eq!(extra_init(Some(text.as_c_str())), ffi::SQLITE_OK);
}

#[test]
fn test_hook_does_not_register_extension() {
    for _ in 0..16 {
        sqlite3_wasm_extra_init(std::ptr::null());
    }

    let conn = Connection::open_in_memory().unwrap();
    assert!(!has_vec_functions(&conn));
    assert!(matches!(
        vec_version(&conn),
        Err(VecInitError::ExtensionMissing)
    ));
}

#[test]
fn test_manual_init_after_hook() {
    sqlite3_wasm_extra_init(std::ptr::null());

    let conn = Connection::open_in_memory().unwrap();
    init_connection(&conn).unwrap();
    assert!(has_vec_functions(&conn));

    // Only the connection that was initialized gets the functions.
    let other = Connection::open_in_memory().unwrap();
    assert!(!has_vec_functions(&other));
}
