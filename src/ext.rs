use std::ffi::{c_char, c_int, CStr};
use std::ptr;

use rusqlite::{ffi, Connection};
use tracing::{debug, info};

use crate::config::{InitMode, Settings};
use crate::error::{Result, VecInitError};

#[link(name = "sqlite_vec0")]
unsafe extern "C" {
    #[link_name = "sqlite3_vec_init"]
    fn sqlite3_vec_init_raw(
        db: *mut ffi::sqlite3,
        pz_err_msg: *mut *mut c_char,
        p_api: *const ffi::sqlite3_api_routines,
    ) -> c_int;
}

/// Attach sqlite-vec to an already opened connection.
///
/// Equivalent to `sqlite3_vec_init(db, &err, NULL)`. Calling it again on the same
/// connection re-registers the functions and succeeds.
pub fn init_connection(conn: &Connection) -> Result<()> {
    let mut err_msg: *mut c_char = ptr::null_mut();
    // SAFETY: the handle stays valid while `conn` is borrowed; sqlite-vec is linked
    // statically against the same SQLite, so no API routines table is needed.
    let code = unsafe { sqlite3_vec_init_raw(conn.handle(), &mut err_msg, ptr::null()) };

    // SAFETY: `err_msg` is either null or allocated by sqlite3_malloc.
    unsafe { init_status(code, err_msg) }?;
    debug!("sqlite-vec initialized on connection");
    Ok(())
}

/// Turn the initializer's status and message slot into a `Result`, freeing the message.
unsafe fn init_status(code: c_int, err_msg: *mut c_char) -> Result<()> {
    let message = take_error_message(err_msg);
    if code == ffi::SQLITE_OK {
        return Ok(());
    }

    Err(VecInitError::ExtensionInit {
        code,
        message: message.unwrap_or_else(|| ffi::Error::new(code).to_string()),
    })
}

unsafe fn take_error_message(err_msg: *mut c_char) -> Option<String> {
    if err_msg.is_null() {
        return None;
    }
    let message = CStr::from_ptr(err_msg).to_string_lossy().into_owned();
    ffi::sqlite3_free(err_msg.cast());
    Some(message)
}

/// Open the configured database with sqlite-vec available on it.
pub fn open(settings: &Settings) -> Result<Connection> {
    settings.validate()?;

    let auto_loaded = prepare(settings.init_mode)?;
    let conn = if settings.is_in_memory() {
        Connection::open_in_memory()?
    } else {
        Connection::open(&settings.database)?
    };

    if !auto_loaded {
        init_connection(&conn)?;
    }

    info!(
        "Opened {} with sqlite-vec (mode={})",
        settings.database, settings.init_mode
    );
    Ok(conn)
}

/// Returns `true` when connections opened afterwards get sqlite-vec automatically.
fn prepare(mode: InitMode) -> Result<bool> {
    if !mode.is_auto() {
        return Ok(false);
    }

    #[cfg(not(target_family = "wasm"))]
    {
        register_auto_extension()?;
        Ok(true)
    }
    #[cfg(target_family = "wasm")]
    {
        tracing::warn!("Auto extensions are unavailable on WASM, initializing manually");
        Ok(false)
    }
}

/// Register sqlite-vec as SQLite auto extension.
///
/// Safe to call multiple times because SQLite de-duplicates auto-extensions.
#[cfg(not(target_family = "wasm"))]
pub fn register_auto_extension() -> Result<()> {
    use rusqlite::auto_extension::{self, RawAutoExtension};

    let ext: RawAutoExtension = sqlite3_vec_init_raw;
    unsafe { auto_extension::register_auto_extension(ext) }
        .map_err(VecInitError::AutoExtension)?;
    debug!("Registered sqlite-vec auto extension");
    Ok(())
}

/// Remove the auto extension again. Returns `false` if it was not registered.
#[cfg(not(target_family = "wasm"))]
pub fn cancel_auto_extension() -> bool {
    use rusqlite::auto_extension::{self, RawAutoExtension};

    let ext: RawAutoExtension = sqlite3_vec_init_raw;
    auto_extension::cancel_auto_extension(ext)
}
