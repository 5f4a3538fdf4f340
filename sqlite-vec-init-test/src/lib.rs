use std::path::Path;

use rusqlite::Connection;
use sqlite_vec_init::config::{InitMode, Settings, DEFAULT_DIMENSION, DEFAULT_KNN_LIMIT};

/// Manual-mode `Settings` pointing at `db_path`.
pub fn test_settings(db_path: &Path) -> Settings {
    Settings {
        database: db_path.to_string_lossy().into_owned(),
        init_mode: InitMode::Manual,
        dimension: DEFAULT_DIMENSION,
        knn_limit: DEFAULT_KNN_LIMIT,
    }
}

/// `(rowid, embedding)` pairs spread along the diagonal of 3-space.
pub fn sample_vectors() -> Vec<(i64, Vec<f32>)> {
    vec![
        (1, vec![1.0, 2.0, 3.0]),
        (2, vec![4.0, 5.0, 6.0]),
        (3, vec![7.0, 8.0, 9.0]),
        (4, vec![10.0, 11.0, 12.0]),
    ]
}

pub fn has_vec_functions(conn: &Connection) -> bool {
    conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
        .is_ok()
}

/// Install a test subscriber so library logs show up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
