use std::sync::LazyLock;

use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};
use zerocopy::IntoBytes;

use crate::config::MAX_DIMENSION;
use crate::error::{Result, VecInitError};

pub const SMOKE_TABLE_NAME: &str = "vec_smoke";
const SMOKE_ROWS: i64 = 3;

static TABLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static FLOAT_COLUMN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfloat\[\s*(\d+)\s*\]").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub rowid: i64,
    pub distance: f64,
}

/// `vec_version()` of the extension attached to `conn`.
pub fn vec_version(conn: &Connection) -> Result<String> {
    conn.query_row("SELECT vec_version()", [], |row| row.get(0))
        .map_err(missing_extension)
}

pub fn sqlite_version() -> &'static str {
    rusqlite::version()
}

fn missing_extension(err: rusqlite::Error) -> VecInitError {
    // Prepare failures surface as `SqlInputError`, batch failures as `SqliteFailure`.
    let msg = match &err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.as_str(),
        rusqlite::Error::SqlInputError { msg, .. } => msg.as_str(),
        _ => return err.into(),
    };
    if msg.starts_with("no such function: vec_") || msg.starts_with("no such module: vec0") {
        VecInitError::ExtensionMissing
    } else {
        err.into()
    }
}

/// Declared `float[N]` dimension of an existing table, `None` if it does not exist.
fn existing_dimension(conn: &Connection, name: &str) -> Result<Option<usize>> {
    let sql: Option<Option<String>> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;

    Ok(sql.map(|sql| {
        sql.as_deref()
            .and_then(|sql| FLOAT_COLUMN_RE.captures(sql))
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or(0)
    }))
}

// -- VecTable -----------------------------------------------------------------

/// A `vec0` virtual table with a single `embedding float[N]` column.
#[derive(Debug, Clone)]
pub struct VecTable {
    name: String,
    dimension: usize,
}

impl VecTable {
    pub fn create(conn: &Connection, name: &str, dimension: usize) -> Result<Self> {
        if !TABLE_NAME_RE.is_match(name) {
            return Err(VecInitError::InvalidTableName {
                name: name.to_string(),
            });
        }
        if dimension == 0 || dimension > MAX_DIMENSION {
            return Err(VecInitError::InvalidDimension(dimension));
        }

        if let Some(existing) = existing_dimension(conn, name)? {
            if existing != dimension {
                return Err(VecInitError::DimensionMismatch {
                    expected: existing,
                    actual: dimension,
                });
            }
        }

        conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {name} USING vec0(embedding float[{dimension}]);"
        ))
        .map_err(missing_extension)?;
        debug!("Created vec0 table {} (dim={})", name, dimension);

        Ok(Self {
            name: name.to_string(),
            dimension,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VecInitError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Vectors are stored as native-endian `f32` blobs.
    pub fn insert(&self, conn: &Connection, rowid: i64, embedding: &[f32]) -> Result<()> {
        self.check_dimension(embedding)?;
        conn.execute(
            &format!("INSERT INTO {}(rowid, embedding) VALUES (?1, ?2)", self.name),
            params![rowid, embedding.as_bytes()],
        )?;
        Ok(())
    }

    pub fn len(&self, conn: &Connection) -> Result<usize> {
        let count: i64 = conn.query_row(&format!("SELECT count(*) FROM {}", self.name), [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }

    pub fn is_empty(&self, conn: &Connection) -> Result<bool> {
        Ok(self.len(conn)? == 0)
    }

    /// The `k` nearest rows to `query`, closest first.
    pub fn knn(&self, conn: &Connection, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimension(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT rowid, distance FROM {} WHERE embedding MATCH ?1 AND k = ?2 ORDER BY distance",
            self.name
        ))?;
        let rows = stmt.query_map(params![query.as_bytes(), k as i64], |row| {
            Ok(Neighbor {
                rowid: row.get(0)?,
                distance: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn drop_table(self, conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", self.name))?;
        Ok(())
    }
}

// -- Smoke test ---------------------------------------------------------------

/// Row `rowid` holds `[3(rowid-1)+1, 3(rowid-1)+2, ...]`, so the 3-dim rows are
/// `[1,2,3]`, `[4,5,6]` and `[7,8,9]`.
fn smoke_vector(rowid: i64, dimension: usize) -> Vec<f32> {
    let base = 3 * (rowid - 1) as usize;
    (0..dimension).map(|j| (base + j + 1) as f32).collect()
}

/// Create a scratch vec0 table, run one KNN query against it and drop it again.
pub fn smoke_test(conn: &Connection, dimension: usize, k: usize) -> Result<Vec<Neighbor>> {
    let version = vec_version(conn)?;
    info!("sqlite-vec {} on SQLite {}", version, sqlite_version());

    conn.execute_batch(&format!("DROP TABLE IF EXISTS {SMOKE_TABLE_NAME};"))?;
    let table = VecTable::create(conn, SMOKE_TABLE_NAME, dimension)?;
    for rowid in 1..=SMOKE_ROWS {
        table.insert(conn, rowid, &smoke_vector(rowid, dimension))?;
    }

    let query: Vec<f32> = smoke_vector(1, dimension).iter().map(|x| x + 0.5).collect();
    let neighbors = table.knn(conn, &query, k)?;
    table.drop_table(conn)?;

    info!("Smoke query returned {} neighbors", neighbors.len());
    Ok(neighbors)
}
