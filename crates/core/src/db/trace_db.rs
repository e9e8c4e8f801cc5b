use std::path::{Path, PathBuf};

use log::{debug, info};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};
use thiserror::Error;

use crate::db::models::{QueryResult, TraceData};
use crate::model::{Address, AddressError, Capability, ElfSymbol, MemoryMapEntry};

/// Memory-map table written by the capture tool.
pub const VM_TABLE: &str = "vm";

/// Capability table written by the capture tool.
pub const CAP_TABLE: &str = "cap_info";

/// Symbol table written when the capture resolves ELF symbols.
pub const SYM_TABLE: &str = "elf_sym";

/// Path recorded for mappings identified as heap blocks.
pub const HEAP_BLOCK_PATH: &str = "heap block";

/// Error type for trace database operations.
#[derive(Debug, Error)]
pub enum TraceDbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Trace database not found at {0}")]
    MissingDatabase(PathBuf),

    /// An address cell could not be decoded; the trace is corrupt.
    #[error("Failed to decode {table}.{column} in row {row}: {source}")]
    Decode {
        table: &'static str,
        column: &'static str,
        row: usize,
        #[source]
        source: AddressError,
    },

    #[error("Invalid integer in {table}.{column} row {row}: {value}")]
    InvalidInteger { table: &'static str, column: &'static str, row: usize, value: String },
}

/// Convenience result type for trace DB operations.
pub type TraceDbResult<T> = Result<T, TraceDbError>;

/// SQLite-backed capability trace.
///
/// Thin wrapper around `rusqlite::Connection`:
/// - Opens the capture database (read-only unless tagging heap blocks).
/// - Materializes the `vm` and `cap_info` tables into model records.
/// - Runs passthrough queries for ad-hoc inspection.
#[derive(Debug)]
pub struct TraceDb {
    conn: Connection,
    path: PathBuf,
}

impl TraceDb {
    /// Open an existing trace database read-only.
    pub fn open(path: &Path) -> TraceDbResult<Self> {
        Self::open_with(path, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)
    }

    /// Open an existing trace database for writing (heap tagging only).
    pub fn open_writable(path: &Path) -> TraceDbResult<Self> {
        Self::open_with(path, OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX)
    }

    fn open_with(path: &Path, flags: OpenFlags) -> TraceDbResult<Self> {
        if !path.is_file() {
            return Err(TraceDbError::MissingDatabase(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(path, flags)?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn table_exists(&self, table: &str) -> TraceDbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn columns(&self, table: &str) -> TraceDbResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        let rows = stmt.query_map(params![table], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Load every `vm` row in table order.
    ///
    /// A missing table yields an empty list. Captures predating compartment
    /// support lack `compart_id`; their entries carry no compartment. The
    /// kernel attribute columns are optional in the same way.
    pub fn load_memory_map(&self) -> TraceDbResult<Vec<MemoryMapEntry>> {
        if !self.table_exists(VM_TABLE)? {
            info!("trace has no {} table; memory map is empty", VM_TABLE);
            return Ok(Vec::new());
        }

        let columns = self.columns(VM_TABLE)?;
        let optional = |name: &str| {
            if columns.iter().any(|c| c == name) {
                name.to_string()
            } else {
                "NULL".to_string()
            }
        };
        let sql = format!(
            "SELECT mmap_path, start_addr, end_addr, {}, {}, {}, {} FROM vm ORDER BY rowid",
            optional("compart_id"),
            optional("kve_protection"),
            optional("mmap_flags"),
            optional("vnode_type"),
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        let mut index = 0usize;
        while let Some(row) = rows.next()? {
            out.push(MemoryMapEntry {
                path: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                start_addr: decode_address(VM_TABLE, "start_addr", index, row.get_ref(1)?)?,
                end_addr: decode_address(VM_TABLE, "end_addr", index, row.get_ref(2)?)?,
                compartment_id: decode_integer(VM_TABLE, "compart_id", index, row.get_ref(3)?)?,
                protection: decode_integer(VM_TABLE, "kve_protection", index, row.get_ref(4)?)?,
                flags: decode_integer(VM_TABLE, "mmap_flags", index, row.get_ref(5)?)?,
                vnode_type: decode_integer(VM_TABLE, "vnode_type", index, row.get_ref(6)?)?,
            });
            index += 1;
        }

        debug!("loaded {} memory-map entries", out.len());
        Ok(out)
    }

    /// Load every `cap_info` row in table order.
    pub fn load_capabilities(&self) -> TraceDbResult<Vec<Capability>> {
        if !self.table_exists(CAP_TABLE)? {
            info!("trace has no {} table; no capabilities", CAP_TABLE);
            return Ok(Vec::new());
        }

        // Some captures prefix the bounds columns.
        let columns = self.columns(CAP_TABLE)?;
        let (base_col, top_col) = if columns.iter().any(|c| c == "cap_base") {
            ("cap_base", "cap_top")
        } else {
            ("base", "top")
        };
        let sql = format!(
            "SELECT cap_loc_path, cap_loc_addr, cap_addr, perms, {base_col}, {top_col} FROM cap_info ORDER BY rowid"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        let mut index = 0usize;
        while let Some(row) = rows.next()? {
            out.push(Capability {
                location_path: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                location_addr: decode_address(CAP_TABLE, "cap_loc_addr", index, row.get_ref(1)?)?,
                target_addr: decode_address(CAP_TABLE, "cap_addr", index, row.get_ref(2)?)?,
                perms: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                base: decode_address(CAP_TABLE, base_col, index, row.get_ref(4)?)?,
                top: decode_address(CAP_TABLE, top_col, index, row.get_ref(5)?)?,
            });
            index += 1;
        }

        debug!("loaded {} capabilities", out.len());
        Ok(out)
    }

    /// Load every `elf_sym` row in table order; empty when symbols were not captured.
    pub fn load_symbols(&self) -> TraceDbResult<Vec<ElfSymbol>> {
        if !self.table_exists(SYM_TABLE)? {
            info!("trace has no {} table; no symbols", SYM_TABLE);
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT source_path, st_name, type, addr FROM elf_sym ORDER BY rowid")?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        let mut index = 0usize;
        while let Some(row) = rows.next()? {
            out.push(ElfSymbol {
                source_path: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                kind: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                addr: decode_address(SYM_TABLE, "addr", index, row.get_ref(3)?)?,
            });
            index += 1;
        }

        debug!("loaded {} symbols", out.len());
        Ok(out)
    }

    /// Load both tables.
    pub fn load(&self) -> TraceDbResult<TraceData> {
        Ok(TraceData { entries: self.load_memory_map()?, capabilities: self.load_capabilities()? })
    }

    /// Run an arbitrary statement and return its rows verbatim.
    ///
    /// Read-only handles reject writes at the SQLite level.
    pub fn run_query(&self, sql: &str) -> TraceDbResult<QueryResult> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(json_cell(row.get_ref(i)?));
            }
            out.push(cells);
        }
        Ok(QueryResult { columns, rows: out })
    }

    /// Rename every `vm` row containing one of `blocks` to [`HEAP_BLOCK_PATH`].
    ///
    /// Returns the number of rows updated. Requires a writable handle.
    pub fn tag_heap_blocks(&self, blocks: &[Address]) -> TraceDbResult<usize> {
        if blocks.is_empty() || !self.table_exists(VM_TABLE)? {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut matched: Vec<i64> = Vec::new();
        {
            let mut stmt = tx.prepare("SELECT rowid, start_addr, end_addr FROM vm ORDER BY rowid")?;
            let mut rows = stmt.query([])?;
            let mut index = 0usize;
            while let Some(row) = rows.next()? {
                let rowid: i64 = row.get(0)?;
                let start = decode_address(VM_TABLE, "start_addr", index, row.get_ref(1)?)?;
                let end = decode_address(VM_TABLE, "end_addr", index, row.get_ref(2)?)?;
                if blocks.iter().any(|b| start <= *b && *b <= end) {
                    matched.push(rowid);
                }
                index += 1;
            }
        }

        let mut updated = 0usize;
        {
            let mut stmt = tx.prepare("UPDATE vm SET mmap_path = ?1 WHERE rowid = ?2")?;
            for rowid in &matched {
                updated += stmt.execute(params![HEAP_BLOCK_PATH, rowid])?;
            }
        }
        tx.commit()?;

        info!("tagged {} memory-map rows as {}", updated, HEAP_BLOCK_PATH);
        Ok(updated)
    }
}

fn decode_address(
    table: &'static str,
    column: &'static str,
    row: usize,
    value: ValueRef<'_>,
) -> TraceDbResult<Address> {
    let decoded = match value {
        ValueRef::Integer(i) => Address::from_i64(i),
        ValueRef::Text(bytes) => Address::parse(&String::from_utf8_lossy(bytes)),
        ValueRef::Null => Err(AddressError::Empty),
        ValueRef::Real(r) => {
            Err(AddressError::Invalid { value: r.to_string(), reason: "real number".into() })
        }
        ValueRef::Blob(_) => {
            Err(AddressError::Invalid { value: "<blob>".into(), reason: "binary cell".into() })
        }
    };
    decoded.map_err(|source| TraceDbError::Decode { table, column, row, source })
}

fn decode_integer(
    table: &'static str,
    column: &'static str,
    row: usize,
    value: ValueRef<'_>,
) -> TraceDbResult<Option<i64>> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(i)),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            text.trim().parse::<i64>().map(Some).map_err(|_| TraceDbError::InvalidInteger {
                table,
                column,
                row,
                value: text.to_string(),
            })
        }
        other => Err(TraceDbError::InvalidInteger {
            table,
            column,
            row,
            value: format!("{:?}", other.data_type()),
        }),
    }
}

fn json_cell(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(r) => serde_json::Number::from_f64(r)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into()),
        ValueRef::Blob(bytes) => {
            serde_json::Value::String(bytes.iter().map(|b| format!("{:02x}", b)).collect())
        }
    }
}
