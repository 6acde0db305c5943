//! SQLite Map Store Connection and CRUD Operations
//!
//! This module provides a wrapper around rusqlite for the sector map. Only the
//! writer thread mutates through it; route planners open their own read
//! connection per invocation.

use crate::model::{ClassPattern, Planet, Port, PortClass, SectorId, Stock};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};

use super::ops::{WriteOp, WriteSink};
use super::schema::{
    MAP_SCHEMA_VERSION, PORT_COLUMNS, SCHEMA_CREATE_INDEXES, SCHEMA_TABLES,
};

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid stored value for {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
}

/// Row counts, for status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MapStats {
    pub sectors: usize,
    pub warps: usize,
    pub explored: usize,
    pub ports: usize,
    pub planets: usize,
    pub fighters: usize,
}

/// A connection to the map database
pub struct GraphStore {
    conn: Connection,
}

impl GraphStore {
    /// Open (creating if needed) the map database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::configure_connection(&conn)?;
        let store = Self { conn };
        store.create_schema()?;
        debug!("Opened map store at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory map database (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    /// Configure connection for one writer and concurrent readers
    fn configure_connection(conn: &Connection) -> SqliteResult<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        // readers may hit the writer mid-commit
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(())
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        for sql in SCHEMA_TABLES {
            self.conn.execute(sql, [])?;
        }
        self.conn.execute_batch(SCHEMA_CREATE_INDEXES)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES ('schema_version', ?1)",
            [MAP_SCHEMA_VERSION],
        )?;
        Ok(())
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Apply one queued operation in its own transaction.
    pub fn apply(&self, op: &WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::RecordWarps {
                source,
                destinations,
            } => self.record_warps(*source, destinations),
            WriteOp::RecordRoute { sectors } => self.record_route(sectors),
            WriteOp::UpsertPort(port) => self.upsert_port(port),
            WriteOp::UpsertPlanet(planet) => self.upsert_planet(planet),
            WriteOp::ClearFighters => self.clear_fighters().map(|_| ()),
            WriteOp::AddFighter(sector) => self.add_fighter(*sector),
            WriteOp::SaveSetting { key, value } => self.set_setting(key, value),
        }
    }

    /// Insert a directed edge. Repeating an edge is a no-op.
    pub fn upsert_warp(&self, source: SectorId, destination: SectorId) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO warps (source, destination) VALUES (?1, ?2)",
            params![source, destination],
        )?;
        Ok(())
    }

    /// Mark a sector explored. Markers are never removed.
    pub fn mark_explored(&self, sector: SectorId) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO explored (sector) VALUES (?1)",
            [sector],
        )?;
        Ok(())
    }

    /// Store a warp-list report for `source`.
    pub fn record_warps(
        &self,
        source: SectorId,
        destinations: &[SectorId],
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO explored (sector) VALUES (?1)",
            [source],
        )?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO warps (source, destination) VALUES (?1, ?2)")?;
            for destination in destinations {
                stmt.execute(params![source, destination])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Store one edge per consecutive pair of a plotted course.
    pub fn record_route(&self, sectors: &[SectorId]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO warps (source, destination) VALUES (?1, ?2)")?;
            for pair in sectors.windows(2) {
                stmt.execute(params![pair[0], pair[1]])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Replace the port row for `port.sector`, refreshing its last-seen date.
    pub fn upsert_port(&self, port: &Port) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            REPLACE INTO ports (sector, class, ore_amt, ore_pct, org_amt, org_pct, equ_amt, equ_pct, last_seen)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, date('now'))
            "#,
            params![
                port.sector,
                port.class.as_str(),
                port.ore.amount,
                port.ore.percent,
                port.organics.amount,
                port.organics.percent,
                port.equipment.amount,
                port.equipment.percent,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_planet(&self, planet: &Planet) -> Result<(), StoreError> {
        self.conn.execute(
            "REPLACE INTO planets (sector, id, name, class, citadel) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                planet.sector,
                planet.id,
                planet.name,
                planet.class.to_string(),
                planet.citadel,
            ],
        )?;
        Ok(())
    }

    /// Forget every deployed fighter. Returns the number of rows removed.
    pub fn clear_fighters(&self) -> Result<usize, StoreError> {
        Ok(self.conn.execute("DELETE FROM fighters", [])?)
    }

    pub fn add_fighter(&self, sector: SectorId) -> Result<(), StoreError> {
        self.conn
            .execute("REPLACE INTO fighters (sector) VALUES (?1)", [sector])?;
        Ok(())
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // =========================================================================
    // Settings Queries
    // =========================================================================

    /// Every persisted setting.
    pub fn load_settings(&self) -> Result<HashMap<String, String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings")?;
        let settings = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .filter_map(|row| match row {
                Ok((key, Some(value))) => Some(Ok((key, value))),
                Ok((_, None)) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<SqliteResult<HashMap<_, _>>>()?;
        Ok(settings)
    }

    pub fn setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<Option<String>> = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value.flatten())
    }

    /// The recorded StarDock sector, if any.
    pub fn stardock(&self) -> Result<Option<SectorId>, StoreError> {
        match self.setting("stardock")? {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| StoreError::InvalidValue {
                    column: "settings.stardock",
                    value,
                }),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Warp Queries
    // =========================================================================

    /// Every edge, in the order it was first observed.
    pub fn warps(&self) -> Result<Vec<(SectorId, SectorId)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, destination FROM warps ORDER BY rowid")?;
        let warps = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(warps)
    }

    pub fn warps_from(&self, sector: SectorId) -> Result<Vec<SectorId>, StoreError> {
        self.sector_list(
            "SELECT destination FROM warps WHERE source = ?1 ORDER BY rowid",
            [sector],
        )
    }

    pub fn warps_to(&self, sector: SectorId) -> Result<Vec<SectorId>, StoreError> {
        self.sector_list(
            "SELECT source FROM warps WHERE destination = ?1 ORDER BY rowid",
            [sector],
        )
    }

    /// Every sector with at least one known outgoing warp.
    pub fn all_sectors(&self) -> Result<Vec<SectorId>, StoreError> {
        self.sector_list(
            "SELECT source FROM warps GROUP BY source ORDER BY MIN(rowid)",
            [],
        )
    }

    pub fn explored_sectors(&self) -> Result<HashSet<SectorId>, StoreError> {
        Ok(self
            .sector_list("SELECT sector FROM explored", [])?
            .into_iter()
            .collect())
    }

    /// Sectors with exactly one way in and one way out.
    pub fn dead_ends(&self) -> Result<Vec<SectorId>, StoreError> {
        self.sector_list(
            r#"
            SELECT source AS sector FROM warps GROUP BY source HAVING count(*) = 1
            INTERSECT
            SELECT destination AS sector FROM warps GROUP BY destination HAVING count(*) = 1
            "#,
            [],
        )
    }

    // =========================================================================
    // Port, Planet and Fighter Queries
    // =========================================================================

    pub fn ports(&self) -> Result<Vec<Port>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM ports ORDER BY sector", PORT_COLUMNS))?;
        let rows = stmt
            .query_map([], Self::row_to_port)?
            .collect::<SqliteResult<Vec<_>>>()?;
        rows.into_iter().collect()
    }

    pub fn port(&self, sector: SectorId) -> Result<Option<Port>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM ports WHERE sector = ?1", PORT_COLUMNS),
                [sector],
                Self::row_to_port,
            )
            .optional()?;
        row.transpose()
    }

    /// Sectors whose port class matches `pattern`.
    pub fn ports_matching(&self, pattern: &ClassPattern) -> Result<Vec<SectorId>, StoreError> {
        self.sector_list(
            "SELECT sector FROM ports WHERE class LIKE ?1 ORDER BY sector",
            [pattern.to_like()],
        )
    }

    pub fn planets(&self) -> Result<Vec<Planet>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT sector, id, name, class, citadel FROM planets ORDER BY id")?;
        let planets = stmt
            .query_map([], |row| {
                let class: String = row.get(3)?;
                Ok(Planet {
                    sector: row.get(0)?,
                    id: row.get(1)?,
                    name: row.get(2)?,
                    class: class.chars().next().unwrap_or('?'),
                    citadel: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(planets)
    }

    pub fn fighter_sectors(&self) -> Result<Vec<SectorId>, StoreError> {
        self.sector_list("SELECT sector FROM fighters ORDER BY sector", [])
    }

    /// Explored sectors with no known port.
    pub fn blind_warps(&self) -> Result<Vec<SectorId>, StoreError> {
        self.sector_list(
            r#"
            SELECT sector FROM explored
            WHERE NOT EXISTS (SELECT sector FROM ports WHERE explored.sector = ports.sector)
            ORDER BY sector
            "#,
            [],
        )
    }

    pub fn stats(&self) -> Result<MapStats, StoreError> {
        let count = |sql: &str| -> Result<usize, StoreError> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok(MapStats {
            sectors: count(
                "SELECT COUNT(*) FROM (SELECT source FROM warps UNION SELECT destination FROM warps)",
            )?,
            warps: count("SELECT COUNT(*) FROM warps")?,
            explored: count("SELECT COUNT(*) FROM explored")?,
            ports: count("SELECT COUNT(*) FROM ports")?,
            planets: count("SELECT COUNT(*) FROM planets")?,
            fighters: count("SELECT COUNT(*) FROM fighters")?,
        })
    }

    fn sector_list<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<SectorId>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let sectors = stmt
            .query_map(params, |row| row.get(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(sectors)
    }

    /// Convert a database row to a Port
    fn row_to_port(row: &rusqlite::Row<'_>) -> SqliteResult<Result<Port, StoreError>> {
        let class: String = row.get(1)?;
        let class = match class.parse::<PortClass>() {
            Ok(class) => class,
            Err(_) => {
                return Ok(Err(StoreError::InvalidValue {
                    column: "ports.class",
                    value: class,
                }))
            }
        };
        let stock = |amount: usize, percent: usize| -> SqliteResult<Stock> {
            Ok(Stock {
                amount: row.get(amount)?,
                percent: row.get(percent)?,
            })
        };
        Ok(Ok(Port {
            sector: row.get(0)?,
            class,
            ore: stock(2, 3)?,
            organics: stock(4, 5)?,
            equipment: stock(6, 7)?,
            last_seen: row.get(8)?,
        }))
    }
}

impl WriteSink for GraphStore {
    /// Runs the operation immediately. Failures are logged, never raised.
    fn submit(&self, op: WriteOp) {
        if let Err(e) = self.apply(&op) {
            error!(op = ?op, error = %e, "Map write failed: {}", op.name());
        }
    }
}
