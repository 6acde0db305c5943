//! SQLite Schema Definitions for the Sector Map
//!
//! The map store outlives any single session: every table is created with
//! `IF NOT EXISTS` so opening an existing database is a no-op.

/// Schema version recorded in the settings table
pub const MAP_SCHEMA_VERSION: &str = "1";

/// SQL to create the ports table
///
/// One row per sector. A new report replaces the whole row.
pub const SCHEMA_CREATE_PORTS: &str = r#"
CREATE TABLE IF NOT EXISTS ports (
    sector INTEGER PRIMARY KEY,
    class TEXT,
    ore_amt INTEGER,
    ore_pct INTEGER,
    org_amt INTEGER,
    org_pct INTEGER,
    equ_amt INTEGER,
    equ_pct INTEGER,
    last_seen INTEGER
)
"#;

/// SQL to create the warps table
///
/// Directed edges. Rows are only ever inserted once, so rowid order is the
/// order edges were first observed.
pub const SCHEMA_CREATE_WARPS: &str = r#"
CREATE TABLE IF NOT EXISTS warps (
    source INTEGER,
    destination INTEGER,
    PRIMARY KEY (source, destination)
)
"#;

/// SQL to create the explored marker table
pub const SCHEMA_CREATE_EXPLORED: &str = r#"
CREATE TABLE IF NOT EXISTS explored (
    sector INTEGER PRIMARY KEY
)
"#;

/// SQL to create the planets table
pub const SCHEMA_CREATE_PLANETS: &str = r#"
CREATE TABLE IF NOT EXISTS planets (
    sector INTEGER,
    id INTEGER PRIMARY KEY,
    name TEXT,
    class TEXT,
    citadel INTEGER
)
"#;

/// SQL to create the deployed fighters table
pub const SCHEMA_CREATE_FIGHTERS: &str = r#"
CREATE TABLE IF NOT EXISTS fighters (
    sector INTEGER PRIMARY KEY
)
"#;

/// SQL to create the settings table
pub const SCHEMA_CREATE_SETTINGS: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT
)
"#;

/// SQL to create indexes for reverse lookups
pub const SCHEMA_CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_warps_destination ON warps(destination);
CREATE INDEX IF NOT EXISTS idx_planets_sector ON planets(sector);
"#;

/// Every table, in creation order
pub const SCHEMA_TABLES: [&str; 6] = [
    SCHEMA_CREATE_PORTS,
    SCHEMA_CREATE_WARPS,
    SCHEMA_CREATE_EXPLORED,
    SCHEMA_CREATE_PLANETS,
    SCHEMA_CREATE_FIGHTERS,
    SCHEMA_CREATE_SETTINGS,
];

/// Column names for port queries (in order for row mapping)
pub const PORT_COLUMNS: &str =
    "sector, class, ore_amt, ore_pct, org_amt, org_pct, equ_amt, equ_pct, last_seen";
