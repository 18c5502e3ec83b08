// ==========================================
// 供应商耐久性评分系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键/WAL/busy_timeout)
// - 幂等建表,写入 schema_version
// - 统一时间/日期列的存储格式
// ==========================================

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 共享连接
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 建表语句
///
/// 说明：
/// - 批次/评价/日志为审计链，使用触发器禁止 UPDATE/DELETE
/// - 供应商禁止 DELETE（指标列允许累加）
/// - seq 自增列用于保持插入顺序
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS vendor (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    vendor_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    contact TEXT NOT NULL,
    total_jobs INTEGER NOT NULL DEFAULT 0 CHECK (total_jobs >= 0),
    failed_jobs INTEGER NOT NULL DEFAULT 0 CHECK (failed_jobs >= 0 AND failed_jobs <= total_jobs),
    registered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS service_center (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    center_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    company_name TEXT NOT NULL,
    location TEXT NOT NULL,
    phone TEXT NOT NULL,
    capacity INTEGER NOT NULL CHECK (capacity > 0),
    registered_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS supply_batch (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id TEXT NOT NULL UNIQUE,
    vendor_id TEXT NOT NULL REFERENCES vendor(vendor_id),
    company_name TEXT NOT NULL,
    batch_month TEXT NOT NULL,
    window_start TEXT NOT NULL,
    window_end TEXT NOT NULL,
    total_quantity INTEGER NOT NULL,
    total_failures INTEGER NOT NULL,
    ingested_at TEXT NOT NULL,
    CHECK (window_start <= window_end)
);

CREATE INDEX IF NOT EXISTS idx_supply_batch_vendor ON supply_batch(vendor_id, seq);

CREATE TABLE IF NOT EXISTS batch_part (
    batch_id TEXT NOT NULL REFERENCES supply_batch(batch_id),
    line_no INTEGER NOT NULL,
    sku TEXT NOT NULL,
    name TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    failures_logged INTEGER NOT NULL DEFAULT 0 CHECK (failures_logged >= 0 AND failures_logged <= quantity),
    PRIMARY KEY (batch_id, line_no)
);

CREATE TABLE IF NOT EXISTS vendor_feedback (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    feedback_id TEXT NOT NULL UNIQUE,
    vendor_id TEXT NOT NULL REFERENCES vendor(vendor_id),
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    review TEXT NOT NULL,
    response_time_secs REAL CHECK (response_time_secs IS NULL OR response_time_secs >= 0),
    submitted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_vendor_feedback_vendor ON vendor_feedback(vendor_id, seq);

CREATE TABLE IF NOT EXISTS action_log (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    action_id TEXT NOT NULL UNIQUE,
    action_type TEXT NOT NULL,
    actor TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    target_id TEXT NOT NULL,
    payload_json TEXT,
    detail TEXT
);

CREATE INDEX IF NOT EXISTS idx_action_log_target ON action_log(target_id);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TRIGGER IF NOT EXISTS trg_vendor_no_delete
BEFORE DELETE ON vendor
BEGIN
    SELECT RAISE(ABORT, 'vendor is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_supply_batch_no_update
BEFORE UPDATE ON supply_batch
BEGIN
    SELECT RAISE(ABORT, 'supply_batch is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_supply_batch_no_delete
BEFORE DELETE ON supply_batch
BEGIN
    SELECT RAISE(ABORT, 'supply_batch is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_batch_part_no_update
BEFORE UPDATE ON batch_part
BEGIN
    SELECT RAISE(ABORT, 'batch_part is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_batch_part_no_delete
BEFORE DELETE ON batch_part
BEGIN
    SELECT RAISE(ABORT, 'batch_part is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_vendor_feedback_no_update
BEFORE UPDATE ON vendor_feedback
BEGIN
    SELECT RAISE(ABORT, 'vendor_feedback is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_vendor_feedback_no_delete
BEFORE DELETE ON vendor_feedback
BEGIN
    SELECT RAISE(ABORT, 'vendor_feedback is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_action_log_no_update
BEFORE UPDATE ON action_log
BEGIN
    SELECT RAISE(ABORT, 'action_log is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_action_log_no_delete
BEFORE DELETE ON action_log
BEGIN
    SELECT RAISE(ABORT, 'action_log is append-only');
END;
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
/// - WAL 允许读事务与写事务并行
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "SQLite 连接已配置");
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 幂等建表并记录 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 打开数据库、建表并包装为共享连接
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<SharedConnection> {
    let mut conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    crate::perf::install_sqlite_tracing(&mut conn);

    match read_schema_version(&conn)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                db_version = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema 版本高于当前程序，可能存在不兼容"
            );
        }
        _ => {}
    }

    Ok(Arc::new(Mutex::new(conn)))
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// 列格式工具
// ==========================================

/// 当前本地时间，截断到秒（与 TS_FORMAT 存储精度一致）
pub fn now_ts() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// 读取时间戳列，格式错误时返回转换错误（不静默回填默认值）
pub fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TS_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 读取日期列
pub fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_read_schema_version_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }

    #[test]
    fn test_batch_ledger_rejects_delete() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO vendor (vendor_id, name, category, contact, registered_at)
             VALUES ('V-1', 'Acme', 'Brakes', 'ops@acme.test', '2026-01-01 00:00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO supply_batch (batch_id, vendor_id, company_name, batch_month,
                 window_start, window_end, total_quantity, total_failures, ingested_at)
             VALUES ('B-1', 'V-1', 'TOYOTA', '2026-01', '2026-01-01', '2026-12-31', 10, 0,
                 '2026-01-01 00:00:00')",
            [],
        )
        .unwrap();

        let err = conn
            .execute("DELETE FROM supply_batch WHERE batch_id = 'B-1'", [])
            .unwrap_err();
        assert!(err.to_string().contains("append-only"));

        let err = conn.execute("DELETE FROM vendor", []).unwrap_err();
        assert!(err.to_string().contains("append-only"));
    }

    #[test]
    fn test_ts_round_trip_format() {
        let ts = NaiveDate::from_ymd_opt(2026, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        assert_eq!(format_ts(&ts), "2026-03-04 05:06:07");
    }
}
