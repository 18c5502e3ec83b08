// ==========================================
// 供应商耐久性评分系统 - 操作日志仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 日志只追加; 写入方在自身事务内调用 insert_action
// ==========================================

use crate::db::{format_ts, ts_column, SharedConnection};
use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};

/// 在给定连接/事务上追加一条操作日志
///
/// 说明: Transaction 可解引用为 Connection，
/// 因此各仓储可在写事务内直接调用，保证“写入+审计”同时提交。
pub fn insert_action(conn: &Connection, log: &ActionLog) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO action_log (
            action_id, action_type, actor, action_ts, target_id, payload_json, detail
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            log.action_id,
            log.action_type,
            log.actor,
            format_ts(&log.action_ts),
            log.target_id,
            log.payload_json.as_ref().map(|v| v.to_string()),
            log.detail,
        ],
    )?;
    Ok(())
}

fn map_action_row(row: &Row<'_>) -> SqliteResult<ActionLog> {
    let payload: Option<String> = row.get(5)?;
    Ok(ActionLog {
        action_id: row.get(0)?,
        action_type: row.get(1)?,
        actor: row.get(2)?,
        action_ts: ts_column(row, 3)?,
        target_id: row.get(4)?,
        payload_json: payload.and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(6)?,
    })
}

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: SharedConnection,
}

impl ActionLogRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询最近的操作日志（最新在前）
    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, action_type, actor, action_ts, target_id, payload_json, detail
            FROM action_log
            ORDER BY seq DESC
            LIMIT ?1
            "#,
        )?;

        let logs = stmt
            .query_map(params![limit as i64], map_action_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询某个对象的全部日志（按时间顺序）
    pub fn find_by_target(&self, target_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, action_type, actor, action_ts, target_id, payload_json, detail
            FROM action_log
            WHERE target_id = ?1
            ORDER BY seq ASC
            "#,
        )?;

        let logs = stmt
            .query_map(params![target_id], map_action_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }
}
