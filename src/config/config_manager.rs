// ==========================================
// 供应商耐久性评分系统 - 配置管理器
// ==========================================
// 职责: 业务配置查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::{format_ts, SharedConnection};
use crate::domain::action_log::ActionLog;
use crate::repository::action_log_repo::insert_action;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 全局作用域
pub const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigItem - 配置项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub scope_id: String,
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: SharedConnection,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取数值配置，缺失或无法解析时回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    // ===== 评分配置 =====

    /// 认证阈值（默认 90）
    pub fn get_verified_threshold(&self) -> RepositoryResult<f64> {
        self.get_parsed_or_default(config_keys::VERIFIED_THRESHOLD, defaults::VERIFIED_THRESHOLD)
    }

    // ===== 总览配置 =====

    /// 故障排行默认条数（默认 5）
    pub fn get_top_failing_limit(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::TOP_FAILING_LIMIT, defaults::TOP_FAILING_LIMIT)
    }

    // ===== 账本配置 =====

    /// 批次分页默认页大小（默认 50）
    pub fn get_ledger_page_size(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::LEDGER_PAGE_SIZE, defaults::LEDGER_PAGE_SIZE)
    }

    /// 写入全局配置（UPSERT），审计日志同事务提交
    pub fn upsert_global(
        &self,
        key: &str,
        value: &str,
        updated_at: NaiveDateTime,
        audit: &ActionLog,
    ) -> RepositoryResult<ConfigItem> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let ts = format_ts(&updated_at);
        tx.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
            params![GLOBAL_SCOPE, key, value, ts],
        )?;

        insert_action(&tx, audit)?;
        tx.commit()?;

        Ok(ConfigItem {
            scope_id: GLOBAL_SCOPE.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            updated_at: ts,
        })
    }

    /// 查询全部已存储配置
    pub fn list_configs(&self) -> RepositoryResult<Vec<ConfigItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT scope_id, key, value, updated_at FROM config_kv ORDER BY scope_id, key",
        )?;
        let items = stmt
            .query_map([], |row| {
                Ok(ConfigItem {
                    scope_id: row.get(0)?,
                    key: row.get(1)?,
                    value: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    /// 生效配置快照（已存储值覆盖默认值）
    ///
    /// 用途: 让调用方看到每个已知键的实际生效值
    pub fn get_effective_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let mut snapshot: BTreeMap<String, String> = config_keys::ALL
            .iter()
            .map(|key| (key.to_string(), defaults::value_for(key).to_string()))
            .collect();

        for item in self.list_configs()? {
            if item.scope_id == GLOBAL_SCOPE {
                snapshot.insert(item.key, item.value);
            }
        }
        Ok(snapshot)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 评分
    pub const VERIFIED_THRESHOLD: &str = "scoring/verified_threshold";

    // 总览
    pub const TOP_FAILING_LIMIT: &str = "overview/top_failing_limit";

    // 账本
    pub const LEDGER_PAGE_SIZE: &str = "ledger/page_size";

    pub const ALL: [&str; 3] = [VERIFIED_THRESHOLD, TOP_FAILING_LIMIT, LEDGER_PAGE_SIZE];
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    use super::config_keys;

    pub const VERIFIED_THRESHOLD: f64 = 90.0;
    pub const TOP_FAILING_LIMIT: usize = 5;
    pub const LEDGER_PAGE_SIZE: usize = 50;

    /// 上限
    pub const MAX_TOP_FAILING_LIMIT: usize = 50;
    pub const MAX_LEDGER_PAGE_SIZE: usize = 500;

    /// 默认值的字符串形式（与 config_kv 存储格式一致）
    pub fn value_for(key: &str) -> &'static str {
        match key {
            config_keys::VERIFIED_THRESHOLD => "90",
            config_keys::TOP_FAILING_LIMIT => "5",
            config_keys::LEDGER_PAGE_SIZE => "50",
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_shared_connection;
    use crate::domain::types::ActionType;
    use chrono::Local;
    use tempfile::NamedTempFile;

    fn manager() -> (NamedTempFile, ConfigManager) {
        let file = NamedTempFile::new().unwrap();
        let conn = open_shared_connection(file.path().to_str().unwrap()).unwrap();
        (file, ConfigManager::new(conn))
    }

    #[test]
    fn test_defaults_when_unset() {
        let (_file, mgr) = manager();
        assert_eq!(mgr.get_verified_threshold().unwrap(), 90.0);
        assert_eq!(mgr.get_top_failing_limit().unwrap(), 5);
        assert_eq!(mgr.get_ledger_page_size().unwrap(), 50);
    }

    #[test]
    fn test_upsert_overrides_default() {
        let (_file, mgr) = manager();
        let audit = ActionLog::new(ActionType::UpdateConfig, "tester", config_keys::VERIFIED_THRESHOLD);
        mgr.upsert_global(
            config_keys::VERIFIED_THRESHOLD,
            "95",
            Local::now().naive_local(),
            &audit,
        )
        .unwrap();

        assert_eq!(mgr.get_verified_threshold().unwrap(), 95.0);
        let snapshot = mgr.get_effective_snapshot().unwrap();
        assert_eq!(snapshot[config_keys::VERIFIED_THRESHOLD], "95");
        assert_eq!(snapshot[config_keys::LEDGER_PAGE_SIZE], "50");
    }

    #[test]
    fn test_malformed_value_falls_back() {
        let (_file, mgr) = manager();
        let audit = ActionLog::new(ActionType::UpdateConfig, "tester", config_keys::TOP_FAILING_LIMIT);
        mgr.upsert_global(
            config_keys::TOP_FAILING_LIMIT,
            "many",
            Local::now().naive_local(),
            &audit,
        )
        .unwrap();
        assert_eq!(mgr.get_top_failing_limit().unwrap(), 5);
    }
}
