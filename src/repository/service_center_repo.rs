// ==========================================
// 供应商耐久性评分系统 - 服务中心数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: center_id 不可复用; 仅允许重申 capacity
// ==========================================

use crate::db::{format_ts, ts_column, SharedConnection};
use crate::domain::action_log::ActionLog;
use crate::domain::service_center::ServiceCenter;
use crate::repository::action_log_repo::insert_action;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior};

const CENTER_COLUMNS: &str = r#"
    center_id, name, company_name, location, phone, capacity, registered_at, updated_at
"#;

fn map_center_row(row: &Row<'_>) -> SqliteResult<ServiceCenter> {
    Ok(ServiceCenter {
        center_id: row.get(0)?,
        name: row.get(1)?,
        company_name: row.get(2)?,
        location: row.get(3)?,
        phone: row.get(4)?,
        capacity: row.get(5)?,
        registered_at: ts_column(row, 6)?,
        updated_at: ts_column(row, 7)?,
    })
}

fn select_center(conn: &Connection, center_id: &str) -> RepositoryResult<Option<ServiceCenter>> {
    let sql = format!("SELECT {} FROM service_center WHERE center_id = ?1", CENTER_COLUMNS);
    let center = conn
        .query_row(&sql, params![center_id], map_center_row)
        .optional()?;
    Ok(center)
}

// ==========================================
// ServiceCenterRepository - 服务中心仓储
// ==========================================
pub struct ServiceCenterRepository {
    conn: SharedConnection,
}

impl ServiceCenterRepository {
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

    /// 登记服务中心
    ///
    /// # 返回
    /// - Err(DuplicateKey): center_id 已存在
    pub fn insert(&self, center: &ServiceCenter, audit: &ActionLog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if select_center(&tx, &center.center_id)?.is_some() {
            return Err(RepositoryError::duplicate("ServiceCenter", &center.center_id));
        }

        tx.execute(
            r#"
            INSERT INTO service_center (
                center_id, name, company_name, location, phone, capacity,
                registered_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                center.center_id,
                center.name,
                center.company_name,
                center.location,
                center.phone,
                center.capacity,
                format_ts(&center.registered_at),
                format_ts(&center.updated_at),
            ],
        )
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::UniqueConstraintViolation(_) => {
                RepositoryError::duplicate("ServiceCenter", &center.center_id)
            }
            other => other,
        })?;

        insert_action(&tx, audit)?;
        tx.commit()?;
        Ok(())
    }

    /// 重申服务中心产能
    ///
    /// # 返回
    /// - Ok(ServiceCenter): 更新后的记录
    /// - Err(NotFound): center_id 不存在
    pub fn update_capacity(
        &self,
        center_id: &str,
        capacity: i64,
        updated_at: NaiveDateTime,
        audit: &ActionLog,
    ) -> RepositoryResult<ServiceCenter> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let affected = tx.execute(
            "UPDATE service_center SET capacity = ?2, updated_at = ?3 WHERE center_id = ?1",
            params![center_id, capacity, format_ts(&updated_at)],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ServiceCenter", center_id));
        }

        insert_action(&tx, audit)?;
        let center = select_center(&tx, center_id)?
            .ok_or_else(|| RepositoryError::not_found("ServiceCenter", center_id))?;
        tx.commit()?;
        Ok(center)
    }

    /// 按主键查询
    pub fn find_by_id(&self, center_id: &str) -> RepositoryResult<Option<ServiceCenter>> {
        let conn = self.get_conn()?;
        select_center(&conn, center_id)
    }

    /// 查询全部服务中心（按登记顺序）
    pub fn find_all(&self) -> RepositoryResult<Vec<ServiceCenter>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM service_center ORDER BY seq ASC", CENTER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let centers = stmt
            .query_map([], map_center_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(centers)
    }
}
