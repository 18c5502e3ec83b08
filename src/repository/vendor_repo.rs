// ==========================================
// 供应商耐久性评分系统 - 供应商数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 唯一性检查与写入在同一 IMMEDIATE 事务内完成
// ==========================================

use crate::db::{format_ts, ts_column, SharedConnection};
use crate::domain::action_log::ActionLog;
use crate::domain::vendor::{Vendor, VendorMetrics};
use crate::repository::action_log_repo::insert_action;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior};
use std::collections::HashMap;

const VENDOR_COLUMNS: &str = r#"
    v.vendor_id, v.name, v.category, v.contact,
    v.total_jobs, v.failed_jobs,
    COALESCE(
        (SELECT AVG(f.response_time_secs) FROM vendor_feedback f WHERE f.vendor_id = v.vendor_id),
        0.0
    ),
    v.registered_at
"#;

fn map_vendor_row(row: &Row<'_>) -> SqliteResult<Vendor> {
    Ok(Vendor {
        vendor_id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        contact: row.get(3)?,
        metrics: VendorMetrics {
            total_jobs: row.get(4)?,
            failed_jobs: row.get(5)?,
            avg_response_time_secs: row.get(6)?,
        },
        reviews: Vec::new(),
        registered_at: ts_column(row, 7)?,
    })
}

/// 判断供应商是否存在（供其他仓储在事务内复用）
pub(crate) fn vendor_exists(conn: &Connection, vendor_id: &str) -> RepositoryResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM vendor WHERE vendor_id = ?1",
            params![vendor_id],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    Ok(found)
}

/// 读取供应商当前累计件数 (total_jobs, failed_jobs)
///
/// # 返回
/// - Ok(None): 供应商不存在
pub(crate) fn select_job_counts(conn: &Connection, vendor_id: &str) -> RepositoryResult<Option<(i64, i64)>> {
    let counts = conn
        .query_row(
            "SELECT total_jobs, failed_jobs FROM vendor WHERE vendor_id = ?1",
            params![vendor_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(counts)
}

/// 读取单个供应商（含评价，最新在前）
pub(crate) fn select_vendor(conn: &Connection, vendor_id: &str) -> RepositoryResult<Option<Vendor>> {
    let sql = format!("SELECT {} FROM vendor v WHERE v.vendor_id = ?1", VENDOR_COLUMNS);
    let vendor = conn
        .query_row(&sql, params![vendor_id], map_vendor_row)
        .optional()?;

    let Some(mut vendor) = vendor else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT review FROM vendor_feedback WHERE vendor_id = ?1 ORDER BY seq DESC",
    )?;
    vendor.reviews = stmt
        .query_map(params![vendor_id], |row| row.get::<_, String>(0))?
        .collect::<SqliteResult<Vec<_>>>()?;

    Ok(Some(vendor))
}

// ==========================================
// VendorRepository - 供应商仓储
// ==========================================
/// 供应商仓储
/// 职责: 管理 vendor 表的登记与查询；指标累加由批次仓储在入账事务内完成
pub struct VendorRepository {
    conn: SharedConnection,
}

impl VendorRepository {
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

    /// 登记供应商
    ///
    /// # 返回
    /// - Ok(()): 登记成功（审计日志同事务提交）
    /// - Err(DuplicateKey): vendor_id 已存在，原数据不变
    pub fn insert(&self, vendor: &Vendor, audit: &ActionLog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if vendor_exists(&tx, &vendor.vendor_id)? {
            return Err(RepositoryError::duplicate("Vendor", &vendor.vendor_id));
        }

        tx.execute(
            r#"
            INSERT INTO vendor (
                vendor_id, name, category, contact,
                total_jobs, failed_jobs, registered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                vendor.vendor_id,
                vendor.name,
                vendor.category,
                vendor.contact,
                vendor.metrics.total_jobs,
                vendor.metrics.failed_jobs,
                format_ts(&vendor.registered_at),
            ],
        )
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::UniqueConstraintViolation(_) => {
                RepositoryError::duplicate("Vendor", &vendor.vendor_id)
            }
            other => other,
        })?;

        insert_action(&tx, audit)?;
        tx.commit()?;
        Ok(())
    }

    /// 按主键查询（含评价）
    pub fn find_by_id(&self, vendor_id: &str) -> RepositoryResult<Option<Vendor>> {
        let conn = self.get_conn()?;
        select_vendor(&conn, vendor_id)
    }

    /// 供应商是否存在
    pub fn exists(&self, vendor_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        vendor_exists(&conn, vendor_id)
    }

    /// 查询全部供应商（按登记顺序，含评价）
    pub fn find_all(&self) -> RepositoryResult<Vec<Vendor>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let sql = format!("SELECT {} FROM vendor v ORDER BY v.seq ASC", VENDOR_COLUMNS);
        let mut vendors = {
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_vendor_row)?
                .collect::<SqliteResult<Vec<_>>>()?;
            rows
        };

        let mut reviews_by_vendor: HashMap<String, Vec<String>> = HashMap::new();
        {
            let mut stmt =
                tx.prepare("SELECT vendor_id, review FROM vendor_feedback ORDER BY seq DESC")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (vendor_id, review) = row?;
                reviews_by_vendor.entry(vendor_id).or_default().push(review);
            }
        }

        for vendor in &mut vendors {
            if let Some(reviews) = reviews_by_vendor.remove(&vendor.vendor_id) {
                vendor.reviews = reviews;
            }
        }

        tx.commit()?;
        Ok(vendors)
    }
}
