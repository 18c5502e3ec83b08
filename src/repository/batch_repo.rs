// ==========================================
// 供应商耐久性评分系统 - 批次账本仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 批次只追加; 批次写入与供应商指标累加同一事务提交
// ==========================================
// 职责: supply_batch / batch_part 表的追加与分页读取
// ==========================================

use crate::db::{date_column, format_date, format_ts, ts_column, SharedConnection};
use crate::domain::action_log::ActionLog;
use crate::domain::batch::{Batch, BatchPeriod, NewBatch, PartEntry};
use crate::repository::action_log_repo::insert_action;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::vendor_repo::select_job_counts;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior};
use std::collections::VecDeque;

const BATCH_COLUMNS: &str = r#"
    seq, batch_id, vendor_id, company_name, batch_month, window_start, window_end, ingested_at
"#;

fn map_batch_header(row: &Row<'_>) -> SqliteResult<Batch> {
    Ok(Batch {
        ledger_seq: row.get(0)?,
        batch_id: row.get(1)?,
        vendor_id: row.get(2)?,
        company_name: row.get(3)?,
        period: BatchPeriod {
            month: row.get(4)?,
            start: date_column(row, 5)?,
            end: date_column(row, 6)?,
        },
        manifest: Vec::new(),
        ingested_at: ts_column(row, 7)?,
    })
}

fn select_manifest(conn: &Connection, batch_id: &str) -> RepositoryResult<Vec<PartEntry>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT sku, name, quantity, failures_logged
        FROM batch_part
        WHERE batch_id = ?1
        ORDER BY line_no ASC
        "#,
    )?;
    let parts = stmt
        .query_map(params![batch_id], |row| {
            Ok(PartEntry {
                sku: row.get(0)?,
                name: row.get(1)?,
                quantity: row.get(2)?,
                failures_logged: row.get(3)?,
            })
        })?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(parts)
}

fn batch_exists(conn: &Connection, batch_id: &str) -> RepositoryResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM supply_batch WHERE batch_id = ?1",
            params![batch_id],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    Ok(found)
}

/// 统计某供应商的批次数（供分析仓储在读事务内复用）
pub(crate) fn count_batches_for_vendor(conn: &Connection, vendor_id: &str) -> RepositoryResult<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM supply_batch WHERE vendor_id = ?1",
        params![vendor_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

// ==========================================
// BatchRepository - 批次账本仓储
// ==========================================
pub struct BatchRepository {
    conn: SharedConnection,
}

impl BatchRepository {
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

    /// 追加批次并累加供应商指标
    ///
    /// 事务内顺序:
    /// 1. batch_id 唯一性检查
    /// 2. 供应商存在性检查, 读取当前累计件数
    /// 3. 累计件数溢出检查 (在任何写入之前)
    /// 4. 写入批次头 + 清单行
    /// 5. vendor.total_jobs += Σquantity, vendor.failed_jobs += Σfailures_logged
    /// 6. 写入审计日志
    ///
    /// # 返回
    /// - Ok(Batch): 已提交的批次（含账本序号）
    /// - Err(DuplicateKey): batch_id 已存在
    /// - Err(MissingReference): 供应商不存在
    /// - Err(CounterOverflow): 累加后超出 i64 范围，账本不变
    pub fn append(
        &self,
        batch: &NewBatch,
        ingested_at: NaiveDateTime,
        audit: &ActionLog,
    ) -> RepositoryResult<Batch> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if batch_exists(&tx, &batch.batch_id)? {
            return Err(RepositoryError::duplicate("Batch", &batch.batch_id));
        }
        let Some((total_jobs, failed_jobs)) = select_job_counts(&tx, &batch.vendor_id)? else {
            return Err(RepositoryError::missing_reference("Vendor", &batch.vendor_id));
        };

        let total_quantity = batch.total_quantity();
        let total_failures = batch.total_failures();
        let new_total_jobs = total_jobs
            .checked_add(total_quantity)
            .ok_or_else(|| RepositoryError::counter_overflow("Vendor", &batch.vendor_id, "total_jobs"))?;
        let new_failed_jobs = failed_jobs
            .checked_add(total_failures)
            .ok_or_else(|| RepositoryError::counter_overflow("Vendor", &batch.vendor_id, "failed_jobs"))?;

        tx.execute(
            r#"
            INSERT INTO supply_batch (
                batch_id, vendor_id, company_name, batch_month,
                window_start, window_end, total_quantity, total_failures, ingested_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                batch.batch_id,
                batch.vendor_id,
                batch.company_name,
                batch.period.month,
                format_date(&batch.period.start),
                format_date(&batch.period.end),
                total_quantity,
                total_failures,
                format_ts(&ingested_at),
            ],
        )
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::UniqueConstraintViolation(_) => {
                RepositoryError::duplicate("Batch", &batch.batch_id)
            }
            other => other,
        })?;
        let ledger_seq = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO batch_part (batch_id, line_no, sku, name, quantity, failures_logged)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for (idx, part) in batch.manifest.iter().enumerate() {
                stmt.execute(params![
                    batch.batch_id,
                    (idx + 1) as i64,
                    part.sku,
                    part.name,
                    part.quantity,
                    part.failures_logged,
                ])?;
            }
        }

        tx.execute(
            r#"
            UPDATE vendor
            SET total_jobs = ?2,
                failed_jobs = ?3
            WHERE vendor_id = ?1
            "#,
            params![batch.vendor_id, new_total_jobs, new_failed_jobs],
        )?;

        insert_action(&tx, audit)?;
        tx.commit()?;

        Ok(Batch {
            ledger_seq,
            batch_id: batch.batch_id.clone(),
            vendor_id: batch.vendor_id.clone(),
            company_name: batch.company_name.clone(),
            period: batch.period.clone(),
            manifest: batch.manifest.clone(),
            ingested_at,
        })
    }

    /// 按批次ID查询（含清单）
    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<Batch>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM supply_batch WHERE batch_id = ?1", BATCH_COLUMNS);
        let header = conn
            .query_row(&sql, params![batch_id], map_batch_header)
            .optional()?;

        match header {
            Some(mut batch) => {
                batch.manifest = select_manifest(&conn, batch_id)?;
                Ok(Some(batch))
            }
            None => Ok(None),
        }
    }

    /// 按账本序号分页查询某供应商的批次
    ///
    /// # 参数
    /// - after_seq: 上一页最后一条的 ledger_seq（首页传 0）
    /// - limit: 页大小
    pub fn find_page_by_vendor(
        &self,
        vendor_id: &str,
        after_seq: i64,
        limit: usize,
    ) -> RepositoryResult<Vec<Batch>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let sql = format!(
            "SELECT {} FROM supply_batch WHERE vendor_id = ?1 AND seq > ?2 ORDER BY seq ASC LIMIT ?3",
            BATCH_COLUMNS
        );
        let mut batches = {
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map(params![vendor_id, after_seq, limit as i64], map_batch_header)?
                .collect::<SqliteResult<Vec<_>>>()?;
            rows
        };

        for batch in &mut batches {
            batch.manifest = select_manifest(&tx, &batch.batch_id)?;
        }

        tx.commit()?;
        Ok(batches)
    }

    /// 惰性遍历某供应商的全部批次（插入顺序）
    ///
    /// 每次调用返回一个新的迭代器，从头开始。
    pub fn iter_by_vendor(&self, vendor_id: &str, page_size: usize) -> BatchIter<'_> {
        BatchIter {
            repo: self,
            vendor_id: vendor_id.to_string(),
            page_size: page_size.max(1),
            after_seq: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// 账本批次总数
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM supply_batch", [], |row| row.get(0))?;
        Ok(n)
    }
}

// ==========================================
// BatchIter - 批次惰性迭代器
// ==========================================
// 按页拉取, 有限, 可重新开始
pub struct BatchIter<'a> {
    repo: &'a BatchRepository,
    vendor_id: String,
    page_size: usize,
    after_seq: i64,
    buffer: VecDeque<Batch>,
    exhausted: bool,
}

impl Iterator for BatchIter<'_> {
    type Item = RepositoryResult<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            match self
                .repo
                .find_page_by_vendor(&self.vendor_id, self.after_seq, self.page_size)
            {
                Ok(page) => {
                    if page.len() < self.page_size {
                        self.exhausted = true;
                    }
                    if let Some(last) = page.last() {
                        self.after_seq = last.ledger_seq;
                    }
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }

        self.buffer.pop_front().map(Ok)
    }
}
