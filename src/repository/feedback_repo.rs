// ==========================================
// 供应商耐久性评分系统 - 反馈日志仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 反馈只追加, 顺序即提交顺序 (seq)
// ==========================================

use crate::db::{format_ts, ts_column, SharedConnection};
use crate::domain::action_log::ActionLog;
use crate::domain::analytics::VendorHistory;
use crate::domain::feedback::FeedbackEntry;
use crate::repository::action_log_repo::insert_action;
use crate::repository::batch_repo::count_batches_for_vendor;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::vendor_repo::{select_vendor, vendor_exists};
use rusqlite::{params, Connection, Result as SqliteResult, TransactionBehavior};

/// 按提交顺序读取某供应商的评分（供分析仓储在读事务内复用）
pub(crate) fn select_ratings(conn: &Connection, vendor_id: &str) -> RepositoryResult<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT rating FROM vendor_feedback WHERE vendor_id = ?1 ORDER BY seq ASC")?;
    let ratings = stmt
        .query_map(params![vendor_id], |row| row.get::<_, i64>(0))?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(ratings)
}

// ==========================================
// FeedbackRepository - 反馈仓储
// ==========================================
pub struct FeedbackRepository {
    conn: SharedConnection,
}

impl FeedbackRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加一条反馈，并在同一事务内读取追加后的供应商历史
    ///
    /// 历史读取失败时整笔事务回滚，反馈不落库。
    ///
    /// # 返回
    /// - Ok(VendorHistory): 含本条反馈的历史
    /// - Err(MissingReference): 供应商不存在，日志不变
    pub fn append_and_load_history(
        &self,
        entry: &FeedbackEntry,
        audit: &ActionLog,
    ) -> RepositoryResult<VendorHistory> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !vendor_exists(&tx, &entry.vendor_id)? {
            return Err(RepositoryError::missing_reference("Vendor", &entry.vendor_id));
        }

        tx.execute(
            r#"
            INSERT INTO vendor_feedback (
                feedback_id, vendor_id, rating, review, response_time_secs, submitted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.feedback_id,
                entry.vendor_id,
                entry.rating,
                entry.review,
                entry.response_time_secs,
                format_ts(&entry.submitted_at),
            ],
        )?;

        insert_action(&tx, audit)?;

        let vendor = select_vendor(&tx, &entry.vendor_id)?
            .ok_or_else(|| RepositoryError::missing_reference("Vendor", &entry.vendor_id))?;
        let batches_analyzed = count_batches_for_vendor(&tx, &entry.vendor_id)?;
        let ratings = select_ratings(&tx, &entry.vendor_id)?;

        tx.commit()?;
        Ok(VendorHistory {
            vendor,
            batches_analyzed,
            ratings,
        })
    }

    /// 查询某供应商的全部反馈（提交顺序）
    pub fn find_by_vendor(&self, vendor_id: &str) -> RepositoryResult<Vec<FeedbackEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT feedback_id, vendor_id, rating, review, response_time_secs, submitted_at
            FROM vendor_feedback
            WHERE vendor_id = ?1
            ORDER BY seq ASC
            "#,
        )?;
        let entries = stmt
            .query_map(params![vendor_id], |row| {
                Ok(FeedbackEntry {
                    feedback_id: row.get(0)?,
                    vendor_id: row.get(1)?,
                    rating: row.get(2)?,
                    review: row.get(3)?,
                    response_time_secs: row.get(4)?,
                    submitted_at: ts_column(row, 5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }
}
