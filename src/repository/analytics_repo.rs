// ==========================================
// 供应商耐久性评分系统 - 分析读取仓储
// ==========================================
// 红线: 只读; 每次查询在单个读事务内取一致视图
// 红线: 不缓存, 不生成占位数据
// ==========================================

use crate::db::SharedConnection;
use crate::domain::analytics::{NetworkTotals, VendorHistory, VendorJobCounts};
use crate::repository::batch_repo::count_batches_for_vendor;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::feedback_repo::select_ratings;
use crate::repository::vendor_repo::select_vendor;
use rusqlite::{Connection, Result as SqliteResult};

// ==========================================
// AnalyticsRepository - 分析读取仓储
// ==========================================
pub struct AnalyticsRepository {
    conn: SharedConnection,
}

impl AnalyticsRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取供应商评分所需的全部历史
    ///
    /// 供应商行、批次数与评分序列来自同一读事务，
    /// 不会出现“批次已入账但指标未累加”的中间状态。
    ///
    /// # 返回
    /// - Ok(None): 供应商不存在
    pub fn load_vendor_history(&self, vendor_id: &str) -> RepositoryResult<Option<VendorHistory>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let Some(vendor) = select_vendor(&tx, vendor_id)? else {
            return Ok(None);
        };
        let batches_analyzed = count_batches_for_vendor(&tx, vendor_id)?;
        let ratings = select_ratings(&tx, vendor_id)?;

        tx.commit()?;
        Ok(Some(VendorHistory {
            vendor,
            batches_analyzed,
            ratings,
        }))
    }

    /// 读取网络总览输入（网络计数 + 各供应商件数）
    pub fn load_network_inputs(&self) -> RepositoryResult<(NetworkTotals, Vec<VendorJobCounts>)> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let (total_centers, total_service_capacity): (i64, i64) = tx.query_row(
            "SELECT COUNT(*), COALESCE(SUM(capacity), 0) FROM service_center",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let total_batches: i64 =
            tx.query_row("SELECT COUNT(*) FROM supply_batch", [], |row| row.get(0))?;

        let counts = {
            let mut stmt = tx.prepare(
                "SELECT vendor_id, name, total_jobs, failed_jobs FROM vendor ORDER BY seq ASC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(VendorJobCounts {
                        vendor_id: row.get(0)?,
                        name: row.get(1)?,
                        total_jobs: row.get(2)?,
                        failed_jobs: row.get(3)?,
                    })
                })?
                .collect::<SqliteResult<Vec<_>>>()?;
            rows
        };

        tx.commit()?;
        Ok((
            NetworkTotals {
                total_centers,
                total_service_capacity,
                total_batches,
            },
            counts,
        ))
    }
}
