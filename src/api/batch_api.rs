// ==========================================
// 供应商耐久性评分系统 - 批次账本 API
// ==========================================
// 职责: 批次入账、按供应商分页/惰性遍历
// 红线: 批次只追加; 入账与供应商指标累加同一事务
// 红线: 追溯更正以新的冲正批次表达, 不提供修改接口
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::log_rejection;
use crate::api::validator::{require_non_blank, validate_manifest, validate_period};
use crate::config::{defaults, ConfigManager};
use crate::db::now_ts;
use crate::domain::action_log::ActionLog;
use crate::domain::batch::{Batch, NewBatch};
use crate::domain::types::ActionType;
use crate::repository::{BatchRepository, VendorRepository};

// ==========================================
// BatchPage - 批次分页结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPage {
    pub vendor_id: String,
    pub batches: Vec<Batch>,
    /// 下一页游标（None 表示已到末尾）
    pub next_after_seq: Option<i64>,
}

// ==========================================
// BatchApi - 批次账本 API
// ==========================================
pub struct BatchApi {
    batch_repo: Arc<BatchRepository>,
    vendor_repo: Arc<VendorRepository>,
    config_manager: Arc<ConfigManager>,
}

impl BatchApi {
    pub fn new(
        batch_repo: Arc<BatchRepository>,
        vendor_repo: Arc<VendorRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            batch_repo,
            vendor_repo,
            config_manager,
        }
    }

    /// 批次入账
    ///
    /// 校验顺序:
    /// 1. 身份字段非空
    /// 2. 清单 (EmptyManifest / InvalidPart)
    /// 3. 周期 (InvalidPeriod)
    /// 4. 事务内: batch_id 唯一 (DuplicateIdentity) → 供应商存在 (UnknownVendor)
    ///
    /// 任一步失败，账本与供应商指标均不变。
    pub fn ingest_batch(&self, batch: NewBatch, actor: &str) -> ApiResult<Batch> {
        self.do_ingest_batch(batch, actor)
            .map_err(|e| log_rejection("ingest_batch", e))
    }

    fn do_ingest_batch(&self, mut batch: NewBatch, actor: &str) -> ApiResult<Batch> {
        require_non_blank("batch_id", &batch.batch_id)?;
        require_non_blank("vendor_id", &batch.vendor_id)?;
        batch.batch_id = batch.batch_id.trim().to_string();
        batch.vendor_id = batch.vendor_id.trim().to_string();
        batch.company_name = batch.company_name.trim().to_string();

        validate_manifest(&batch.batch_id, &batch.manifest)?;
        validate_period(&batch.period)?;

        let total_quantity = batch.total_quantity();
        let total_failures = batch.total_failures();

        let audit = ActionLog::new(ActionType::IngestBatch, actor, &batch.batch_id)
            .with_payload(json!({
                "vendor_id": batch.vendor_id,
                "company_name": batch.company_name,
                "batch_month": batch.period.month,
                "window_start": batch.period.start.to_string(),
                "window_end": batch.period.end.to_string(),
                "parts": batch.manifest.len(),
                "total_quantity": total_quantity,
                "total_failures": total_failures,
            }))
            .with_detail(format!(
                "批次入账: vendor={}, 件数={}, 故障={}",
                batch.vendor_id, total_quantity, total_failures
            ));

        let committed = self
            .batch_repo
            .append(&batch, now_ts(), &audit)?;

        info!(
            batch_id = %committed.batch_id,
            vendor_id = %committed.vendor_id,
            ledger_seq = committed.ledger_seq,
            total_quantity,
            total_failures,
            window_days = committed.period.window_days(),
            actor,
            "批次入账成功"
        );
        Ok(committed)
    }

    /// 按批次ID查询
    pub fn get_batch(&self, batch_id: &str) -> ApiResult<Batch> {
        self.batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::not_found("Batch", batch_id))
    }

    /// 分页查询某供应商的批次（插入顺序）
    ///
    /// # 参数
    /// - after_seq: 游标（上一页 next_after_seq），缺省从头开始
    /// - limit: 页大小，缺省取配置 ledger/page_size，上限 500
    ///
    /// # 返回
    /// - Err(NotFound): 供应商不存在
    pub fn list_batches_page(
        &self,
        vendor_id: &str,
        after_seq: Option<i64>,
        limit: Option<usize>,
    ) -> ApiResult<BatchPage> {
        self.ensure_vendor(vendor_id)?;

        let limit = match limit {
            Some(n) => n.clamp(1, defaults::MAX_LEDGER_PAGE_SIZE),
            None => self.config_manager.get_ledger_page_size()?,
        };
        let after_seq = after_seq.unwrap_or(0).max(0);

        let batches = self
            .batch_repo
            .find_page_by_vendor(vendor_id, after_seq, limit)?;
        let next_after_seq = if batches.len() == limit {
            batches.last().map(|b| b.ledger_seq)
        } else {
            None
        };

        Ok(BatchPage {
            vendor_id: vendor_id.to_string(),
            batches,
            next_after_seq,
        })
    }

    /// 惰性遍历某供应商的全部批次
    ///
    /// 有限、按插入顺序，再次调用即重新开始。
    pub fn list_batches_for_vendor(
        &self,
        vendor_id: &str,
    ) -> ApiResult<impl Iterator<Item = ApiResult<Batch>> + '_> {
        self.ensure_vendor(vendor_id)?;
        let page_size = self.config_manager.get_ledger_page_size()?;
        Ok(self
            .batch_repo
            .iter_by_vendor(vendor_id, page_size)
            .map(|item| item.map_err(ApiError::from)))
    }

    /// 账本批次总数
    pub fn ledger_length(&self) -> ApiResult<i64> {
        Ok(self.batch_repo.count_all()?)
    }

    fn ensure_vendor(&self, vendor_id: &str) -> ApiResult<()> {
        if !self.vendor_repo.exists(vendor_id)? {
            return Err(ApiError::not_found("Vendor", vendor_id));
        }
        Ok(())
    }
}
