// ==========================================
// 供应商耐久性评分系统 - 清单导入 API
// ==========================================
// 职责: 读取清单文件并通过批次账本入账
// 说明: 与 HTTP 入账共用同一校验与事务路径
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::batch_api::BatchApi;
use crate::api::error::{ApiError, ApiResult};
use crate::api::log_rejection;
use crate::domain::batch::{Batch, BatchPeriod, NewBatch};
use crate::importer::ManifestImporter;

/// 清单文件入账请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestImportRequest {
    pub batch_id: String,
    pub vendor_id: String,
    pub company_name: String,
    pub month: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub file_path: PathBuf,
}

pub struct ManifestImportApi {
    batch_api: Arc<BatchApi>,
    importer: ManifestImporter,
}

impl ManifestImportApi {
    pub fn new(batch_api: Arc<BatchApi>) -> Self {
        Self {
            batch_api,
            importer: ManifestImporter::new(),
        }
    }

    /// 读取清单文件并入账
    ///
    /// # 返回
    /// - Err(InvalidInput): 文件无法读取/格式错误（带数据行号）
    /// - 其余错误同 BatchApi::ingest_batch
    pub fn import_manifest(&self, req: ManifestImportRequest, actor: &str) -> ApiResult<Batch> {
        let manifest = self.importer.load(&req.file_path).map_err(|e| {
            log_rejection(
                "import_manifest",
                ApiError::InvalidInput(format!("清单导入失败: {}", e)),
            )
        })?;

        info!(
            batch_id = %req.batch_id,
            file = %req.file_path.display(),
            parts = manifest.len(),
            "清单文件已解析，开始入账"
        );

        self.batch_api.ingest_batch(
            NewBatch {
                batch_id: req.batch_id,
                vendor_id: req.vendor_id,
                company_name: req.company_name,
                period: BatchPeriod::new(req.month, req.start, req.end),
                manifest,
            },
            actor,
        )
    }
}
