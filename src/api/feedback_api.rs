// ==========================================
// 供应商耐久性评分系统 - 评价 API
// ==========================================
// 职责: 提交评价, 返回评价条目 + 最新分析快照
// 红线: 评价只追加; 下一次读取即可见
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::api::analytics_api::AnalyticsApi;
use crate::api::error::ApiResult;
use crate::api::log_rejection;
use crate::api::validator::{
    require_non_blank, validate_rating, validate_response_time, validate_review,
};
use crate::db::now_ts;
use crate::domain::action_log::ActionLog;
use crate::domain::analytics::AnalyticsSnapshot;
use crate::domain::feedback::FeedbackEntry;
use crate::domain::types::ActionType;
use crate::repository::FeedbackRepository;

/// 评价提交请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFeedbackRequest {
    pub vendor_id: String,
    pub rating: i64,
    pub review: String,
    #[serde(default)]
    pub response_time_secs: Option<f64>,
}

/// 评价提交结果（含权威快照，调用方无需自行合并）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReceipt {
    pub entry: FeedbackEntry,
    pub analytics: AnalyticsSnapshot,
}

// ==========================================
// FeedbackApi - 评价 API
// ==========================================
pub struct FeedbackApi {
    feedback_repo: Arc<FeedbackRepository>,
    analytics_api: Arc<AnalyticsApi>,
}

impl FeedbackApi {
    pub fn new(feedback_repo: Arc<FeedbackRepository>, analytics_api: Arc<AnalyticsApi>) -> Self {
        Self {
            feedback_repo,
            analytics_api,
        }
    }

    /// 提交评价
    ///
    /// # 返回
    /// - Err(UnknownVendor): 供应商不存在
    /// - Err(InvalidRating): 评分不在 1-5
    /// - Err(EmptyReview): 评价为空
    ///
    /// 返回错误时评价未写入，可安全重试。
    pub fn submit_feedback(&self, req: SubmitFeedbackRequest, actor: &str) -> ApiResult<FeedbackReceipt> {
        self.do_submit_feedback(req, actor)
            .map_err(|e| log_rejection("submit_feedback", e))
    }

    fn do_submit_feedback(&self, req: SubmitFeedbackRequest, actor: &str) -> ApiResult<FeedbackReceipt> {
        require_non_blank("vendor_id", &req.vendor_id)?;
        let vendor_id = req.vendor_id.trim().to_string();
        validate_rating(req.rating)?;
        validate_review(&vendor_id, &req.review)?;
        validate_response_time(req.response_time_secs)?;

        let entry = FeedbackEntry {
            feedback_id: uuid::Uuid::new_v4().to_string(),
            vendor_id,
            rating: req.rating,
            review: req.review.trim().to_string(),
            response_time_secs: req.response_time_secs,
            submitted_at: now_ts(),
        };

        let audit = ActionLog::new(ActionType::SubmitFeedback, actor, &entry.vendor_id)
            .with_payload(json!({
                "feedback_id": entry.feedback_id,
                "rating": entry.rating,
                "response_time_secs": entry.response_time_secs,
            }))
            .with_detail(format!("提交评价: rating={}", entry.rating));

        // 阈值先于写入读取, 写入后不再有可失败的步骤
        let engine = self.analytics_api.scoring_engine()?;
        let history = self.feedback_repo.append_and_load_history(&entry, &audit)?;
        info!(
            vendor_id = %entry.vendor_id,
            feedback_id = %entry.feedback_id,
            rating = entry.rating,
            actor,
            "评价提交成功"
        );

        let analytics = engine.build_snapshot(&history);
        Ok(FeedbackReceipt { entry, analytics })
    }

    /// 查询某供应商的全部评价（提交顺序）
    pub fn list_feedback(&self, vendor_id: &str) -> ApiResult<Vec<FeedbackEntry>> {
        Ok(self.feedback_repo.find_by_vendor(vendor_id)?)
    }
}
