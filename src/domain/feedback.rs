// ==========================================
// 供应商耐久性评分系统 - 评价领域模型
// ==========================================
// 依据: 数据模型 - FeedbackEntry
// 红线: 评价只追加,无编辑/删除
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 评分下限
pub const MIN_RATING: i64 = 1;
/// 评分上限
pub const MAX_RATING: i64 = 5;

// ==========================================
// FeedbackEntry - 供应商评价
// ==========================================
// 对齐: vendor_feedback 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub feedback_id: String,              // 评价ID (UUID)
    pub vendor_id: String,                // 所属供应商
    pub rating: i64,                      // 评分 1-5
    pub review: String,                   // 评价文本 (非空)
    pub response_time_secs: Option<f64>,  // 该次服务的响应时长 (可选)
    pub submitted_at: NaiveDateTime,
}
