// ==========================================
// 供应商耐久性评分系统 - 分析快照领域模型
// ==========================================
// 依据: 评分规则 - 分析查询输出
// 红线: 快照只读,每次查询重新计算,不缓存
// 红线: 不生成占位/演示数据,空聚合按真实值报告
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::VerificationTier;
use crate::domain::vendor::Vendor;

// ==========================================
// VendorHistory - 供应商历史 (评分输入)
// ==========================================
// 用途: 同一读事务内取出的一致视图
#[derive(Debug, Clone, PartialEq)]
pub struct VendorHistory {
    pub vendor: Vendor,
    pub batches_analyzed: i64,   // 批次数
    pub ratings: Vec<i64>,       // 评分 (按提交顺序)
}

// ==========================================
// AnalyticsSnapshot - 供应商分析快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    // ===== 身份 =====
    pub vendor_id: String,
    pub vendor_name: String,
    pub category: String,
    pub contact: String,

    // ===== 聚合 =====
    pub total_jobs: i64,
    pub failed_jobs: i64,
    pub avg_response_time_secs: f64,

    // ===== 派生指标 =====
    pub durability_score: f64,
    pub success_rate: f64,
    pub blended_rating: f64,
    pub verification_tier: VerificationTier,

    // ===== 证据规模 =====
    pub batches_analyzed: i64,
    pub feedback_count: i64,

    // ===== 评价 (最新在前) =====
    pub reviews: Vec<String>,
}

// ==========================================
// VendorJobCounts - 供应商件数统计 (总览输入)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorJobCounts {
    pub vendor_id: String,
    pub name: String,
    pub total_jobs: i64,
    pub failed_jobs: i64,
}

// ==========================================
// NetworkTotals - 网络级计数 (总览输入)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkTotals {
    pub total_centers: i64,
    pub total_service_capacity: i64,
    pub total_batches: i64,
}

// ==========================================
// NetworkOverview - 网络总览
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkOverview {
    pub total_centers: i64,
    pub total_vendors: i64,
    pub total_service_capacity: i64,
    pub total_batches: i64,
    pub total_parts: i64,
    pub total_failures: i64,
    pub network_durability_score: f64,
    pub verified_vendors: i64,
    pub top_failing_vendors: Vec<VendorFailureRank>,
}

/// 故障排行项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorFailureRank {
    pub vendor_id: String,
    pub name: String,
    pub total_jobs: i64,
    pub failed_jobs: i64,
    pub durability_score: f64,
}
