// ==========================================
// 供应商耐久性评分系统 - 供应商领域模型
// ==========================================
// 依据: 数据模型 - Vendor
// 红线: vendor_id 全局唯一且不可变; 供应商永不删除 (审计要求)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Vendor - 供应商
// ==========================================
// 用途: 身份登记 + 历史表现聚合
// 对齐: vendor 表 + vendor_feedback 表 (reviews)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    // ===== 主键 =====
    pub vendor_id: String,         // 供应商ID (人工分配)

    // ===== 身份信息 =====
    pub name: String,              // 名称
    pub category: String,          // 品类
    pub contact: String,           // 联系方式 (邮箱/电话)

    // ===== 聚合指标 =====
    pub metrics: VendorMetrics,

    // ===== 评价 (最新在前) =====
    pub reviews: Vec<String>,

    pub registered_at: NaiveDateTime, // 注册时间
}

// ==========================================
// VendorMetrics - 供应商聚合指标
// ==========================================
// 红线: failed_jobs <= total_jobs
// 说明: durability_score 不在此存储,读取时由 ScoringEngine 派生
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VendorMetrics {
    pub total_jobs: i64,              // 累计供货件数
    pub failed_jobs: i64,             // 累计故障件数
    pub avg_response_time_secs: f64,  // 平均响应时长 (秒)
}

impl VendorMetrics {
    /// 注册时的零基线
    pub fn zero() -> Self {
        Self::default()
    }

    /// 指标是否满足不变量
    pub fn is_consistent(&self) -> bool {
        self.total_jobs >= 0
            && self.failed_jobs >= 0
            && self.failed_jobs <= self.total_jobs
            && self.avg_response_time_secs >= 0.0
    }
}
