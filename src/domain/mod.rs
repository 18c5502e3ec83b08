// ==========================================
// 供应商耐久性评分系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含评分逻辑
// ==========================================

pub mod action_log;
pub mod analytics;
pub mod batch;
pub mod feedback;
pub mod service_center;
pub mod types;
pub mod vendor;

// 重导出核心类型
pub use action_log::ActionLog;
pub use analytics::{
    AnalyticsSnapshot, NetworkOverview, NetworkTotals, VendorFailureRank, VendorHistory,
    VendorJobCounts,
};
pub use batch::{Batch, BatchPeriod, NewBatch, PartEntry};
pub use feedback::{FeedbackEntry, MAX_RATING, MIN_RATING};
pub use service_center::ServiceCenter;
pub use types::{ActionType, VerificationTier};
pub use vendor::{Vendor, VendorMetrics};
