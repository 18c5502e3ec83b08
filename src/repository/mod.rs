// ==========================================
// 供应商耐久性评分系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 写操作使用 IMMEDIATE 事务, 审计日志同事务提交
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod analytics_repo;
pub mod batch_repo;
pub mod error;
pub mod feedback_repo;
pub mod service_center_repo;
pub mod vendor_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use analytics_repo::AnalyticsRepository;
pub use batch_repo::{BatchIter, BatchRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use feedback_repo::FeedbackRepository;
pub use service_center_repo::ServiceCenterRepository;
pub use vendor_repo::VendorRepository;
