// ==========================================
// 供应商耐久性评分系统 - 引擎层
// ==========================================
// 职责: 实现评分规则, 不拼 SQL
// 红线: Engine 为纯函数, 输入来自仓储层的一致视图
// ==========================================

pub mod scoring;

// 重导出核心引擎
pub use scoring::{ScoringEngine, DEFAULT_VERIFIED_THRESHOLD};
