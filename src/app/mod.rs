// ==========================================
// 供应商耐久性评分系统 - 应用层
// ==========================================
// 职责: 装配各层, 暴露 HTTP 接口
// ==========================================

pub mod http;
pub mod state;

// 重导出
pub use http::{router, SharedState};
pub use state::{get_default_db_path, AppState};
