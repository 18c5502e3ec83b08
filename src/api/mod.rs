// ==========================================
// 供应商耐久性评分系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供 HTTP 路由与命令行调用
// 说明: API 层与传输无关, 状态码映射见 ApiError::status_code
// ==========================================

pub mod action_log_api;
pub mod analytics_api;
pub mod batch_api;
pub mod config_api;
pub mod error;
pub mod feedback_api;
pub mod import_api;
pub mod registry_api;
pub mod validator;

// 重导出核心类型
pub use action_log_api::ActionLogApi;
pub use analytics_api::AnalyticsApi;
pub use batch_api::{BatchApi, BatchPage};
pub use config_api::{ConfigApi, ConfigView};
pub use error::{ApiError, ApiResult};
pub use feedback_api::{FeedbackApi, FeedbackReceipt, SubmitFeedbackRequest};
pub use import_api::{ManifestImportApi, ManifestImportRequest};
pub use registry_api::{RegisterCenterRequest, RegisterVendorRequest, RegistryApi};

/// 记录被拒绝的请求并原样返回错误
///
/// 4xx 记 warn, 存储/内部错误记 error。
pub(crate) fn log_rejection(op: &'static str, err: ApiError) -> ApiError {
    if err.status_code() >= 500 {
        tracing::error!(op, kind = err.kind(), error = %err, "操作失败");
    } else {
        tracing::warn!(op, kind = err.kind(), error = %err, "请求被拒绝");
    }
    err
}
