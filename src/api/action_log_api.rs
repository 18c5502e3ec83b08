// ==========================================
// 供应商耐久性评分系统 - 操作日志 API
// ==========================================
// 职责: 审计日志查询 (只读)
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::action_log::ActionLog;
use crate::repository::ActionLogRepository;

/// 默认返回条数
pub const DEFAULT_ACTION_LOG_LIMIT: usize = 100;
/// 单次查询上限
pub const MAX_ACTION_LOG_LIMIT: usize = 1000;

pub struct ActionLogApi {
    action_log_repo: Arc<ActionLogRepository>,
}

impl ActionLogApi {
    pub fn new(action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self { action_log_repo }
    }

    /// 最近的操作日志（最新在前）
    pub fn list_recent(&self, limit: Option<usize>) -> ApiResult<Vec<ActionLog>> {
        let limit = limit
            .unwrap_or(DEFAULT_ACTION_LOG_LIMIT)
            .clamp(1, MAX_ACTION_LOG_LIMIT);
        Ok(self.action_log_repo.find_recent(limit)?)
    }

    /// 某对象的全部日志（时间顺序）
    pub fn list_for_target(&self, target_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_target(target_id)?)
    }
}
