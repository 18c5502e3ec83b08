// ==========================================
// 供应商耐久性评分系统 - 操作日志领域模型
// ==========================================
// 依据: 审计要求 - 供应商/批次永不删除
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::types::ActionType;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 红线: 所有写入必须记录,与写入同一事务提交
// 对齐: action_log 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,               // 日志ID (UUID)
    pub action_type: String,             // 操作类型 (存储为字符串)
    pub actor: String,                   // 操作人
    pub action_ts: NaiveDateTime,        // 操作时间戳
    pub target_id: String,               // 作用对象 (vendor_id / center_id / batch_id / config key)
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

impl ActionLog {
    /// 新建一条操作日志 (时间取本地当前时间)
    pub fn new(action_type: ActionType, actor: &str, target_id: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            actor: actor.to_string(),
            action_ts: crate::db::now_ts(),
            target_id: target_id.to_string(),
            payload_json: None,
            detail: None,
        }
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
