// ==========================================
// 供应商耐久性评分系统 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新 (带校验与审计)
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::log_rejection;
use crate::api::validator::{normalize_config_value, require_non_blank};
use crate::config::{ConfigItem, ConfigManager};
use crate::db::now_ts;
use crate::domain::action_log::ActionLog;
use crate::domain::types::ActionType;

/// 配置视图: 生效值 + 已存储项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigView {
    pub effective: BTreeMap<String, String>,
    pub stored: Vec<ConfigItem>,
}

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询所有配置
    pub fn list_configs(&self) -> ApiResult<ConfigView> {
        Ok(ConfigView {
            effective: self.config_manager.get_effective_snapshot()?,
            stored: self.config_manager.list_configs()?,
        })
    }

    /// 更新配置
    ///
    /// 仅接受已知键，值按键的类型与范围校验后规范化存储。
    pub fn update_config(&self, key: &str, value: &str, actor: &str) -> ApiResult<ConfigItem> {
        self.do_update_config(key, value, actor)
            .map_err(|e| log_rejection("update_config", e))
    }

    fn do_update_config(&self, key: &str, value: &str, actor: &str) -> ApiResult<ConfigItem> {
        require_non_blank("key", key)?;
        let normalized = normalize_config_value(key, value)?;

        let audit = ActionLog::new(ActionType::UpdateConfig, actor, key)
            .with_payload(json!({ "key": key, "value": normalized }))
            .with_detail(format!("更新配置: {}={}", key, normalized));

        let item = self.config_manager.upsert_global(
            key,
            &normalized,
            now_ts(),
            &audit,
        )?;

        info!(key, value = %item.value, actor, "配置已更新");
        Ok(item)
    }
}
