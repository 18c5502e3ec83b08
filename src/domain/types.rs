// ==========================================
// 供应商耐久性评分系统 - 领域类型定义
// ==========================================
// 依据: 评分规则 - 认证等级
// 依据: 审计要求 - 操作类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 认证等级 (Verification Tier)
// ==========================================
// 红线: 等级由耐久分派生,不可独立存储
// 序列化格式: SCREAMING_SNAKE_CASE (与前端一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationTier {
    Verified,    // 已认证
    UnderReview, // 审查中
}

impl fmt::Display for VerificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationTier::Verified => write!(f, "VERIFIED"),
            VerificationTier::UnderReview => write!(f, "UNDER_REVIEW"),
        }
    }
}

// ==========================================
// 操作类型 (Action Type)
// ==========================================
// 红线: 所有写入必须记录
// 存储格式: SCREAMING_SNAKE_CASE 字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    RegisterVendor,    // 供应商注册
    RegisterCenter,    // 服务中心注册
    RedeclareCapacity, // 服务中心产能重申
    IngestBatch,       // 批次入账
    SubmitFeedback,    // 提交评价
    UpdateConfig,      // 配置更新
}

impl ActionType {
    /// 数据库存储值
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::RegisterVendor => "REGISTER_VENDOR",
            ActionType::RegisterCenter => "REGISTER_CENTER",
            ActionType::RedeclareCapacity => "REDECLARE_CAPACITY",
            ActionType::IngestBatch => "INGEST_BATCH",
            ActionType::SubmitFeedback => "SUBMIT_FEEDBACK",
            ActionType::UpdateConfig => "UPDATE_CONFIG",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_tier_serde() {
        let json = serde_json::to_string(&VerificationTier::UnderReview).unwrap();
        assert_eq!(json, "\"UNDER_REVIEW\"");
        assert_eq!(VerificationTier::Verified.to_string(), "VERIFIED");
    }

    #[test]
    fn test_action_type_matches_serde_name() {
        for action in [
            ActionType::RegisterVendor,
            ActionType::IngestBatch,
            ActionType::SubmitFeedback,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }
}
