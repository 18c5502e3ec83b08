// ==========================================
// 供应商耐久性评分系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// 红线: 每个错误必须指明出错的字段或ID
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    // ==========================================
    // 身份/引用错误
    // ==========================================
    #[error("{entity}(id={id})已存在")]
    DuplicateIdentity { entity: String, id: String },

    #[error("供应商不存在: vendor_id={0}")]
    UnknownVendor(String),

    #[error("{entity}(id={id})不存在")]
    NotFound { entity: String, id: String },

    // ==========================================
    // 输入校验错误
    // ==========================================
    #[error("产能必须为正整数: center_id={center_id}, capacity={capacity}")]
    InvalidCapacity { center_id: String, capacity: i64 },

    #[error("清单第{index}行字段{field}无效: {reason}")]
    InvalidPart {
        index: usize,
        field: String,
        reason: String,
    },

    #[error("批次清单为空: batch_id={0}")]
    EmptyManifest(String),

    #[error("评分必须在1-5之间: rating={0}")]
    InvalidRating(i64),

    #[error("评价内容不能为空: vendor_id={0}")]
    EmptyReview(String),

    #[error("批次周期无效: {0}")]
    InvalidPeriod(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 存储错误
    // ==========================================
    #[error("存储暂不可用: {0}")]
    StorageUnavailable(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 错误分类名（对外稳定）
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::DuplicateIdentity { .. } => "DuplicateIdentity",
            ApiError::UnknownVendor(_) => "UnknownVendor",
            ApiError::NotFound { .. } => "NotFound",
            ApiError::InvalidCapacity { .. } => "InvalidCapacity",
            ApiError::InvalidPart { .. } => "InvalidPart",
            ApiError::EmptyManifest(_) => "EmptyManifest",
            ApiError::InvalidRating(_) => "InvalidRating",
            ApiError::EmptyReview(_) => "EmptyReview",
            ApiError::InvalidPeriod(_) => "InvalidPeriod",
            ApiError::InvalidInput(_) => "InvalidInput",
            ApiError::StorageUnavailable(_) => "StorageUnavailable",
            ApiError::Internal(_) => "Internal",
        }
    }

    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::DuplicateIdentity { .. } => 409,
            ApiError::NotFound { .. } => 404,
            ApiError::UnknownVendor(_) => 422,
            ApiError::InvalidCapacity { .. }
            | ApiError::InvalidPart { .. }
            | ApiError::EmptyManifest(_)
            | ApiError::InvalidRating(_)
            | ApiError::EmptyReview(_)
            | ApiError::InvalidPeriod(_)
            | ApiError::InvalidInput(_) => 400,
            ApiError::StorageUnavailable(_) => 503,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid_part(index: usize, field: &str, reason: impl Into<String>) -> Self {
        ApiError::InvalidPart {
            index,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateKey { entity, id } => {
                ApiError::DuplicateIdentity { entity, id }
            }
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            RepositoryError::MissingReference { entity, id } => {
                if entity == "Vendor" {
                    ApiError::UnknownVendor(id)
                } else {
                    ApiError::NotFound { entity, id }
                }
            }

            // 暂时性错误
            RepositoryError::LockError(msg) => {
                ApiError::StorageUnavailable(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseBusy(msg) | RepositoryError::DatabaseQueryError(msg) => {
                ApiError::StorageUnavailable(msg)
            }

            // 约束兜底 (仓储层已将可预期的冲突转换为 DuplicateKey/MissingReference)
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::DuplicateIdentity {
                entity: "Record".to_string(),
                id: msg,
            },
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::InvalidInput(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("检查约束违反: {}", msg))
            }

            RepositoryError::CounterOverflow { entity, id, field } => ApiError::InvalidInput(
                format!("{}(id={})累计{}将超出可表示范围", entity, id, field),
            ),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::Internal(format!("存储数据字段{}无法解析: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_vendor_maps_to_unknown_vendor() {
        let err: ApiError = RepositoryError::missing_reference("Vendor", "V-404").into();
        assert_eq!(err, ApiError::UnknownVendor("V-404".to_string()));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err: ApiError = RepositoryError::duplicate("Batch", "B-1").into();
        assert_eq!(err.kind(), "DuplicateIdentity");
        assert_eq!(err.status_code(), 409);
        assert!(err.to_string().contains("B-1"));
    }

    #[test]
    fn test_counter_overflow_is_invalid_input() {
        let err: ApiError = RepositoryError::counter_overflow("Vendor", "V-1", "total_jobs").into();
        assert_eq!(err.kind(), "InvalidInput");
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("V-1"));
    }

    #[test]
    fn test_busy_maps_to_unavailable() {
        let err: ApiError = RepositoryError::DatabaseBusy("database is locked".to_string()).into();
        assert_eq!(err.kind(), "StorageUnavailable");
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_validation_kinds_are_bad_request() {
        for err in [
            ApiError::EmptyManifest("B-1".to_string()),
            ApiError::InvalidRating(6),
            ApiError::EmptyReview("V-1".to_string()),
            ApiError::invalid_part(1, "quantity", "必须大于0"),
        ] {
            assert_eq!(err.status_code(), 400, "{}", err.kind());
        }
    }
}
