// ==========================================
// 供应商耐久性评分系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 身份/引用错误 =====
    #[error("主键重复: {entity} with id={id}")]
    DuplicateKey { entity: String, id: String },

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("引用对象不存在: {entity} with id={id}")]
    MissingReference { entity: String, id: String },

    // ===== 数据库错误 =====
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库繁忙: {0}")]
    DatabaseBusy(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("检查约束违反: {0}")]
    CheckConstraintViolation(String),

    // ===== 数据质量错误 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    #[error("累计值溢出: {entity} with id={id}, field={field}")]
    CounterOverflow {
        entity: String,
        id: String,
        field: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl RepositoryError {
    pub fn duplicate(entity: &str, id: &str) -> Self {
        RepositoryError::DuplicateKey {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn missing_reference(entity: &str, id: &str) -> Self {
        RepositoryError::MissingReference {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn counter_overflow(entity: &str, id: &str, field: &str) -> Self {
        RepositoryError::CounterOverflow {
            entity: entity.to_string(),
            id: id.to_string(),
            field: field.to_string(),
        }
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, ref msg) => {
                let text = msg.clone().unwrap_or_else(|| err.to_string());
                match code.code {
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                        RepositoryError::DatabaseBusy(text)
                    }
                    _ if text.contains("UNIQUE") => RepositoryError::UniqueConstraintViolation(text),
                    _ if text.contains("FOREIGN KEY") => RepositoryError::ForeignKeyViolation(text),
                    _ if text.contains("CHECK") => RepositoryError::CheckConstraintViolation(text),
                    _ => RepositoryError::DatabaseQueryError(text),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            rusqlite::Error::FromSqlConversionFailure(idx, _, ref source) => {
                RepositoryError::FieldValueError {
                    field: format!("column#{}", idx),
                    message: source.to_string(),
                }
            }
            // 列存储类型与读取类型不符: 数据问题, 重试无效
            rusqlite::Error::InvalidColumnType(idx, ref name, ref ty) => {
                RepositoryError::FieldValueError {
                    field: format!("column#{}({})", idx, name),
                    message: format!("存储类型为 {}", ty),
                }
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_classified() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        );
        let repo_err: RepositoryError = err.into();
        assert!(matches!(repo_err, RepositoryError::DatabaseBusy(_)));
    }

    #[test]
    fn test_unique_violation_classified() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: vendor.vendor_id".to_string()),
        );
        let repo_err: RepositoryError = err.into();
        assert!(matches!(repo_err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_column_type_mismatch_is_field_error() {
        let err = rusqlite::Error::InvalidColumnType(
            4,
            "total_jobs".to_string(),
            rusqlite::types::Type::Real,
        );
        let repo_err: RepositoryError = err.into();
        assert!(matches!(repo_err, RepositoryError::FieldValueError { ref field, .. } if field.contains("total_jobs")));
    }
}
