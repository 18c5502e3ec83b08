// ==========================================
// 供应商耐久性评分系统 - 输入校验器
// ==========================================
// 职责: 写入前的纯输入校验 (不访问存储)
// 顺序: 先校验输入, 再在事务内做唯一性/引用检查
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, defaults};
use crate::domain::batch::{BatchPeriod, PartEntry};
use crate::domain::feedback::{MAX_RATING, MIN_RATING};

/// 身份字段非空
pub fn require_non_blank(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

/// 产能 > 0
pub fn validate_capacity(center_id: &str, capacity: i64) -> ApiResult<()> {
    if capacity <= 0 {
        return Err(ApiError::InvalidCapacity {
            center_id: center_id.to_string(),
            capacity,
        });
    }
    Ok(())
}

/// 校验批次清单
///
/// 规则（index 从 1 开始）:
/// - 清单非空
/// - sku / name 非空
/// - quantity > 0
/// - 0 <= failures_logged <= quantity
/// - 合计件数不溢出
pub fn validate_manifest(batch_id: &str, manifest: &[PartEntry]) -> ApiResult<()> {
    if manifest.is_empty() {
        return Err(ApiError::EmptyManifest(batch_id.to_string()));
    }

    let mut total_quantity: i64 = 0;
    for (i, part) in manifest.iter().enumerate() {
        let index = i + 1;
        if part.sku.trim().is_empty() {
            return Err(ApiError::invalid_part(index, "sku", "不能为空"));
        }
        if part.name.trim().is_empty() {
            return Err(ApiError::invalid_part(index, "name", "不能为空"));
        }
        if part.quantity <= 0 {
            return Err(ApiError::invalid_part(
                index,
                "quantity",
                format!("必须大于0 (实际 {})", part.quantity),
            ));
        }
        if part.failures_logged < 0 {
            return Err(ApiError::invalid_part(
                index,
                "failures_logged",
                format!("不能为负数 (实际 {})", part.failures_logged),
            ));
        }
        if part.failures_logged > part.quantity {
            return Err(ApiError::invalid_part(
                index,
                "failures_logged",
                format!(
                    "不能大于 quantity ({} > {})",
                    part.failures_logged, part.quantity
                ),
            ));
        }
        total_quantity = total_quantity.checked_add(part.quantity).ok_or_else(|| {
            ApiError::invalid_part(index, "quantity", "清单合计件数溢出")
        })?;
    }
    Ok(())
}

/// 校验月份标签 (YYYY-MM)
pub fn validate_month_tag(month: &str) -> ApiResult<()> {
    let trimmed = month.trim();
    let well_formed = trimmed.len() == 7
        && NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d").is_ok();
    if !well_formed {
        return Err(ApiError::InvalidPeriod(format!(
            "月份标签格式应为 YYYY-MM: {}",
            month
        )));
    }
    Ok(())
}

/// 校验批次周期
pub fn validate_period(period: &BatchPeriod) -> ApiResult<()> {
    validate_month_tag(&period.month)?;
    if period.start > period.end {
        return Err(ApiError::InvalidPeriod(format!(
            "有效期开始晚于结束: {} > {}",
            period.start, period.end
        )));
    }
    Ok(())
}

/// 解析日期 (YYYY-MM-DD)
pub fn parse_period_date(field: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::InvalidPeriod(format!("{} 日期格式应为 YYYY-MM-DD: {}", field, value))
    })
}

/// 评分 ∈ [1, 5]
pub fn validate_rating(rating: i64) -> ApiResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ApiError::InvalidRating(rating));
    }
    Ok(())
}

/// 评价非空
pub fn validate_review(vendor_id: &str, review: &str) -> ApiResult<()> {
    if review.trim().is_empty() {
        return Err(ApiError::EmptyReview(vendor_id.to_string()));
    }
    Ok(())
}

/// 响应时长 (可选) 必须为非负有限数
pub fn validate_response_time(value: Option<f64>) -> ApiResult<()> {
    match value {
        Some(secs) if !secs.is_finite() || secs < 0.0 => Err(ApiError::InvalidInput(format!(
            "response_time_secs 必须为非负数: {}",
            secs
        ))),
        _ => Ok(()),
    }
}

/// 校验并规范化配置值
///
/// # 返回
/// - Ok(String): 规范化后的存储值
pub fn normalize_config_value(key: &str, value: &str) -> ApiResult<String> {
    let raw = value.trim();
    match key {
        config_keys::VERIFIED_THRESHOLD => {
            let v: f64 = raw
                .parse()
                .map_err(|_| ApiError::InvalidInput(format!("{} 必须为数字: {}", key, value)))?;
            if !(0.0..=100.0).contains(&v) {
                return Err(ApiError::InvalidInput(format!(
                    "{} 必须在 0-100 之间: {}",
                    key, value
                )));
            }
            Ok(v.to_string())
        }
        config_keys::TOP_FAILING_LIMIT => {
            parse_bounded_usize(key, raw, defaults::MAX_TOP_FAILING_LIMIT).map(|v| v.to_string())
        }
        config_keys::LEDGER_PAGE_SIZE => {
            parse_bounded_usize(key, raw, defaults::MAX_LEDGER_PAGE_SIZE).map(|v| v.to_string())
        }
        _ => Err(ApiError::InvalidInput(format!("未知配置键: {}", key))),
    }
}

fn parse_bounded_usize(key: &str, raw: &str, max: usize) -> ApiResult<usize> {
    let v: usize = raw
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("{} 必须为正整数: {}", key, raw)))?;
    if v == 0 || v > max {
        return Err(ApiError::InvalidInput(format!(
            "{} 必须在 1-{} 之间: {}",
            key, max, raw
        )));
    }
    Ok(v)
}
