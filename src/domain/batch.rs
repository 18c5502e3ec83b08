// ==========================================
// 供应商耐久性评分系统 - 供货批次领域模型
// ==========================================
// 依据: 数据模型 - Batch / Part
// 红线: 批次只追加,不更新,不删除 (审计链)
// 说明: 追溯更正必须以新的冲正批次表达
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// BatchPeriod - 批次周期
// ==========================================
// 红线: start <= end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPeriod {
    pub month: String,     // 月份标签 (YYYY-MM)
    pub start: NaiveDate,  // 有效期开始
    pub end: NaiveDate,    // 有效期结束
}

impl BatchPeriod {
    pub fn new(month: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            month: month.into(),
            start,
            end,
        }
    }

    /// 有效期天数 (含首尾)
    pub fn window_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

// ==========================================
// PartEntry - 清单零件行
// ==========================================
// 红线: quantity > 0, 0 <= failures_logged <= quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartEntry {
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub failures_logged: i64,
}

impl PartEntry {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, quantity: i64, failures_logged: i64) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            quantity,
            failures_logged,
        }
    }
}

// ==========================================
// NewBatch - 待入账批次
// ==========================================
// 用途: 入账请求 (尚未分配账本序号)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatch {
    pub batch_id: String,
    pub vendor_id: String,
    pub company_name: String,
    pub period: BatchPeriod,
    pub manifest: Vec<PartEntry>,
}

impl NewBatch {
    /// 清单总件数
    pub fn total_quantity(&self) -> i64 {
        self.manifest.iter().map(|p| p.quantity).sum()
    }

    /// 清单总故障数
    pub fn total_failures(&self) -> i64 {
        self.manifest.iter().map(|p| p.failures_logged).sum()
    }
}

// ==========================================
// Batch - 已入账批次
// ==========================================
// 对齐: supply_batch 表 + batch_part 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub ledger_seq: i64,           // 账本序号 (插入顺序)
    pub batch_id: String,          // 批次ID (幂等键)
    pub vendor_id: String,         // 所属供应商
    pub company_name: String,      // 目标主机厂
    pub period: BatchPeriod,
    pub manifest: Vec<PartEntry>,
    pub ingested_at: NaiveDateTime,
}

impl Batch {
    /// 清单总件数
    pub fn total_quantity(&self) -> i64 {
        self.manifest.iter().map(|p| p.quantity).sum()
    }

    /// 清单总故障数
    pub fn total_failures(&self) -> i64 {
        self.manifest.iter().map(|p| p.failures_logged).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_totals() {
        let batch = NewBatch {
            batch_id: "B-1".to_string(),
            vendor_id: "V-1".to_string(),
            company_name: "TOYOTA".to_string(),
            period: BatchPeriod::new(
                "2026-01",
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            ),
            manifest: vec![
                PartEntry::new("X", "Bolt", 100, 5),
                PartEntry::new("Y", "Nut", 40, 0),
            ],
        };

        assert_eq!(batch.total_quantity(), 140);
        assert_eq!(batch.total_failures(), 5);
        assert_eq!(batch.period.window_days(), 365);
    }

    #[test]
    fn test_failures_logged_defaults_to_zero() {
        let part: PartEntry =
            serde_json::from_str(r#"{"sku":"X","name":"Bolt","quantity":10}"#).unwrap();
        assert_eq!(part.failures_logged, 0);
    }
}
