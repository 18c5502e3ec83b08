// ==========================================
// 供应商耐久性评分系统 - 清单字段映射器
// ==========================================
// 职责: 源列 → 零件行字段映射 + 类型转换
// 标准列: sku, name, quantity, failures_logged
// 别名: part_sku / part_name / qty / failures
// ==========================================

use crate::domain::batch::PartEntry;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRecord;
use std::collections::HashMap;

/// 标准列 → 可接受的列名（不区分大小写）
const SKU_ALIASES: [&str; 2] = ["sku", "part_sku"];
const NAME_ALIASES: [&str; 2] = ["name", "part_name"];
const QUANTITY_ALIASES: [&str; 2] = ["quantity", "qty"];
const FAILURES_ALIASES: [&str; 2] = ["failures_logged", "failures"];

pub struct FieldMapper;

impl FieldMapper {
    /// 检查表头是否包含必需列（sku / name / quantity）
    pub fn check_headers<'a>(&self, headers: impl Iterator<Item = &'a String>) -> ImportResult<()> {
        let normalized: Vec<String> = headers.map(|h| h.trim().to_lowercase()).collect();
        for (column, aliases) in [
            ("sku", &SKU_ALIASES),
            ("name", &NAME_ALIASES),
            ("quantity", &QUANTITY_ALIASES),
        ] {
            if !aliases.iter().any(|a| normalized.iter().any(|h| h == a)) {
                return Err(ImportError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }

    /// 映射为零件行
    ///
    /// 只做类型转换；数值范围由批次入账校验。
    pub fn map_to_part(&self, record: &RawRecord) -> ImportResult<PartEntry> {
        let row = normalize_keys(&record.fields);
        let row_number = record.row;

        let sku = self.get_string(&row, &SKU_ALIASES).unwrap_or_default();
        let name = self.get_string(&row, &NAME_ALIASES).unwrap_or_default();
        let quantity = self
            .parse_i64(&row, &QUANTITY_ALIASES, row_number)?
            .ok_or_else(|| ImportError::FieldMappingError {
                row: row_number,
                message: "quantity 为空".to_string(),
            })?;
        let failures_logged = self
            .parse_i64(&row, &FAILURES_ALIASES, row_number)?
            .unwrap_or(0);

        Ok(PartEntry {
            sku,
            name,
            quantity,
            failures_logged,
        })
    }

    /// 提取字符串字段，按别名顺序取第一个非空值
    fn get_string(&self, row: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| {
            row.get(*alias)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
    }

    /// 解析整数
    ///
    /// Excel 数值单元格可能呈现为 "10" 或 "10.0"，整数值的浮点表示也接受。
    fn parse_i64(
        &self,
        row: &HashMap<String, String>,
        aliases: &[&str],
        row_number: usize,
    ) -> ImportResult<Option<i64>> {
        let Some(value) = self.get_string(row, aliases) else {
            return Ok(None);
        };

        if let Ok(n) = value.parse::<i64>() {
            return Ok(Some(n));
        }
        match value.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Ok(Some(f as i64))
            }
            _ => Err(ImportError::TypeConversionError {
                row: row_number,
                field: aliases[0].to_string(),
                message: format!("无法解析为整数: {}", value),
            }),
        }
    }
}

fn normalize_keys(fields: &HashMap<String, String>) -> HashMap<String, String> {
    fields
        .iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row: usize, pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord {
            row,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_map_with_aliases() {
        let mapper = FieldMapper;
        let part = mapper
            .map_to_part(&record(
                1,
                &[("Part_SKU", "BRK-1"), ("part_name", "Brake pad"), ("QTY", "12.0")],
            ))
            .unwrap();
        assert_eq!(part, PartEntry::new("BRK-1", "Brake pad", 12, 0));
    }

    #[test]
    fn test_bad_quantity_reports_row() {
        let mapper = FieldMapper;
        let err = mapper
            .map_to_part(&record(4, &[("sku", "A"), ("name", "B"), ("quantity", "ten")]))
            .unwrap_err();
        match err {
            ImportError::TypeConversionError { row, field, .. } => {
                assert_eq!(row, 4);
                assert_eq!(field, "quantity");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_detected() {
        let mapper = FieldMapper;
        let headers = vec!["sku".to_string(), "qty".to_string()];
        let err = mapper.check_headers(headers.iter()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(ref c) if c == "name"));
    }
}
