// ==========================================
// 供应商耐久性评分系统 - 清单导入器
// ==========================================
// 流程: 文件解析 → 表头检查 → 字段映射
// 说明: 导入器只产出零件行, 入账仍走批次账本 API
// ==========================================

use crate::domain::batch::PartEntry;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

pub struct ManifestImporter {
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl Default for ManifestImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestImporter {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    /// 读取清单文件
    ///
    /// # 返回
    /// - Ok(Vec<PartEntry>): 文件顺序的零件行
    /// - Err(ImportError): 文件/表头/类型错误（带数据行号）
    pub fn load<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<PartEntry>> {
        let path = file_path.as_ref();
        let records = self.parser.parse(path)?;
        if records.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        let headers: BTreeSet<&String> = records.iter().flat_map(|r| r.fields.keys()).collect();
        self.mapper.check_headers(headers.into_iter())?;

        let parts = records
            .iter()
            .map(|record| {
                debug!(row = record.row, "映射清单行");
                self.mapper.map_to_part(record)
            })
            .collect::<ImportResult<Vec<_>>>()?;

        info!(file = %path.display(), parts = parts.len(), "清单文件读取完成");
        Ok(parts)
    }
}
