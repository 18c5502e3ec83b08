// ==========================================
// 供应商耐久性评分系统 - 导入层
// ==========================================
// 职责: 从外部文件读取批次清单
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod manifest_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use manifest_importer::ManifestImporter;
