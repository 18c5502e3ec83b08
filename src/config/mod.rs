// ==========================================
// 供应商耐久性评分系统 - 配置层
// ==========================================
// 职责: 业务配置管理 (阈值/分页/排行条数)
// 存储: config_kv 表
// 说明: 进程级配置 (数据库路径/监听地址) 由命令行参数提供
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigItem, ConfigManager, GLOBAL_SCOPE};
