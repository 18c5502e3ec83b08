// ==========================================
// 供应商耐久性评分系统 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: 供应网络后台核心 (身份登记 / 批次账本 / 评分 / 评价)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 评分规则
pub mod engine;

// 导入层 - 清单文件
pub mod importer;

// 配置层 - 业务配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ActionType, VerificationTier};

// 领域实体
pub use domain::{
    ActionLog, AnalyticsSnapshot, Batch, BatchPeriod, FeedbackEntry, NetworkOverview, NewBatch,
    PartEntry, ServiceCenter, Vendor, VendorMetrics,
};

// 引擎
pub use engine::ScoringEngine;

// API
pub use api::{AnalyticsApi, ApiError, ApiResult, BatchApi, FeedbackApi, RegistryApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "供应商耐久性评分系统";
