// ==========================================
// 供应商耐久性评分系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::Arc;

use crate::api::{
    ActionLogApi, AnalyticsApi, BatchApi, ConfigApi, FeedbackApi, ManifestImportApi, RegistryApi,
};
use crate::config::ConfigManager;
use crate::db::{open_shared_connection, SharedConnection};
use crate::repository::{
    ActionLogRepository, AnalyticsRepository, BatchRepository, FeedbackRepository,
    ServiceCenterRepository, VendorRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源，HTTP 路由以 Arc<AppState> 共享
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 身份登记API
    pub registry_api: Arc<RegistryApi>,

    /// 批次账本API
    pub batch_api: Arc<BatchApi>,

    /// 评价API
    pub feedback_api: Arc<FeedbackApi>,

    /// 分析查询API
    pub analytics_api: Arc<AnalyticsApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    /// 操作日志API
    pub action_log_api: Arc<ActionLogApi>,

    /// 清单导入API
    pub import_api: Arc<ManifestImportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在则创建并建表）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: &str) -> Result<Self, String> {
        tracing::info!(db_path, "初始化AppState");

        let conn = open_shared_connection(db_path)
            .map_err(|e| format!("无法打开数据库 {}: {}", db_path, e))?;

        Ok(Self::from_connection(db_path, conn))
    }

    /// 基于已打开的共享连接装配各层
    pub fn from_connection(db_path: &str, conn: SharedConnection) -> Self {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let vendor_repo = Arc::new(VendorRepository::new(conn.clone()));
        let center_repo = Arc::new(ServiceCenterRepository::new(conn.clone()));
        let batch_repo = Arc::new(BatchRepository::new(conn.clone()));
        let feedback_repo = Arc::new(FeedbackRepository::new(conn.clone()));
        let analytics_repo = Arc::new(AnalyticsRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        // 配置管理器
        let config_manager = Arc::new(ConfigManager::new(conn));

        // ==========================================
        // 初始化API层
        // ==========================================
        let registry_api = Arc::new(RegistryApi::new(vendor_repo.clone(), center_repo));
        let batch_api = Arc::new(BatchApi::new(batch_repo, vendor_repo, config_manager.clone()));
        let analytics_api = Arc::new(AnalyticsApi::new(analytics_repo, config_manager.clone()));
        let feedback_api = Arc::new(FeedbackApi::new(feedback_repo, analytics_api.clone()));
        let config_api = Arc::new(ConfigApi::new(config_manager));
        let action_log_api = Arc::new(ActionLogApi::new(action_log_repo));
        let import_api = Arc::new(ManifestImportApi::new(batch_api.clone()));

        tracing::info!("AppState初始化完成");

        Self {
            db_path: db_path.to_string(),
            registry_api,
            batch_api,
            feedback_api,
            analytics_api,
            config_api,
            action_log_api,
            import_api,
        }
    }
}

/// 获取默认数据库路径
///
/// `<data_dir>/vendor-durability/vendor_durability.db`，
/// 取不到用户数据目录时回退到当前目录。
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    let mut path = PathBuf::from("./vendor_durability.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("vendor-durability");
        // 目录创建失败时由打开数据库一步报告
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("vendor_durability.db");
        }
    }

    path.to_string_lossy().to_string()
}
