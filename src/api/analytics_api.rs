// ==========================================
// 供应商耐久性评分系统 - 分析查询 API
// ==========================================
// 职责: 供应商分析快照、网络总览
// 红线: 每次查询在单个读事务内重新计算, 不缓存
// 红线: 不生成占位/演示数据, 空聚合按真实值返回
// ==========================================

use std::sync::Arc;

use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{defaults, ConfigManager};
use crate::domain::analytics::{AnalyticsSnapshot, NetworkOverview};
use crate::engine::ScoringEngine;
use crate::repository::AnalyticsRepository;

// ==========================================
// AnalyticsApi - 分析查询 API
// ==========================================
pub struct AnalyticsApi {
    analytics_repo: Arc<AnalyticsRepository>,
    config_manager: Arc<ConfigManager>,
}

impl AnalyticsApi {
    pub fn new(analytics_repo: Arc<AnalyticsRepository>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            analytics_repo,
            config_manager,
        }
    }

    /// 按当前配置阈值构造评分引擎
    pub(crate) fn scoring_engine(&self) -> ApiResult<ScoringEngine> {
        let threshold = self.config_manager.get_verified_threshold()?;
        Ok(ScoringEngine::with_threshold(threshold))
    }

    /// 查询供应商分析快照
    ///
    /// # 返回
    /// - Ok(AnalyticsSnapshot): 实时计算的快照
    /// - Err(NotFound): 供应商不存在
    pub fn get_analytics(&self, vendor_id: &str) -> ApiResult<AnalyticsSnapshot> {
        let engine = self.scoring_engine()?;
        let history = self
            .analytics_repo
            .load_vendor_history(vendor_id)?
            .ok_or_else(|| ApiError::not_found("Vendor", vendor_id))?;

        let snapshot = engine.build_snapshot(&history);
        debug!(
            vendor_id,
            durability_score = snapshot.durability_score,
            tier = %snapshot.verification_tier,
            "分析快照已计算"
        );
        Ok(snapshot)
    }

    /// 查询网络总览
    ///
    /// # 参数
    /// - top_n: 故障排行条数，缺省取配置 overview/top_failing_limit，上限 50
    pub fn get_network_overview(&self, top_n: Option<usize>) -> ApiResult<NetworkOverview> {
        let engine = self.scoring_engine()?;
        let top_n = match top_n {
            Some(n) => n.min(defaults::MAX_TOP_FAILING_LIMIT),
            None => self.config_manager.get_top_failing_limit()?,
        };

        let (totals, vendors) = self.analytics_repo.load_network_inputs()?;
        Ok(engine.build_overview(totals, &vendors, top_n))
    }
}
