// ==========================================
// 供应商耐久性评分系统 - 评分引擎
// ==========================================
// 依据: 评分规则 - 耐久分 / 成功率 / 混合评分 / 认证等级
// 红线: Engine 不拼 SQL, 纯函数, 不读写存储
// 红线: 耐久分不存储, 每次读取重新计算
// ==========================================
// 输入: VendorHistory (同一读事务内取出)
// 输出: AnalyticsSnapshot / NetworkOverview
// ==========================================

use crate::domain::analytics::{
    AnalyticsSnapshot, NetworkOverview, NetworkTotals, VendorFailureRank, VendorHistory,
    VendorJobCounts,
};
use crate::domain::types::VerificationTier;
use tracing::{instrument, warn};

/// 默认认证阈值 (耐久分 >= 90 视为已认证)
pub const DEFAULT_VERIFIED_THRESHOLD: f64 = 90.0;

/// 无数据时的满分基线
const FULL_SCORE: f64 = 100.0;

/// 保留两位小数
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clamp_score(value: f64) -> f64 {
    round2(value.clamp(0.0, FULL_SCORE))
}

// ==========================================
// ScoringEngine - 评分引擎
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    verified_threshold: f64,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringEngine {
    /// 使用默认阈值创建引擎
    pub fn new() -> Self {
        Self {
            verified_threshold: DEFAULT_VERIFIED_THRESHOLD,
        }
    }

    /// 使用指定阈值创建引擎（阈值来自 config_kv）
    pub fn with_threshold(verified_threshold: f64) -> Self {
        Self { verified_threshold }
    }

    pub fn verified_threshold(&self) -> f64 {
        self.verified_threshold
    }

    // ==========================================
    // 单项指标
    // ==========================================

    /// 耐久分
    ///
    /// 规则:
    /// - total_jobs > 0: 100 - failed_jobs * 100 / total_jobs
    /// - total_jobs == 0: 100
    ///
    /// 结果截断到 [0, 100] 并保留两位小数。
    pub fn durability_score(&self, total_jobs: i64, failed_jobs: i64) -> f64 {
        if total_jobs <= 0 {
            return FULL_SCORE;
        }
        let failure_pct = failed_jobs as f64 * 100.0 / total_jobs as f64;
        clamp_score(FULL_SCORE - failure_pct)
    }

    /// 成功率 (百分比)，零件数为 0 时为 100
    pub fn success_rate(&self, total_jobs: i64, failed_jobs: i64) -> f64 {
        if total_jobs <= 0 {
            return FULL_SCORE;
        }
        let succeeded = total_jobs.saturating_sub(failed_jobs);
        clamp_score(succeeded as f64 * 100.0 / total_jobs as f64)
    }

    /// 混合评分
    ///
    /// 按提交顺序折叠: new = (old + rating) / 2，初值 0。
    /// 越新的评分权重越大。
    pub fn blended_rating(&self, ratings: &[i64]) -> f64 {
        ratings
            .iter()
            .fold(0.0, |acc, &rating| (acc + rating as f64) / 2.0)
    }

    /// 认证等级
    pub fn verification_tier(&self, durability_score: f64) -> VerificationTier {
        if durability_score >= self.verified_threshold {
            VerificationTier::Verified
        } else {
            VerificationTier::UnderReview
        }
    }

    // ==========================================
    // 组合输出
    // ==========================================

    /// 由供应商历史生成分析快照
    pub fn build_snapshot(&self, history: &VendorHistory) -> AnalyticsSnapshot {
        let vendor = &history.vendor;
        let metrics = vendor.metrics;
        if !metrics.is_consistent() {
            warn!(
                vendor_id = %vendor.vendor_id,
                total_jobs = metrics.total_jobs,
                failed_jobs = metrics.failed_jobs,
                "供应商指标不满足不变量, 按钳制后的分数输出"
            );
        }
        let durability_score = self.durability_score(metrics.total_jobs, metrics.failed_jobs);

        AnalyticsSnapshot {
            vendor_id: vendor.vendor_id.clone(),
            vendor_name: vendor.name.clone(),
            category: vendor.category.clone(),
            contact: vendor.contact.clone(),
            total_jobs: metrics.total_jobs,
            failed_jobs: metrics.failed_jobs,
            avg_response_time_secs: round2(metrics.avg_response_time_secs.max(0.0)),
            durability_score,
            success_rate: self.success_rate(metrics.total_jobs, metrics.failed_jobs),
            blended_rating: self.blended_rating(&history.ratings),
            verification_tier: self.verification_tier(durability_score),
            batches_analyzed: history.batches_analyzed,
            feedback_count: history.ratings.len() as i64,
            reviews: vendor.reviews.clone(),
        }
    }

    /// 生成网络总览
    ///
    /// # 参数
    /// - totals: 中心/产能/批次计数
    /// - vendors: 各供应商件数（登记顺序）
    /// - top_n: 故障排行条数
    #[instrument(skip(self, totals, vendors), fields(vendors = vendors.len()))]
    pub fn build_overview(
        &self,
        totals: NetworkTotals,
        vendors: &[VendorJobCounts],
        top_n: usize,
    ) -> NetworkOverview {
        let total_parts = vendors
            .iter()
            .fold(0i64, |acc, v| acc.saturating_add(v.total_jobs));
        let total_failures = vendors
            .iter()
            .fold(0i64, |acc, v| acc.saturating_add(v.failed_jobs));

        let verified_vendors = vendors
            .iter()
            .filter(|v| {
                let score = self.durability_score(v.total_jobs, v.failed_jobs);
                self.verification_tier(score) == VerificationTier::Verified
            })
            .count() as i64;

        let mut failing: Vec<&VendorJobCounts> =
            vendors.iter().filter(|v| v.failed_jobs > 0).collect();
        failing.sort_by(|a, b| {
            b.failed_jobs
                .cmp(&a.failed_jobs)
                .then_with(|| a.vendor_id.cmp(&b.vendor_id))
        });

        let top_failing_vendors = failing
            .into_iter()
            .take(top_n)
            .map(|v| VendorFailureRank {
                vendor_id: v.vendor_id.clone(),
                name: v.name.clone(),
                total_jobs: v.total_jobs,
                failed_jobs: v.failed_jobs,
                durability_score: self.durability_score(v.total_jobs, v.failed_jobs),
            })
            .collect();

        NetworkOverview {
            total_centers: totals.total_centers,
            total_vendors: vendors.len() as i64,
            total_service_capacity: totals.total_service_capacity,
            total_batches: totals.total_batches,
            total_parts,
            total_failures,
            network_durability_score: self.durability_score(total_parts, total_failures),
            verified_vendors,
            top_failing_vendors,
        }
    }
}
