// ==========================================
// 供应商耐久性评分系统 - HTTP 路由层
// ==========================================
// 职责: axum 路由, 请求 DTO 转换, 错误 → HTTP 响应
// 约束: 仓储为同步阻塞调用, 统一经 spawn_blocking 执行
// 约束: 路径沿用控制台现有端点名
// ==========================================

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::validator::parse_period_date;
use crate::api::{ApiError, ApiResult, RegisterCenterRequest, RegisterVendorRequest, SubmitFeedbackRequest};
use crate::app::state::AppState;
use crate::domain::analytics::AnalyticsSnapshot;
use crate::domain::batch::{BatchPeriod, NewBatch, PartEntry};
use crate::perf::PerfGuard;

/// 路由共享状态
pub type SharedState = Arc<AppState>;

/// 操作人请求头
pub const ACTOR_HEADER: &str = "x-actor";
/// 未携带操作人时的默认值
pub const DEFAULT_ACTOR: &str = "system";

// ==========================================
// 错误响应
// ==========================================
// 响应体: {"error": {"kind": "...", "code": 409, "message": "..."}}
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({
            "error": {
                "kind": self.kind(),
                "code": code,
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::InvalidInput(format!("请求体无效: {}", rejection.body_text()))
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError::InvalidInput(format!("查询参数无效: {}", rejection.body_text()))
}

/// 从请求头取操作人
fn actor_from(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
        .to_string()
}

/// 在阻塞线程池中执行同步 API 调用，并记录耗时与 SQL 统计
async fn run_blocking<T, F>(op: &'static str, f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let _perf = PerfGuard::new(op);
        f()
    })
    .await
    .map_err(|e| ApiError::Internal(format!("后台任务失败: {}", e)))?
}

// ==========================================
// 请求 DTO
// ==========================================

/// `/add-batch` 请求体（控制台嵌套结构）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBatchRequest {
    pub batch_allocation_id: String,
    #[serde(default)]
    pub company_name: String,
    pub vendor_details: VendorDetails,
    pub batch_info: BatchInfo,
    #[serde(default)]
    pub parts_manifest: Vec<ManifestLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDetails {
    pub vendor_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInfo {
    pub batch_month: String,
    pub duration_window: DurationWindow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationWindow {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestLine {
    pub part_sku: String,
    pub part_name: String,
    pub quantity: i64,
    #[serde(default)]
    pub failures_logged: i64,
}

impl AddBatchRequest {
    /// 转换为待入账批次（日期格式错误 → InvalidPeriod）
    pub fn into_new_batch(self) -> ApiResult<NewBatch> {
        let start = parse_period_date("duration_window.start", &self.batch_info.duration_window.start)?;
        let end = parse_period_date("duration_window.end", &self.batch_info.duration_window.end)?;

        Ok(NewBatch {
            batch_id: self.batch_allocation_id,
            vendor_id: self.vendor_details.vendor_id,
            company_name: self.company_name,
            period: BatchPeriod::new(self.batch_info.batch_month, start, end),
            manifest: self
                .parts_manifest
                .into_iter()
                .map(|line| PartEntry {
                    sku: line.part_sku,
                    name: line.part_name,
                    quantity: line.quantity,
                    failures_logged: line.failures_logged,
                })
                .collect(),
        })
    }
}

/// 产能重申请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityRequest {
    pub capacity: i64,
}

/// 配置更新请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValueRequest {
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchPageParams {
    pub after_seq: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverviewParams {
    pub top: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

// ==========================================
// 路由
// ==========================================

/// 构建 HTTP 路由
pub fn router(state: SharedState) -> Router {
    Router::new()
        // 身份登记
        .route("/register-vendor", post(register_vendor))
        .route("/register-center", post(register_center))
        .route("/get-all-vendors", get(list_vendors))
        .route("/get-all-centers", get(list_centers))
        .route("/vendor/{vendor_id}", get(get_vendor))
        .route("/center/{center_id}", get(get_center))
        .route("/center-capacity/{center_id}", put(redeclare_capacity))
        // 批次账本
        .route("/add-batch", post(add_batch))
        .route("/vendor-batches/{vendor_id}", get(list_vendor_batches))
        // 评价与分析
        .route("/submit-feedback", post(submit_feedback))
        .route("/vendor-analytics/{vendor_id}", get(vendor_analytics))
        .route("/network-overview", get(network_overview))
        // 审计与配置
        .route("/action-logs", get(action_logs))
        .route("/configs", get(list_configs))
        .route("/configs/{*key}", put(update_config))
        .with_state(state)
}

// ==========================================
// 身份登记
// ==========================================

async fn register_vendor(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterVendorRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let actor = actor_from(&headers);
    let vendor = run_blocking("http.register_vendor", move || {
        state.registry_api.register_vendor(req, &actor)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(vendor)).into_response())
}

async fn register_center(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterCenterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let actor = actor_from(&headers);
    let center = run_blocking("http.register_center", move || {
        state.registry_api.register_center(req, &actor)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(center)).into_response())
}

async fn list_vendors(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let vendors = run_blocking("http.list_vendors", move || state.registry_api.list_vendors()).await?;
    Ok(Json(vendors).into_response())
}

async fn list_centers(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let centers = run_blocking("http.list_centers", move || state.registry_api.list_centers()).await?;
    Ok(Json(centers).into_response())
}

async fn get_vendor(
    State(state): State<SharedState>,
    Path(vendor_id): Path<String>,
) -> Result<Response, ApiError> {
    let vendor = run_blocking("http.get_vendor", move || {
        state.registry_api.get_vendor(&vendor_id)
    })
    .await?;
    Ok(Json(vendor).into_response())
}

async fn get_center(
    State(state): State<SharedState>,
    Path(center_id): Path<String>,
) -> Result<Response, ApiError> {
    let center = run_blocking("http.get_center", move || {
        state.registry_api.get_center(&center_id)
    })
    .await?;
    Ok(Json(center).into_response())
}

async fn redeclare_capacity(
    State(state): State<SharedState>,
    Path(center_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CapacityRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let actor = actor_from(&headers);
    let center = run_blocking("http.redeclare_capacity", move || {
        state
            .registry_api
            .redeclare_capacity(&center_id, req.capacity, &actor)
    })
    .await?;
    Ok(Json(center).into_response())
}

// ==========================================
// 批次账本
// ==========================================

async fn add_batch(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<AddBatchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let actor = actor_from(&headers);
    let batch = run_blocking("http.add_batch", move || {
        let new_batch = req.into_new_batch()?;
        state.batch_api.ingest_batch(new_batch, &actor)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(batch)).into_response())
}

async fn list_vendor_batches(
    State(state): State<SharedState>,
    Path(vendor_id): Path<String>,
    params: Result<Query<BatchPageParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let page = run_blocking("http.list_vendor_batches", move || {
        state
            .batch_api
            .list_batches_page(&vendor_id, params.after_seq, params.limit)
    })
    .await?;
    Ok(Json(page).into_response())
}

// ==========================================
// 评价与分析
// ==========================================

async fn submit_feedback(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<SubmitFeedbackRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let actor = actor_from(&headers);
    let receipt = run_blocking("http.submit_feedback", move || {
        state.feedback_api.submit_feedback(req, &actor)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

/// 分析快照响应体, 附带控制台读取的旧字段名
#[derive(Debug, Serialize)]
struct VendorAnalyticsBody {
    #[serde(flatten)]
    snapshot: AnalyticsSnapshot,
    calculated_durability_score: f64,
    total_parts_supplied: i64,
    total_failures_detected: i64,
}

impl From<AnalyticsSnapshot> for VendorAnalyticsBody {
    fn from(snapshot: AnalyticsSnapshot) -> Self {
        Self {
            calculated_durability_score: snapshot.durability_score,
            total_parts_supplied: snapshot.total_jobs,
            total_failures_detected: snapshot.failed_jobs,
            snapshot,
        }
    }
}

async fn vendor_analytics(
    State(state): State<SharedState>,
    Path(vendor_id): Path<String>,
) -> Result<Response, ApiError> {
    let snapshot = run_blocking("http.vendor_analytics", move || {
        state.analytics_api.get_analytics(&vendor_id)
    })
    .await?;
    Ok(Json(VendorAnalyticsBody::from(snapshot)).into_response())
}

async fn network_overview(
    State(state): State<SharedState>,
    params: Result<Query<OverviewParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let overview = run_blocking("http.network_overview", move || {
        state.analytics_api.get_network_overview(params.top)
    })
    .await?;
    Ok(Json(overview).into_response())
}

// ==========================================
// 审计与配置
// ==========================================

async fn action_logs(
    State(state): State<SharedState>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let logs = run_blocking("http.action_logs", move || {
        state.action_log_api.list_recent(params.limit)
    })
    .await?;
    Ok(Json(logs).into_response())
}

async fn list_configs(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let view = run_blocking("http.list_configs", move || state.config_api.list_configs()).await?;
    Ok(Json(view).into_response())
}

async fn update_config(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<ConfigValueRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let actor = actor_from(&headers);
    let item = run_blocking("http.update_config", move || {
        state.config_api.update_config(&key, &req.value, &actor)
    })
    .await?;
    Ok(Json(item).into_response())
}
