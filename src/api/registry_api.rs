// ==========================================
// 供应商耐久性评分系统 - 身份登记 API
// ==========================================
// 职责: 供应商/服务中心登记、查询、产能重申
// 红线: 身份ID唯一且不可复用, 重复提交直接拒绝, 不合并
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{require_non_blank, validate_capacity};
use crate::api::log_rejection;
use crate::db::now_ts;
use crate::domain::action_log::ActionLog;
use crate::domain::service_center::ServiceCenter;
use crate::domain::types::ActionType;
use crate::domain::vendor::{Vendor, VendorMetrics};
use crate::repository::{ServiceCenterRepository, VendorRepository};

// ==========================================
// 请求 DTO
// ==========================================

/// 供应商登记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterVendorRequest {
    pub vendor_id: String,
    pub name: String,
    pub category: String,
    pub contact: String,
}

/// 服务中心登记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterCenterRequest {
    #[serde(alias = "centerId")]
    pub center_id: String,
    pub name: String,
    #[serde(default)]
    pub company_name: String,
    pub location: String,
    pub phone: String,
    pub capacity: i64,
}

// ==========================================
// RegistryApi - 身份登记 API
// ==========================================
pub struct RegistryApi {
    vendor_repo: Arc<VendorRepository>,
    center_repo: Arc<ServiceCenterRepository>,
}

impl RegistryApi {
    pub fn new(vendor_repo: Arc<VendorRepository>, center_repo: Arc<ServiceCenterRepository>) -> Self {
        Self {
            vendor_repo,
            center_repo,
        }
    }

    // ==========================================
    // 供应商
    // ==========================================

    /// 登记供应商
    ///
    /// 指标从零开始（耐久分基线 100），评价为空。
    ///
    /// # 返回
    /// - Ok(Vendor): 新登记的供应商
    /// - Err(DuplicateIdentity): vendor_id 已存在，原数据不变
    /// - Err(InvalidInput): 身份字段为空
    pub fn register_vendor(&self, req: RegisterVendorRequest, actor: &str) -> ApiResult<Vendor> {
        self.do_register_vendor(req, actor)
            .map_err(|e| log_rejection("register_vendor", e))
    }

    fn do_register_vendor(&self, req: RegisterVendorRequest, actor: &str) -> ApiResult<Vendor> {
        require_non_blank("vendor_id", &req.vendor_id)?;
        require_non_blank("name", &req.name)?;

        let vendor = Vendor {
            vendor_id: req.vendor_id.trim().to_string(),
            name: req.name.trim().to_string(),
            category: req.category.trim().to_string(),
            contact: req.contact.trim().to_string(),
            metrics: VendorMetrics::zero(),
            reviews: Vec::new(),
            registered_at: now_ts(),
        };

        let audit = ActionLog::new(ActionType::RegisterVendor, actor, &vendor.vendor_id)
            .with_payload(json!({
                "name": vendor.name,
                "category": vendor.category,
                "contact": vendor.contact,
            }))
            .with_detail(format!("登记供应商: {}", vendor.name));

        self.vendor_repo.insert(&vendor, &audit)?;

        info!(vendor_id = %vendor.vendor_id, actor, "供应商登记成功");
        Ok(vendor)
    }

    /// 查询供应商
    pub fn get_vendor(&self, vendor_id: &str) -> ApiResult<Vendor> {
        self.vendor_repo
            .find_by_id(vendor_id)?
            .ok_or_else(|| ApiError::not_found("Vendor", vendor_id))
    }

    /// 查询全部供应商（登记顺序）
    pub fn list_vendors(&self) -> ApiResult<Vec<Vendor>> {
        Ok(self.vendor_repo.find_all()?)
    }

    // ==========================================
    // 服务中心
    // ==========================================

    /// 登记服务中心
    ///
    /// # 返回
    /// - Err(DuplicateIdentity): center_id 已存在
    /// - Err(InvalidCapacity): capacity <= 0
    pub fn register_center(&self, req: RegisterCenterRequest, actor: &str) -> ApiResult<ServiceCenter> {
        self.do_register_center(req, actor)
            .map_err(|e| log_rejection("register_center", e))
    }

    fn do_register_center(&self, req: RegisterCenterRequest, actor: &str) -> ApiResult<ServiceCenter> {
        require_non_blank("center_id", &req.center_id)?;
        require_non_blank("name", &req.name)?;
        let center_id = req.center_id.trim().to_string();
        validate_capacity(&center_id, req.capacity)?;

        let now = now_ts();
        let center = ServiceCenter {
            center_id,
            name: req.name.trim().to_string(),
            company_name: req.company_name.trim().to_string(),
            location: req.location.trim().to_string(),
            phone: req.phone.trim().to_string(),
            capacity: req.capacity,
            registered_at: now,
            updated_at: now,
        };

        let audit = ActionLog::new(ActionType::RegisterCenter, actor, &center.center_id)
            .with_payload(json!({
                "name": center.name,
                "company_name": center.company_name,
                "location": center.location,
                "capacity": center.capacity,
            }))
            .with_detail(format!("登记服务中心: {} (产能 {})", center.name, center.capacity));

        self.center_repo.insert(&center, &audit)?;

        info!(center_id = %center.center_id, capacity = center.capacity, actor, "服务中心登记成功");
        Ok(center)
    }

    /// 重申服务中心产能
    ///
    /// 只更新 capacity 与 updated_at。
    pub fn redeclare_capacity(&self, center_id: &str, capacity: i64, actor: &str) -> ApiResult<ServiceCenter> {
        self.do_redeclare_capacity(center_id, capacity, actor)
            .map_err(|e| log_rejection("redeclare_capacity", e))
    }

    fn do_redeclare_capacity(&self, center_id: &str, capacity: i64, actor: &str) -> ApiResult<ServiceCenter> {
        require_non_blank("center_id", center_id)?;
        validate_capacity(center_id, capacity)?;

        let audit = ActionLog::new(ActionType::RedeclareCapacity, actor, center_id)
            .with_payload(json!({ "capacity": capacity }))
            .with_detail(format!("重申产能: {}", capacity));

        let center = self.center_repo.update_capacity(
            center_id,
            capacity,
            now_ts(),
            &audit,
        )?;

        info!(center_id, capacity, actor, "服务中心产能已重申");
        Ok(center)
    }

    /// 查询服务中心
    pub fn get_center(&self, center_id: &str) -> ApiResult<ServiceCenter> {
        self.center_repo
            .find_by_id(center_id)?
            .ok_or_else(|| ApiError::not_found("ServiceCenter", center_id))
    }

    /// 查询全部服务中心（登记顺序）
    pub fn list_centers(&self) -> ApiResult<Vec<ServiceCenter>> {
        Ok(self.center_repo.find_all()?)
    }
}
