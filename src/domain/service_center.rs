// ==========================================
// 供应商耐久性评分系统 - 服务中心领域模型
// ==========================================
// 依据: 数据模型 - ServiceCenter
// 红线: center_id 不可复用于其他物理节点
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ServiceCenter - 服务中心
// ==========================================
// 用途: 服务产能池 (并发服务工位数)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCenter {
    pub center_id: String,         // 服务中心ID
    pub name: String,              // 名称
    pub company_name: String,      // 所属公司
    pub location: String,          // 位置
    pub phone: String,             // 电话
    pub capacity: i64,             // 并发服务工位数 (> 0)
    pub registered_at: NaiveDateTime,
    pub updated_at: NaiveDateTime, // 产能最近重申时间
}
