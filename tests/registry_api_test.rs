// ==========================================
// RegistryApi 集成测试
// ==========================================
// 测试范围:
// 1. 供应商登记: 初始指标, 重复登记, 空字段
// 2. 服务中心登记: 产能校验, 产能重申
// 3. 查询: 登记顺序, 不存在
// ==========================================


use test_helpers::*;
use vendor_durability::api::ApiError;

// ==========================================
// 供应商登记
// ==========================================

#[test]
fn test_register_vendor_初始指标() {
    let env = create_test_env().expect("无法创建测试环境");

    let vendor = env
        .state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .expect("登记失败");

    assert_eq!(vendor.vendor_id, "V-1");
    assert_eq!(vendor.metrics.total_jobs, 0);
    assert_eq!(vendor.metrics.failed_jobs, 0);
    assert_eq!(vendor.metrics.avg_response_time_secs, 0.0);
    assert!(vendor.reviews.is_empty());

    // 初始快照: 耐久分基线 100
    let snapshot = env.state.analytics_api.get_analytics("V-1").unwrap();
    assert_eq!(snapshot.durability_score, 100.0);
    assert_eq!(snapshot.batches_analyzed, 0);
}

#[test]
fn test_register_vendor_重复登记不改原数据() {
    let env = create_test_env().expect("无法创建测试环境");
    let api = &env.state.registry_api;

    api.register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();

    let err = api
        .register_vendor(vendor_request("V-1", "Impostor"), "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::DuplicateIdentity { ref id, .. } if id == "V-1"));
    assert_eq!(err.status_code(), 409);

    let stored = api.get_vendor("V-1").unwrap();
    assert_eq!(stored.name, "Acme");
    assert_eq!(api.list_vendors().unwrap().len(), 1);
}

#[test]
fn test_register_vendor_空ID() {
    let env = create_test_env().expect("无法创建测试环境");

    let err = env
        .state
        .registry_api
        .register_vendor(vendor_request("   ", "Acme"), "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(env.state.registry_api.list_vendors().unwrap().is_empty());
}

#[test]
fn test_list_vendors_登记顺序() {
    let env = create_test_env().expect("无法创建测试环境");
    let api = &env.state.registry_api;

    for id in ["V-3", "V-1", "V-2"] {
        api.register_vendor(vendor_request(id, id), "admin").unwrap();
    }

    let ids: Vec<String> = api
        .list_vendors()
        .unwrap()
        .into_iter()
        .map(|v| v.vendor_id)
        .collect();
    assert_eq!(ids, vec!["V-3", "V-1", "V-2"]);
}

#[test]
fn test_get_vendor_不存在() {
    let env = create_test_env().expect("无法创建测试环境");

    let err = env.state.registry_api.get_vendor("V-404").unwrap_err();
    assert_eq!(err, ApiError::not_found("Vendor", "V-404"));
    assert_eq!(err.status_code(), 404);
}

// ==========================================
// 服务中心
// ==========================================

#[test]
fn test_register_center_产能校验() {
    let env = create_test_env().expect("无法创建测试环境");
    let api = &env.state.registry_api;

    for capacity in [0, -3] {
        let err = api
            .register_center(center_request("C-1", capacity), "admin")
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::InvalidCapacity {
                center_id: "C-1".to_string(),
                capacity,
            }
        );
    }
    assert!(api.list_centers().unwrap().is_empty());

    let center = api
        .register_center(center_request("C-1", 4), "admin")
        .unwrap();
    assert_eq!(center.capacity, 4);
}

#[test]
fn test_register_center_重复登记() {
    let env = create_test_env().expect("无法创建测试环境");
    let api = &env.state.registry_api;

    api.register_center(center_request("C-1", 4), "admin")
        .unwrap();
    let err = api
        .register_center(center_request("C-1", 9), "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::DuplicateIdentity { .. }));
    assert_eq!(api.get_center("C-1").unwrap().capacity, 4);
}

#[test]
fn test_redeclare_capacity() {
    let env = create_test_env().expect("无法创建测试环境");
    let api = &env.state.registry_api;

    api.register_center(center_request("C-1", 4), "admin")
        .unwrap();

    let updated = api.redeclare_capacity("C-1", 10, "ops").unwrap();
    assert_eq!(updated.capacity, 10);
    assert_eq!(api.get_center("C-1").unwrap().capacity, 10);

    // 非法产能不覆盖原值
    let err = api.redeclare_capacity("C-1", 0, "ops").unwrap_err();
    assert!(matches!(err, ApiError::InvalidCapacity { .. }));
    assert_eq!(api.get_center("C-1").unwrap().capacity, 10);

    let err = api.redeclare_capacity("C-404", 5, "ops").unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn test_registration_写入操作日志() {
    let env = create_test_env().expect("无法创建测试环境");

    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "alice")
        .unwrap();
    env.state
        .registry_api
        .register_center(center_request("C-1", 2), "bob")
        .unwrap();

    let logs = env.state.action_log_api.list_for_target("V-1").unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action_type, "REGISTER_VENDOR");
    assert_eq!(logs[0].actor, "alice");

    // 被拒绝的重复登记不留日志
    let _ = env
        .state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "alice");
    assert_eq!(env.state.action_log_api.list_for_target("V-1").unwrap().len(), 1);
}
