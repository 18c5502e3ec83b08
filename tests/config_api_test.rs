// ==========================================
// ConfigApi / ActionLogApi 集成测试
// ==========================================
// 测试范围:
// 1. 配置查询: 默认生效值
// 2. 配置更新: 校验, 规范化, 持久化
// 3. 操作日志: 最新在前, 条数限制
// ==========================================


use test_helpers::*;
use vendor_durability::api::ApiError;
use vendor_durability::config::config_keys;
use vendor_durability::app::AppState;

// ==========================================
// 配置
// ==========================================

#[test]
fn test_list_configs_初始状态() {
    let env = create_test_env().expect("无法创建测试环境");

    let view = env.state.config_api.list_configs().expect("查询失败");
    assert!(view.stored.is_empty());
    assert_eq!(view.effective.len(), config_keys::ALL.len());
    assert_eq!(view.effective[config_keys::VERIFIED_THRESHOLD], "90");
    assert_eq!(view.effective[config_keys::TOP_FAILING_LIMIT], "5");
    assert_eq!(view.effective[config_keys::LEDGER_PAGE_SIZE], "50");
}

#[test]
fn test_update_config_规范化存储() {
    let env = create_test_env().expect("无法创建测试环境");

    let item = env
        .state
        .config_api
        .update_config(config_keys::VERIFIED_THRESHOLD, " 87.50 ", "admin")
        .expect("更新失败");
    assert_eq!(item.value, "87.5");

    let view = env.state.config_api.list_configs().unwrap();
    assert_eq!(view.stored.len(), 1);
    assert_eq!(view.effective[config_keys::VERIFIED_THRESHOLD], "87.5");

    let logs = env
        .state
        .action_log_api
        .list_for_target(config_keys::VERIFIED_THRESHOLD)
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action_type, "UPDATE_CONFIG");
}

#[test]
fn test_update_config_非法值() {
    let env = create_test_env().expect("无法创建测试环境");
    let api = &env.state.config_api;

    for (key, value) in [
        (config_keys::VERIFIED_THRESHOLD, "abc"),
        (config_keys::VERIFIED_THRESHOLD, "101"),
        (config_keys::TOP_FAILING_LIMIT, "0"),
        (config_keys::LEDGER_PAGE_SIZE, "501"),
        ("unknown/key", "1"),
    ] {
        let err = api.update_config(key, value, "admin").unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)), "{} = {}", key, value);
    }

    assert!(api.list_configs().unwrap().stored.is_empty());
}

#[test]
fn test_update_config_重启后保留() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .config_api
        .update_config(config_keys::TOP_FAILING_LIMIT, "7", "admin")
        .unwrap();

    let reopened = AppState::new(&env.db_path).expect("重新打开失败");
    let view = reopened.config_api.list_configs().unwrap();
    assert_eq!(view.effective[config_keys::TOP_FAILING_LIMIT], "7");
}

// ==========================================
// 操作日志
// ==========================================

#[test]
fn test_action_logs_最新在前() {
    let env = create_test_env().expect("无法创建测试环境");

    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "alice")
        .unwrap();
    env.state
        .batch_api
        .ingest_batch(single_part_batch("B-1", "V-1", 10, 0), "bob")
        .unwrap();
    env.state
        .feedback_api
        .submit_feedback(feedback_request("V-1", 5, "good", None), "carol")
        .unwrap();

    let logs = env.state.action_log_api.list_recent(None).unwrap();
    let types: Vec<&str> = logs.iter().map(|l| l.action_type.as_str()).collect();
    assert_eq!(types, vec!["SUBMIT_FEEDBACK", "INGEST_BATCH", "REGISTER_VENDOR"]);
    assert_eq!(logs[1].target_id, "B-1");
    assert_eq!(logs[1].actor, "bob");
    assert!(logs[1].payload_json.is_some());

    let limited = env.state.action_log_api.list_recent(Some(1)).unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].action_type, "SUBMIT_FEEDBACK");

    // 0 按 1 处理
    assert_eq!(env.state.action_log_api.list_recent(Some(0)).unwrap().len(), 1);
}
