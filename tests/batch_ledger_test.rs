// ==========================================
// BatchApi 集成测试
// ==========================================
// 测试范围:
// 1. 入账: 指标累加, 账本序号
// 2. 拒绝: 未知供应商, 清单/周期非法, 重复批次 (均不落账)
// 3. 查询: 分页游标, 惰性遍历可重启
// ==========================================


use chrono::NaiveDate;
use test_helpers::*;
use vendor_durability::api::ApiError;
use vendor_durability::domain::batch::{BatchPeriod, PartEntry};
use vendor_durability::VerificationTier;

// ==========================================
// 入账
// ==========================================

#[test]
fn test_ingest_batch_基本场景() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();

    let batch = env
        .state
        .batch_api
        .ingest_batch(single_part_batch("B-1", "V-1", 100, 5), "admin")
        .expect("入账失败");
    assert_eq!(batch.batch_id, "B-1");
    assert_eq!(batch.manifest.len(), 1);
    assert!(batch.ledger_seq > 0);

    let snapshot = env.state.analytics_api.get_analytics("V-1").unwrap();
    assert_eq!(snapshot.total_jobs, 100);
    assert_eq!(snapshot.failed_jobs, 5);
    assert_eq!(snapshot.durability_score, 95.0);
    assert_eq!(snapshot.success_rate, 95.0);
    assert_eq!(snapshot.verification_tier, VerificationTier::Verified);
    assert_eq!(snapshot.batches_analyzed, 1);
}

#[test]
fn test_ingest_batch_多行清单累加() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();

    env.state
        .batch_api
        .ingest_batch(
            batch_with_parts(
                "B-1",
                "V-1",
                vec![
                    PartEntry::new("BRK-1", "Brake pad", 60, 10),
                    PartEntry::new("FLT-2", "Oil filter", 40, 0),
                ],
            ),
            "admin",
        )
        .unwrap();
    env.state
        .batch_api
        .ingest_batch(single_part_batch("B-2", "V-1", 100, 20), "admin")
        .unwrap();

    let vendor = env.state.registry_api.get_vendor("V-1").unwrap();
    assert_eq!(vendor.metrics.total_jobs, 200);
    assert_eq!(vendor.metrics.failed_jobs, 30);

    let snapshot = env.state.analytics_api.get_analytics("V-1").unwrap();
    assert_eq!(snapshot.durability_score, 85.0);
    assert_eq!(snapshot.verification_tier, VerificationTier::UnderReview);
    assert_eq!(env.state.batch_api.ledger_length().unwrap(), 2);
}

// ==========================================
// 拒绝路径 (账本不变)
// ==========================================

#[test]
fn test_ingest_batch_未知供应商() {
    let env = create_test_env().expect("无法创建测试环境");

    let err = env
        .state
        .batch_api
        .ingest_batch(single_part_batch("B-1", "V-404", 10, 0), "admin")
        .unwrap_err();
    assert_eq!(err, ApiError::UnknownVendor("V-404".to_string()));
    assert_eq!(env.state.batch_api.ledger_length().unwrap(), 0);
    assert!(env.state.action_log_api.list_for_target("B-1").unwrap().is_empty());
}

#[test]
fn test_ingest_batch_故障数大于件数() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();

    let err = env
        .state
        .batch_api
        .ingest_batch(
            batch_with_parts(
                "B-1",
                "V-1",
                vec![
                    PartEntry::new("X", "Bolt", 10, 1),
                    PartEntry::new("Y", "Nut", 10, 11),
                ],
            ),
            "admin",
        )
        .unwrap_err();
    match err {
        ApiError::InvalidPart { index, field, .. } => {
            assert_eq!(index, 2);
            assert_eq!(field, "failures_logged");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(env.state.batch_api.ledger_length().unwrap(), 0);
    let vendor = env.state.registry_api.get_vendor("V-1").unwrap();
    assert_eq!(vendor.metrics.total_jobs, 0);
    assert!(matches!(
        env.state.batch_api.get_batch("B-1"),
        Err(ApiError::NotFound { .. })
    ));
}

#[test]
fn test_ingest_batch_清单非法() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();
    let api = &env.state.batch_api;

    let err = api
        .ingest_batch(batch_with_parts("B-1", "V-1", vec![]), "admin")
        .unwrap_err();
    assert_eq!(err, ApiError::EmptyManifest("B-1".to_string()));

    let err = api
        .ingest_batch(single_part_batch("B-1", "V-1", 0, 0), "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidPart { index: 1, .. }));

    let err = api
        .ingest_batch(single_part_batch("B-1", "V-1", 5, -1), "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidPart { index: 1, .. }));

    assert_eq!(api.ledger_length().unwrap(), 0);
}

#[test]
fn test_ingest_batch_周期非法() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();

    let mut batch = single_part_batch("B-1", "V-1", 10, 0);
    batch.period = BatchPeriod::new(
        "2026-03",
        NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
    );
    let err = env.state.batch_api.ingest_batch(batch, "admin").unwrap_err();
    assert!(matches!(err, ApiError::InvalidPeriod(_)));

    let mut batch = single_part_batch("B-1", "V-1", 10, 0);
    batch.period.month = "March".to_string();
    let err = env.state.batch_api.ingest_batch(batch, "admin").unwrap_err();
    assert!(matches!(err, ApiError::InvalidPeriod(_)));

    assert_eq!(env.state.batch_api.ledger_length().unwrap(), 0);
}

#[test]
fn test_ingest_batch_重复批次ID() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();
    let api = &env.state.batch_api;

    api.ingest_batch(single_part_batch("B-1", "V-1", 100, 5), "admin")
        .unwrap();
    let err = api
        .ingest_batch(single_part_batch("B-1", "V-1", 50, 50), "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::DuplicateIdentity { ref id, .. } if id == "B-1"));

    // 指标只计入第一次
    let vendor = env.state.registry_api.get_vendor("V-1").unwrap();
    assert_eq!(vendor.metrics.total_jobs, 100);
    assert_eq!(vendor.metrics.failed_jobs, 5);
    assert_eq!(api.ledger_length().unwrap(), 1);
}

#[test]
fn test_ingest_batch_累计件数溢出() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();
    let api = &env.state.batch_api;

    // 单个清单合计未溢出, 累加到供应商后溢出
    api.ingest_batch(single_part_batch("B-1", "V-1", i64::MAX - 10, 0), "admin")
        .expect("入账失败");
    let err = api
        .ingest_batch(single_part_batch("B-2", "V-1", 100, 1), "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref m) if m.contains("V-1")), "{:?}", err);

    assert_eq!(api.ledger_length().unwrap(), 1);
    assert!(api.get_batch("B-2").is_err());
    assert!(env.state.action_log_api.list_for_target("B-2").unwrap().is_empty());

    // 指标保持整数存储, 各读取路径正常
    let vendor = env.state.registry_api.get_vendor("V-1").unwrap();
    assert_eq!(vendor.metrics.total_jobs, i64::MAX - 10);
    assert_eq!(vendor.metrics.failed_jobs, 0);
    assert_eq!(env.state.registry_api.list_vendors().unwrap().len(), 1);
    let snapshot = env.state.analytics_api.get_analytics("V-1").unwrap();
    assert_eq!(snapshot.durability_score, 100.0);
    let overview = env.state.analytics_api.get_network_overview(None).unwrap();
    assert_eq!(overview.total_batches, 1);

    // 未溢出的小批次仍可入账
    api.ingest_batch(single_part_batch("B-3", "V-1", 10, 0), "admin")
        .expect("入账失败");
    let vendor = env.state.registry_api.get_vendor("V-1").unwrap();
    assert_eq!(vendor.metrics.total_jobs, i64::MAX);
}

// ==========================================
// 查询
// ==========================================

fn seed_batches(env: &TestEnv, vendor_id: &str, count: usize) {
    for i in 1..=count {
        env.state
            .batch_api
            .ingest_batch(
                single_part_batch(&format!("{}-B{:02}", vendor_id, i), vendor_id, 10, 1),
                "admin",
            )
            .unwrap();
    }
}

#[test]
fn test_list_batches_page_游标分页() {
    let env = create_test_env().expect("无法创建测试环境");
    for id in ["V-1", "V-2"] {
        env.state
            .registry_api
            .register_vendor(vendor_request(id, id), "admin")
            .unwrap();
    }
    seed_batches(&env, "V-1", 3);
    seed_batches(&env, "V-2", 2);
    env.state
        .batch_api
        .ingest_batch(single_part_batch("V-1-B04", "V-1", 10, 1), "admin")
        .unwrap();

    let api = &env.state.batch_api;
    let first = api.list_batches_page("V-1", None, Some(2)).unwrap();
    let first_ids: Vec<&str> = first.batches.iter().map(|b| b.batch_id.as_str()).collect();
    assert_eq!(first_ids, vec!["V-1-B01", "V-1-B02"]);
    let cursor = first.next_after_seq.expect("应有下一页");

    let second = api.list_batches_page("V-1", Some(cursor), Some(2)).unwrap();
    let second_ids: Vec<&str> = second.batches.iter().map(|b| b.batch_id.as_str()).collect();
    assert_eq!(second_ids, vec!["V-1-B03", "V-1-B04"]);

    let third = api
        .list_batches_page("V-1", second.next_after_seq, Some(2))
        .unwrap();
    assert!(third.batches.is_empty());
    assert_eq!(third.next_after_seq, None);

    // 不足一页时无游标
    let all = api.list_batches_page("V-2", None, None).unwrap();
    assert_eq!(all.batches.len(), 2);
    assert_eq!(all.next_after_seq, None);
}

#[test]
fn test_list_batches_page_供应商不存在() {
    let env = create_test_env().expect("无法创建测试环境");

    let err = env
        .state
        .batch_api
        .list_batches_page("V-404", None, None)
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn test_list_batches_for_vendor_惰性遍历可重启() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();
    // 小页大小, 迫使迭代器跨页读取
    env.state
        .config_api
        .update_config("ledger/page_size", "2", "admin")
        .unwrap();
    seed_batches(&env, "V-1", 5);

    let api = &env.state.batch_api;
    let first_pass: Vec<String> = api
        .list_batches_for_vendor("V-1")
        .unwrap()
        .map(|b| b.unwrap().batch_id)
        .collect();
    assert_eq!(
        first_pass,
        vec!["V-1-B01", "V-1-B02", "V-1-B03", "V-1-B04", "V-1-B05"]
    );

    // 部分消费后重新开始
    let taken: Vec<String> = api
        .list_batches_for_vendor("V-1")
        .unwrap()
        .take(3)
        .map(|b| b.unwrap().batch_id)
        .collect();
    assert_eq!(taken, vec!["V-1-B01", "V-1-B02", "V-1-B03"]);

    let second_pass: Vec<String> = api
        .list_batches_for_vendor("V-1")
        .unwrap()
        .map(|b| b.unwrap().batch_id)
        .collect();
    assert_eq!(first_pass, second_pass);
}

#[test]
fn test_get_batch_清单保持行序() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();

    let manifest = vec![
        PartEntry::new("Z", "Zip tie", 5, 0),
        PartEntry::new("A", "Anchor", 7, 2),
        PartEntry::new("M", "Mount", 9, 9),
    ];
    env.state
        .batch_api
        .ingest_batch(batch_with_parts("B-1", "V-1", manifest.clone()), "admin")
        .unwrap();

    let stored = env.state.batch_api.get_batch("B-1").unwrap();
    assert_eq!(stored.manifest, manifest);
    assert_eq!(stored.period, march_2026());
    assert_eq!(stored.total_failures(), 11);
}
