// ==========================================
// 并发控制测试
// ==========================================
// 测试范围:
// 1. 同一 vendor_id 并发登记, 恰好一个成功
// 2. 并发入账, 指标累加不丢失
// 3. 并发读写, 快照始终自洽
// ==========================================


use std::sync::{Arc, Barrier};
use std::thread;

use test_helpers::*;
use vendor_durability::api::ApiError;

const THREADS: usize = 8;

#[test]
fn test_concurrent_register_同ID仅一个成功() {
    let env = create_test_env().expect("无法创建测试环境");
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let state = env.state.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                state
                    .registry_api
                    .register_vendor(vendor_request("V-1", &format!("Acme #{}", i)), "worker")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result,
            Err(ApiError::DuplicateIdentity { .. })
        ));
    }

    let vendors = env.state.registry_api.list_vendors().unwrap();
    assert_eq!(vendors.len(), 1);
    assert_eq!(env.state.action_log_api.list_for_target("V-1").unwrap().len(), 1);
}

#[test]
fn test_concurrent_ingest_指标不丢失() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let state = env.state.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                state
                    .batch_api
                    .ingest_batch(single_part_batch(&format!("B-{}", i), "V-1", 10, 1), "worker")
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().expect("入账失败");
    }

    let vendor = env.state.registry_api.get_vendor("V-1").unwrap();
    assert_eq!(vendor.metrics.total_jobs, 10 * THREADS as i64);
    assert_eq!(vendor.metrics.failed_jobs, THREADS as i64);

    let snapshot = env.state.analytics_api.get_analytics("V-1").unwrap();
    assert_eq!(snapshot.batches_analyzed, THREADS as i64);
    assert_eq!(snapshot.durability_score, 90.0);
}

#[test]
fn test_concurrent_read_write_快照自洽() {
    let env = create_test_env().expect("无法创建测试环境");
    env.state
        .registry_api
        .register_vendor(vendor_request("V-1", "Acme"), "admin")
        .unwrap();

    let writer_state = env.state.clone();
    let writer = thread::spawn(move || {
        for i in 0..20 {
            writer_state
                .batch_api
                .ingest_batch(single_part_batch(&format!("B-{}", i), "V-1", 5, 1), "writer")
                .unwrap();
        }
    });

    let reader_state = env.state.clone();
    let reader = thread::spawn(move || {
        for _ in 0..20 {
            let snapshot = reader_state.analytics_api.get_analytics("V-1").unwrap();
            // 每批 5 件 1 故障: 指标与批次数必须来自同一时刻
            assert_eq!(snapshot.total_jobs, snapshot.batches_analyzed * 5);
            assert_eq!(snapshot.failed_jobs, snapshot.batches_analyzed);
        }
    });

    writer.join().unwrap();
    reader.join().unwrap();

    assert_eq!(env.state.batch_api.ledger_length().unwrap(), 20);
}
