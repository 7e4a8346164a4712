// ==========================================
// TariffAdminApi 集成测试
// ==========================================
// 测试目标: 整表替换的回滚不变量、部分成功、数值转换回读、错误截断、同公司并发
// ==========================================

mod test_helpers;

use courier_rate_engine::api::{ApiError, SlabPriceRequest};
use courier_rate_engine::config::{config_keys, ConfigScope};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use test_helpers::{create_test_state, seed_company, slab_row};

const FRANCHISE: i64 = 1;
const COMPANY: i64 = 5;

fn good_rows() -> Vec<Value> {
    vec![
        slab_row("Metro", "Slab 3", json!({"rate_1": 100, "rate_2": 150, "rate_3": 60})),
        slab_row("Zonal", "Slab 2", json!({"rate_1": 80, "rate_2": 30})),
    ]
}

fn row_names(state: &courier_rate_engine::app::AppState, company: i64) -> Vec<String> {
    state
        .rate_admin_api
        .list_slab_tariffs(FRANCHISE, company)
        .unwrap()
        .into_iter()
        .map(|t| t.row_name)
        .collect()
}

#[tokio::test]
async fn test_all_invalid_payload_keeps_existing_rates() {
    let (_tmp, state) = create_test_state();
    let api = &state.tariff_admin_api;
    api.replace_all(FRANCHISE, COMPANY, &good_rows()).await.unwrap();

    let bad = vec![
        slab_row("Metro", "Slab 7", json!({"rate_1": 1})),
        slab_row("Zonal", "Slab 2", json!([10, 20])),
        json!({"courier_type": "Express", "slab_type": "Slab 2", "rates": {"1": 1}}),
    ];
    let err = api.replace_all(FRANCHISE, COMPANY, &bad).await.unwrap_err();

    assert_eq!(err.status_code(), 400);
    let body = err.to_body();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No valid rates to insert");
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(3));

    assert_eq!(row_names(&state, COMPANY), vec!["Metro", "Zonal"]);
}

#[tokio::test]
async fn test_empty_payload_is_rejected_without_deleting() {
    let (_tmp, state) = create_test_state();
    let api = &state.tariff_admin_api;
    api.replace_all(FRANCHISE, COMPANY, &good_rows()).await.unwrap();

    let err = api.replace_all(FRANCHISE, COMPANY, &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::NoValidRates { ref errors } if errors.is_empty()));
    assert_eq!(row_names(&state, COMPANY).len(), 2);
}

#[tokio::test]
async fn test_mixed_payload_commits_valid_rows() {
    let (_tmp, state) = create_test_state();
    let api = &state.tariff_admin_api;
    api.replace_all(FRANCHISE, COMPANY, &good_rows()).await.unwrap();

    let mixed = vec![
        slab_row("Regional", "Slab 4", json!({"1": 40, "2": 60, "3": 90, "4": 35})),
        slab_row("Broken", "Slab 2", json!({"rate_1": "abc"})),
        slab_row("Local", "Slab 2", json!({"rate_1": 20, "rate_2": 5})),
    ];
    let resp = api.replace_all(FRANCHISE, COMPANY, &mixed).await.unwrap();

    assert_eq!(resp.inserted, 2);
    assert_eq!(resp.errors.len(), 1);
    assert!(resp.errors[0].starts_with("Row 2: "), "{}", resp.errors[0]);
    assert_eq!(row_names(&state, COMPANY), vec!["Regional", "Local"]);
}

#[tokio::test]
async fn test_numeric_strings_round_trip_as_numbers() {
    let (_tmp, state) = create_test_state();
    seed_company(&state, FRANCHISE, COMPANY, dec!(0), dec!(0));

    let rows = vec![
        slab_row("Single", "Slab 2", json!({"rate_1": "50"})),
        slab_row("Pair", "Slab 2", json!({"rate_1": "50", "rate_2": 20.5})),
    ];
    let resp = state
        .tariff_admin_api
        .replace_all(FRANCHISE, COMPANY, &rows)
        .await
        .unwrap();
    assert_eq!(resp.inserted, 2);
    assert!(resp.errors.is_empty());

    let stored = state.rate_admin_api.list_slab_tariffs(FRANCHISE, COMPANY).unwrap();
    let as_json = serde_json::to_value(&stored).unwrap();
    assert_eq!(as_json[0]["rates"], json!({"rate_1": 50}));
    assert_eq!(as_json[0]["slab_type"], "Slab 2");
    assert_eq!(as_json[1]["rates"], json!({"rate_1": 50, "rate_2": 20.5}));

    // 只填 1 档的行按第 1 档兜底计费
    let resp = state
        .pricing_api
        .price_slab(
            FRANCHISE,
            &SlabPriceRequest {
                company_id: COMPANY,
                courier_type: "Express".to_string(),
                row_name: "Single".to_string(),
                weight: dec!(7),
                sub_type: None,
            },
        )
        .unwrap();
    assert_eq!(resp.base_rate, dec!(50));
}

#[tokio::test]
async fn test_error_list_is_capped() {
    let (_tmp, state) = create_test_state();
    let mut rows: Vec<Value> = (0..15)
        .map(|i| slab_row(&format!("Bad{}", i), "Slab 9", json!({"1": 1})))
        .collect();
    rows.push(slab_row("Good", "Slab 2", json!({"1": 10, "2": 5})));

    let resp = state
        .tariff_admin_api
        .replace_all(FRANCHISE, COMPANY, &rows)
        .await
        .unwrap();
    assert_eq!(resp.inserted, 1);
    assert_eq!(resp.errors.len(), 10);

    state
        .config_manager
        .set_value(
            &ConfigScope::Franchise { franchise_id: FRANCHISE },
            config_keys::BULK_REPLACE_ERROR_CAP,
            "3",
        )
        .unwrap();
    let err = state
        .tariff_admin_api
        .replace_all(FRANCHISE, COMPANY, &rows[..15])
        .await
        .unwrap_err();
    match err {
        ApiError::NoValidRates { errors } => assert_eq!(errors.len(), 3),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicate_key_in_payload_is_row_error() {
    let (_tmp, state) = create_test_state();
    let rows = vec![
        slab_row("Metro", "Slab 2", json!({"1": 10, "2": 5})),
        slab_row("Metro", "Slab 2", json!({"1": 12, "2": 6})),
    ];
    let resp = state
        .tariff_admin_api
        .replace_all(FRANCHISE, COMPANY, &rows)
        .await
        .unwrap();
    assert_eq!(resp.inserted, 1);
    assert_eq!(resp.errors.len(), 1);
    assert!(resp.errors[0].contains("duplicate of row 1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_replaces_of_same_company_serialize() {
    let (_tmp, state) = create_test_state();
    let api = Arc::clone(&state.tariff_admin_api);

    let set_a: Vec<Value> = (0..3)
        .map(|i| slab_row(&format!("A{}", i), "Slab 2", json!({"1": 10, "2": 5})))
        .collect();
    let set_b: Vec<Value> = (0..5)
        .map(|i| slab_row(&format!("B{}", i), "Slab 2", json!({"1": 20, "2": 8})))
        .collect();

    let mut handles = Vec::new();
    for round in 0..6 {
        let api = Arc::clone(&api);
        let rows = if round % 2 == 0 { set_a.clone() } else { set_b.clone() };
        handles.push(tokio::spawn(async move {
            api.replace_all(FRANCHISE, COMPANY, &rows).await
        }));
    }
    // 另一公司并行替换互不影响
    let other = {
        let api = Arc::clone(&api);
        let rows = set_a.clone();
        tokio::spawn(async move { api.replace_all(FRANCHISE, COMPANY + 1, &rows).await })
    };

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    other.await.unwrap().unwrap();

    let names = row_names(&state, COMPANY);
    let all_a = names.len() == 3 && names.iter().all(|n| n.starts_with('A'));
    let all_b = names.len() == 5 && names.iter().all(|n| n.starts_with('B'));
    assert!(all_a || all_b, "interleaved rate set: {:?}", names);
    assert_eq!(row_names(&state, COMPANY + 1).len(), 3);
}

#[tokio::test]
async fn test_rate_keys_read_back_as_written() {
    let (_tmp, state) = create_test_state();
    let rows = vec![
        slab_row("Numeric", "Slab 2", json!({"1": "50"})),
        slab_row("Mixed", "Slab 3", json!({"slab_1": 100, "rate2": 150, "3": 60})),
        slab_row("Canonical", "Slab 2", json!({"rate_1": 80, "rate_2": 30})),
    ];
    state
        .tariff_admin_api
        .replace_all(FRANCHISE, COMPANY, &rows)
        .await
        .unwrap();

    let stored = state.rate_admin_api.list_slab_tariffs(FRANCHISE, COMPANY).unwrap();
    let as_json = serde_json::to_value(&stored).unwrap();
    assert_eq!(as_json[0]["rates"], json!({"1": 50}));
    assert_eq!(as_json[1]["rates"], json!({"slab_1": 100, "rate2": 150, "3": 60}));
    assert_eq!(as_json[2]["rates"], json!({"rate_1": 80, "rate_2": 30}));
}
