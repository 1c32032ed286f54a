use super::*;

const SUCCESS_BODY: &str = r#"{
    "TxnId": 1003,
    "Label": "orders_0_1700000000000_1",
    "Status": "Success",
    "ExistingJobStatus": "",
    "Message": "OK",
    "NumberTotalRows": 1000000,
    "NumberLoadedRows": 999990,
    "NumberFilteredRows": 10,
    "NumberUnselectedRows": 0,
    "LoadBytes": 40888898,
    "LoadTimeMs": 2144,
    "BeginTxnTimeMs": 1,
    "ErrorURL": "http://192.168.1.1:8042/api/_load_error_log?file=__shard_0/error_log"
}"#;

#[test]
fn decodes_doris_field_names() {
    let resp: LoadResponse = serde_json::from_str(SUCCESS_BODY).expect("decode");

    assert_eq!(resp.txn_id, 1003);
    assert_eq!(resp.label, "orders_0_1700000000000_1");
    assert_eq!(resp.number_total_rows, 1_000_000);
    assert_eq!(resp.number_loaded_rows, 999_990);
    assert_eq!(resp.number_filtered_rows, 10);
    assert_eq!(resp.load_bytes, 40_888_898);
    assert_eq!(resp.load_time_ms, 2144);
    assert!(resp.is_success());
}

#[test]
fn missing_fields_default() {
    let resp: LoadResponse =
        serde_json::from_str(r#"{"Status": "Fail", "Message": "too many filtered rows"}"#)
            .expect("decode");

    assert_eq!(resp.txn_id, 0);
    assert_eq!(resp.number_loaded_rows, 0);
    assert!(resp.error_url.is_empty());
}

#[test]
fn success_statuses() {
    let cases: &[(&str, &str, bool)] = &[
        ("Success", "", true),
        ("Publish Timeout", "", true),
        ("Label Already Exists", "FINISHED", true),
        ("Label Already Exists", "RUNNING", false),
        ("Fail", "", false),
        ("", "", false),
    ];

    for (status, existing, expected) in cases {
        let resp = LoadResponse {
            status: status.to_string(),
            existing_job_status: existing.to_string(),
            ..Default::default()
        };
        assert_eq!(
            resp.is_success(),
            *expected,
            "status {status:?} existing {existing:?}"
        );
    }
}

#[test]
fn rejected_response_becomes_error() {
    let resp = LoadResponse {
        status: "Fail".into(),
        message: "too many filtered rows".into(),
        error_url: "http://be:8040/api/_load_error_log?file=x".into(),
        ..Default::default()
    };

    match resp.into_result() {
        Err(ClientError::Rejected {
            status,
            message,
            error_url,
        }) => {
            assert_eq!(status, "Fail");
            assert_eq!(message, "too many filtered rows");
            assert_eq!(
                error_url.as_deref(),
                Some("http://be:8040/api/_load_error_log?file=x")
            );
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn rejected_without_error_url() {
    let resp = LoadResponse {
        status: "Fail".into(),
        ..Default::default()
    };

    match resp.into_result() {
        Err(ClientError::Rejected { error_url, .. }) => assert_eq!(error_url, None),
        other => panic!("expected rejection, got {other:?}"),
    }
}
