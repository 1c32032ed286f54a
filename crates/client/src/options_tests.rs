use super::*;

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[test]
fn default_options_send_no_headers() {
    assert!(LoadOptions::new().to_headers().is_empty());
}

#[test]
fn options_map_to_stream_load_headers() {
    let headers = LoadOptions::new()
        .label("orders_0_1700000000000_1")
        .max_filter_ratio(0.2)
        .where_clause("k1 > 10")
        .partitions("p1, p2")
        .columns("k1, k2, v1")
        .column_separator(",")
        .exec_mem_limit(2 << 30)
        .strict_mode(true)
        .to_headers();

    let cases: &[(&str, &str)] = &[
        ("label", "orders_0_1700000000000_1"),
        ("max_filter_ratio", "0.2"),
        ("where", "k1 > 10"),
        ("partitions", "p1, p2"),
        ("columns", "k1, k2, v1"),
        ("column_separator", ","),
        ("exec_mem_limit", "2147483648"),
        ("strict_mode", "true"),
    ];

    for (name, expected) in cases {
        assert_eq!(
            header(&headers, name),
            Some(*expected),
            "header {name} in {headers:?}"
        );
    }
}

#[test]
fn json_format_reads_one_object_per_line() {
    let headers = LoadOptions::new().format(Format::Json).to_headers();
    assert_eq!(header(&headers, "format"), Some("json"));
    assert_eq!(header(&headers, "read_json_by_line"), Some("true"));

    let headers = LoadOptions::new().format(Format::Csv).to_headers();
    assert_eq!(header(&headers, "format"), Some("csv"));
    assert_eq!(header(&headers, "read_json_by_line"), None);
}

#[test]
fn max_filter_ratio_is_clamped() {
    let headers = LoadOptions::new().max_filter_ratio(3.0).to_headers();
    assert_eq!(header(&headers, "max_filter_ratio"), Some("1"));

    let headers = LoadOptions::new().max_filter_ratio(-1.0).to_headers();
    assert_eq!(header(&headers, "max_filter_ratio"), Some("0"));
}

#[test]
fn custom_headers_come_last() {
    let headers = LoadOptions::new()
        .header("timezone", "Asia/Shanghai")
        .label("l1")
        .to_headers();

    assert_eq!(
        headers,
        vec![
            ("label".to_string(), "l1".to_string()),
            ("timezone".to_string(), "Asia/Shanghai".to_string()),
        ]
    );
}

#[test]
fn relabelled_clone_keeps_other_options() {
    let base = LoadOptions::new().columns("a, b");
    let labelled = base.clone().label("batch-7");

    assert_eq!(base.get_label(), None);
    assert_eq!(labelled.get_label(), Some("batch-7"));
    assert_eq!(header(&labelled.to_headers(), "columns"), Some("a, b"));
}
