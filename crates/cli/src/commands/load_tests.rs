use super::*;

use clap::Parser;

use crate::commands::{Cli, Command};
use crate::summary::SummaryListener;

fn parse(extra: &[&str]) -> LoadArgs {
    let mut argv = vec![
        "dorisload",
        "load",
        "--url",
        "http://fe-host:8030",
        "--password",
        "secret",
        "--db",
        "shop",
        "--table",
        "orders",
    ];
    argv.extend_from_slice(extra);

    match Cli::try_parse_from(argv).expect("valid arguments").command {
        Command::Load(args) => args,
    }
}

#[test]
fn defaults_follow_runtime_constants() {
    let args = parse(&[]);

    assert_eq!(args.user, "root");
    assert_eq!(args.workers, DEFAULT_NUM_WORKERS);
    assert_eq!(args.max_records, DEFAULT_MAX_RECORDS);
    assert_eq!(args.max_bytes, DEFAULT_MAX_BYTES);
    assert_eq!(
        Duration::from_millis(args.flush_interval_ms),
        DEFAULT_FLUSH_INTERVAL
    );
    assert_eq!(args.format, FormatArg::Csv);
    assert!(args.retry_status.is_empty());
    assert!(args.inputs.is_empty());
}

#[test]
fn options_map_to_stream_load_headers() {
    let args = parse(&[
        "--format",
        "json",
        "--columns",
        "id,name",
        "--where",
        "id > 0",
        "--max-filter-ratio",
        "0.2",
        "--strict-mode",
    ]);

    let headers = args.load_options().to_headers();
    let get = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    assert_eq!(get("format"), Some("json"));
    assert_eq!(get("read_json_by_line"), Some("true"));
    assert_eq!(get("columns"), Some("id,name"));
    assert_eq!(get("where"), Some("id > 0"));
    assert_eq!(get("max_filter_ratio"), Some("0.2"));
    assert_eq!(get("strict_mode"), Some("true"));
    assert_eq!(get("partitions"), None);
}

#[test]
fn retry_status_and_inputs_parse() {
    let args = parse(&[
        "--retry-status",
        "429,503",
        "--label-prefix",
        "nightly",
        "a.csv",
        "-",
    ]);

    assert_eq!(args.retry_status, vec![429, 503]);
    assert_eq!(args.label_prefix.as_deref(), Some("nightly"));
    assert_eq!(args.inputs, vec![PathBuf::from("a.csv"), PathBuf::from("-")]);
}

#[test]
fn client_rejects_non_http_url() {
    let mut args = parse(&[]);
    args.url = "fe-host:8030".into();

    assert!(args.client().is_err());
}

#[test]
fn processor_targets_requested_table() {
    let args = parse(&["--workers", "3", "--flush-interval-ms", "0"]);
    let client = args.client().expect("client");

    let processor = args
        .processor(client, Arc::new(SummaryListener::default()))
        .build();

    assert_eq!(processor.db(), "shop");
    assert_eq!(processor.table(), "orders");

    // Nothing is added, so starting and closing never reaches the network.
    processor.start().expect("start");
    processor.close().expect("close");
}

#[test]
fn all_triggers_disabled_fails_to_start() {
    let args = parse(&[
        "--max-records",
        "0",
        "--max-bytes",
        "0",
        "--flush-interval-ms",
        "0",
    ]);
    let client = args.client().expect("client");

    let result = args
        .processor(client, Arc::new(SummaryListener::default()))
        .start();
    assert!(result.is_err());
}
