use crate::*;
use indoc::indoc;
use serde_json::json;
use tracing_test::traced_test;

fn kind_name(kind: &ParseErrorKind) -> &'static str {
    match kind {
        ParseErrorKind::MalformedMetadataLine => "MalformedMetadataLine",
        ParseErrorKind::InvalidIdentifier(_) => "InvalidIdentifier",
        ParseErrorKind::InvalidValue(_) => "InvalidValue",
        ParseErrorKind::DuplicateLabel(_) => "DuplicateLabel",
        ParseErrorKind::UnexpectedEndOfInput => "UnexpectedEndOfInput",
    }
}

macro_rules! exposition_test {
    ($test_name:ident$(, $attrib:ident)?) => {
        #[test]
        #[traced_test]
        $(#[$attrib])?
        fn $test_name() {
            let test_data = include_str!(concat!("../../parse-tests/", stringify!($test_name), "/metrics"));

            let test_meta = include_str!(concat!("../../parse-tests/", stringify!($test_name), "/test.json"));
            let test_meta: serde_json::Value = serde_json::from_str(test_meta).expect("invalid json");
            let should_parse = test_meta["shouldParse"] == serde_json::Value::Bool(true);

            let result = parse_str(test_data);

            if !should_parse {
                let err = result.expect_err(stringify!($test_name));
                assert_eq!(test_meta["error"]["kind"], kind_name(&err.kind), "{}", err);
                assert_eq!(test_meta["error"]["line"], err.line, "{}", err);
                assert_eq!(Some(err.text.as_str()), test_data.lines().nth(err.line - 1).map(str::trim));
            } else {
                let normalized = result.expect("couldn't parse exposition");
                info!(got=%serde_json::to_string_pretty(&normalized).expect("couldn't serialize json"));
                assert_eq!(test_meta["normalized"], serde_json::to_value(&normalized).unwrap());
            }
        }
    }
}

exposition_test!(bad_duplicate_label);
exposition_test!(bad_help_without_name);
exposition_test!(bad_label_name);
exposition_test!(bad_lowercase_inf);
exposition_test!(bad_metric_name);
exposition_test!(bad_metric_name_dash);
exposition_test!(bad_missing_comma);
exposition_test!(bad_missing_equals);
exposition_test!(bad_missing_value);
exposition_test!(bad_timestamp);
exposition_test!(bad_trailing_backslash);
exposition_test!(bad_trailing_text);
exposition_test!(bad_type_invalid_name);
exposition_test!(bad_type_without_name);
exposition_test!(bad_unclosed_labels);

// A quoted label value that never closes must not be silently truncated
exposition_test!(bad_unterminated_label_value);

exposition_test!(bad_value);

exposition_test!(comments_and_blank_lines);
exposition_test!(crlf_line_endings);
exposition_test!(empty);

// An explicitly declared gauge called "foo_sum" is its own family even when a summary "foo"
// exists.
exposition_test!(gauge_named_like_sum);

exposition_test!(help_only_family);
exposition_test!(label_escaping);
exposition_test!(labelled_summary);
exposition_test!(mixed_order);
exposition_test!(nan_and_infinities);
exposition_test!(no_metadata);
exposition_test!(simple_counter);
exposition_test!(simple_gauge);
exposition_test!(simple_histogram);
exposition_test!(simple_summary);
exposition_test!(summary_without_sum);
exposition_test!(timestamps);
exposition_test!(type_after_samples);
exposition_test!(unknown_type);
exposition_test!(untyped_sum_suffix);

#[test]
#[traced_test]
fn classifies_lines() {
    let data = indoc! {r#"
        # HELP foo Some help.
        # a comment

        # TYPE foo nonsense
          foo{a="b"} 1
    "#};

    let tokens: Vec<_> = lexer::exposition(data)
        .collect::<std::result::Result<_, _>>()
        .expect("couldn't classify lines");

    assert_eq!(
        tokens,
        vec![
            (
                1,
                lexer::MetricToken::Descriptor(lexer::MetricDescriptor::Help {
                    metric_name: "foo",
                    help_text: "Some help.".into(),
                })
            ),
            (
                4,
                lexer::MetricToken::Descriptor(lexer::MetricDescriptor::Type {
                    metric_name: "foo",
                    metric_type: MetricType::Untyped,
                })
            ),
            (5, lexer::MetricToken::Sample(r#"foo{a="b"} 1"#)),
        ]
    );
}

#[test]
#[traced_test]
fn help_text_is_unescaped() {
    let families = parse_families(r"# HELP foo Line one\nC:\\temp").expect("couldn't parse");

    assert_eq!(families.len(), 1);
    assert_eq!(families[0].help.as_deref(), Some("Line one\nC:\\temp"));
    assert!(families[0].samples.is_empty());
}

#[test]
#[traced_test]
fn parses_sample_line() {
    let sample = Sample::parse(r#"http_requests{method="post",path="/a\"b\\c\n"} 1027 1395066363000"#, 7)
        .expect("couldn't parse sample");

    assert_eq!(sample.name, "http_requests");
    assert_eq!(sample.labels.len(), 2);
    assert_eq!(sample.labels["method"], "post");
    assert_eq!(sample.labels["path"], "/a\"b\\c\n");
    assert_eq!(sample.number, 1027.);
    assert_eq!(sample.timestamp, Some(1395066363000));
    assert_eq!(
        sample.to_string(),
        r#"http_requests{method="post",path="/a\"b\\c\n"} 1027 1395066363000"#
    );
}

#[test]
#[traced_test]
fn parses_special_values() {
    let nan = Sample::parse("foo NaN", 1).expect("NaN");
    assert!(nan.number.is_nan());
    assert_eq!(Sample::parse("foo +Inf", 1).expect("+Inf").number, f64::INFINITY);
    assert_eq!(Sample::parse("foo -Inf", 1).expect("-Inf").number, f64::NEG_INFINITY);
    assert_eq!(Sample::parse("foo 2.5e-3", 1).expect("exp").number, 0.0025);
    assert_eq!(Sample::parse("foo{} .5", 1).expect("empty labels").number, 0.5);

    for bad in ["foo Inf", "foo nan", "foo Infinity", "foo 0x10"] {
        let err = Sample::parse(bad, 3).expect_err(bad);
        assert!(matches!(err.kind, ParseErrorKind::InvalidValue(_)), "{}", err);
    }
}

#[test]
#[traced_test]
fn sample_errors_name_the_token() {
    let err = Sample::parse(r#"foo{a="1",b="2",a="3"} 1"#, 12).expect_err("duplicate");
    assert_eq!(
        err,
        ParseError::new(
            ParseErrorKind::DuplicateLabel("a".into()),
            12,
            r#"foo{a="1",b="2",a="3"} 1"#
        )
    );

    let err = Sample::parse("foo.bar 1", 2).expect_err("bad name");
    assert_eq!(err.kind, ParseErrorKind::InvalidIdentifier("foo.bar".into()));
    assert_eq!(err.to_string(), "line 2: invalid identifier «foo.bar»: foo.bar 1");

    let err = Sample::parse("foo 1 later", 2).expect_err("bad timestamp");
    assert_eq!(err.kind, ParseErrorKind::InvalidValue("later".into()));
}

#[test]
#[traced_test]
fn groups_composite_families() {
    let data = indoc! {r#"
        # HELP rpc_seconds RPC latency.
        # TYPE rpc_seconds histogram
        rpc_seconds_bucket{le="1"} 2
        rpc_seconds_bucket{le="+Inf"} 3
        rpc_seconds_sum 1.5
        rpc_seconds_count 3
        # TYPE queue summary
        queue{quantile="0.99"} 12
        queue_sum 40
        queue_count 4
        queue_created 1
    "#};

    let families = parse_families(data).expect("couldn't parse");
    info!(families=%serde_json::to_string_pretty(&families).expect("couldn't serialize json"));

    let summary: Vec<_> = families
        .iter()
        .map(|family| (family.name, family.metric_type, family.samples.len()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("rpc_seconds", MetricType::Histogram, 4),
            ("queue", MetricType::Summary, 3),
            ("queue_created", MetricType::Untyped, 1),
        ]
    );
    assert_eq!(families[0].help.as_deref(), Some("RPC latency."));
    assert_eq!(families[0].samples[2].name, "rpc_seconds_sum");
}

#[test]
#[traced_test]
fn metadata_overwrites() {
    let data = indoc! {r#"
        # HELP foo first
        # TYPE foo counter
        # HELP foo second
        # TYPE foo gauge
        foo 1
    "#};

    let families = parse_families(data).expect("couldn't parse");

    assert_eq!(families.len(), 1);
    assert_eq!(families[0].metric_type, MetricType::Gauge);
    assert_eq!(families[0].help.as_deref(), Some("second"));
}

#[test]
#[traced_test]
fn reparsing_is_deterministic() {
    let data = indoc! {r#"
        # TYPE z gauge
        z{b="2",a="1"} 3
        # TYPE y summary
        y_sum 1
        x 2
        z{a="1",b="3"} 4
    "#};

    let first = serde_json::to_string(&parse_str(data).expect("first parse")).unwrap();
    let second = serde_json::to_string(&parse_str(data).expect("second parse")).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first,
        r#"[{"name":"z","value":3},{"name":"z","value":4},{"name":"y","value":1},{"name":"x","value":2}]"#
    );
}

#[test]
#[traced_test]
fn parses_from_reader() {
    let data = "# TYPE req_total counter\nreq_total 42\n";

    let normalized = parse(data.as_bytes()).expect("couldn't parse");

    assert_eq!(
        serde_json::to_value(&normalized).unwrap(),
        json!([{"name": "req_total", "value": 42}])
    );
}

#[test]
#[traced_test]
fn reader_errors() {
    let err = parse(&b"foo 1\n\xff\xfe 2\n"[..]).expect_err("invalid utf-8");
    assert!(matches!(err, Error::Io(_)), "{}", err);

    let err = parse("foo 1\nfoo{a=\"b} 1\n".as_bytes()).expect_err("unterminated");
    match err {
        Error::Parse(err) => {
            assert_eq!(err.kind, ParseErrorKind::UnexpectedEndOfInput);
            assert_eq!(err.line, 2);
        }
        err => panic!("unexpected error {}", err),
    }
}

#[test]
fn absent_value_is_omitted() {
    let metrics = vec![
        NormalizedMetric {
            name: "present".into(),
            value: Some(0.25),
        },
        NormalizedMetric {
            name: "absent".into(),
            value: None,
        },
    ];

    assert_eq!(
        serde_json::to_string(&metrics).unwrap(),
        r#"[{"name":"present","value":0.25},{"name":"absent"}]"#
    );
}
