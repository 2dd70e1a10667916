//! Text rendering of real logs.

use braid_core::prelude::*;
use std::path::PathBuf;

braid_core::template! {
    struct FrameTime("frame {} took {} ms", category = 2);
    struct Ready("ready", category = 1);
    struct Setup("setup", category = 0);
}

#[test]
fn renders_one_file_per_stream_with_indentation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");

    let log: Log = Log::create(&path, LogConfig::default()).unwrap();
    let s0 = log.create_stream();
    let s1 = log.create_stream();
    {
        let _setup = s0.named_region::<Setup>();
        s0.message::<Ready, _>(());
        {
            let _frame = s0.region();
            s0.message::<FrameTime, _>((1u32, 16u64));
        }
    }
    s1.message::<Ready, _>(());
    log.close().unwrap();

    let written = Formatter::new().format(&path).unwrap();
    assert_eq!(
        written,
        vec![
            dir.path().join("run_0.txt"),
            dir.path().join("run_1.txt")
        ]
    );

    let text0 = std::fs::read_to_string(&written[0]).unwrap();
    let expected = "\
-- REGION START: setup --
  1 | ready
  -- REGION START: ANONYMOUS --
    2 | frame 1 took 16 ms
  -- REGION END: ANONYMOUS --
-- REGION END: setup --
";
    assert_eq!(text0, expected);

    let text1 = std::fs::read_to_string(&written[1]).unwrap();
    assert_eq!(text1, "1 | ready\n");
}

#[test]
fn ordered_logs_render_padded_indices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");

    let log: OrderedLog = OrderedLog::create(&path, LogConfig::default()).unwrap();
    let stream = log.create_stream();
    stream.message::<Ready, _>(());
    stream.message::<FrameTime, _>((2u32, 33u64));
    log.close().unwrap();

    let written = Formatter::new().format(&path).unwrap();
    let text = std::fs::read_to_string(&written[0]).unwrap();
    assert_eq!(
        text,
        "00000000 | 1 | ready\n00000001 | 2 | frame 2 took 33 ms\n"
    );
}

#[test]
fn formatting_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");

    let log: Log = Log::create(&path, LogConfig::default()).unwrap();
    let stream = log.create_stream();
    for i in 0..20u32 {
        stream.message::<FrameTime, _>((i, u64::from(i) * 2));
    }
    log.close().unwrap();

    let formatter = Formatter::new();
    let first = formatter.format(&path).unwrap();
    let first_text = std::fs::read_to_string(&first[0]).unwrap();
    let second = formatter.format(&path).unwrap();
    let second_text = std::fs::read_to_string(&second[0]).unwrap();
    assert_eq!(first_text, second_text);
}

#[test]
fn custom_callbacks_shape_the_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");

    let log: Log = Log::create(&path, LogConfig::default()).unwrap();
    let stream = log.create_stream();
    {
        let _r = stream.region();
        stream.message::<Ready, _>(());
    }
    log.close().unwrap();

    let out_dir = dir.path().to_owned();
    let formatter = Formatter::new()
        .with_filename_formatter(move |_, stream| {
            out_dir.join(PathBuf::from(format!("custom_{stream}.txt")))
        })
        .with_category_formatter(|out, category| write!(out, "[cat {category}] "))
        .with_anonymous_region_formatter(|out, start| {
            write!(out, "{}", if start { ">>>" } else { "<<<" })
        });

    let written = formatter.format(&path).unwrap();
    assert_eq!(written, vec![dir.path().join("custom_0.txt")]);

    let text = std::fs::read_to_string(&written[0]).unwrap();
    assert_eq!(text, ">>>\n  [cat 1] ready\n<<<\n");
}

#[test]
fn source_info_renders_its_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");

    let log: Log = Log::create(&path, LogConfig::default()).unwrap();
    let stream = log.create_stream();
    stream.source_info();
    log.close().unwrap();

    let written = Formatter::new().format(&path).unwrap();
    let text = std::fs::read_to_string(&written[0]).unwrap();
    assert!(text.contains("formatter.rs"));
    assert!(text.starts_with("0 | "));
}

#[test]
fn missing_fmt_file_is_an_open_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.log");
    std::fs::write(&path, b"").unwrap();

    let err = Formatter::new().format(&path).unwrap_err();
    assert_eq!(err.code(), "E002");
}
