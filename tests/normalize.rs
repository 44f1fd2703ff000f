use anyhow::Result;
use geoenrich::normalize::normalize_file;
use geoenrich::testing::*;
use geoenrich::{FormatError, normalize};
use serde_json::json;
use std::fs;

#[test]
fn concatenated_objects_become_records() -> Result<()> {
    let v = normalize(r#"{"a":1}{"a":2}"#)?;
    assert_eq!(v, vec![json!({"a": 1}), json!({"a": 2})]);
    Ok(())
}

#[test]
fn mixed_framing_from_a_file() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_sample_log(tmp.path())?;
    let v = normalize_file(&path)?;
    assert_eq!(v.len(), 5);
    assert_eq!(v[0]["src_ip"], "8.8.8.8");
    assert_eq!(v[4]["src_ip"], "bad");
    Ok(())
}

#[test]
fn unrepairable_file_names_the_file() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("broken.json");
    fs::write(&path, "{\"a\":1}\n{\"a\":")?;
    let err = normalize_file(&path).unwrap_err();
    assert!(matches!(err, FormatError::Parse { .. }));
    assert!(err.to_string().contains("broken.json"), "{err}");
    Ok(())
}

#[test]
fn missing_file_is_an_io_format_error() {
    let err = normalize_file("/no/such/cowrie.json").unwrap_err();
    assert!(matches!(err, FormatError::Io { .. }));
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzipped_log_is_read_transparently() -> Result<()> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("cowrie.json.gz");
    let mut enc = GzEncoder::new(fs::File::create(&path)?, Compression::default());
    enc.write_all(sample_log_text().as_bytes())?;
    enc.finish()?;

    assert_eq!(normalize_file(&path)?.len(), 5);
    Ok(())
}

#[test]
fn shell_commands_with_spaced_braces_are_not_split() -> Result<()> {
    let raw = concat!(
        r#"{"eventid":"cowrie.command.input","input":"f() { a; } { b; }","src_ip":"8.8.8.8"}"#,
        "\n",
        r#"{"eventid":"cowrie.command.input","input":"echo }  {"}"#,
    );
    let v = normalize(raw)?;
    assert_eq!(v.len(), 2);
    assert_eq!(v[0]["input"], "f() { a; } { b; }");
    assert_eq!(v[1]["input"], "echo }  {");
    Ok(())
}
