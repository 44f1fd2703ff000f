use anyhow::Result;
use geoenrich::testing::*;
use geoenrich::{LoadError, RangeTable, parse_ipv4};
use std::fs;

#[test]
fn load_ip2location_layout() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_range_csv(tmp.path())?;

    let table = RangeTable::load(&path)?;
    assert_eq!(table.len(), sample_range_entries().len());

    let loc = table.lookup(parse_ipv4("8.8.8.8").unwrap()).unwrap();
    assert_eq!(loc.code, "US");
    assert_eq!(loc.country, "United States");
    assert_eq!(loc.region, "California");
    assert_eq!(loc.city, "Mountain View");
    Ok(())
}

#[test]
fn every_address_in_a_range_maps_to_its_location() {
    let table = sample_range_table();
    for entry in sample_range_entries() {
        let mid = entry.start + (entry.end - entry.start) / 2;
        for ip in [entry.start, mid, entry.end] {
            assert_eq!(table.lookup(ip), Some(&entry.location), "ip {ip}");
        }
    }
}

#[test]
fn addresses_outside_every_range_do_not_match() {
    let table = sample_range_table();
    for ip in ["192.168.1.10", "8.8.9.0", "8.8.7.255", "255.255.255.255"] {
        assert!(table.lookup(parse_ipv4(ip).unwrap()).is_none(), "{ip}");
    }
}

#[test]
fn bom_and_unsorted_rows_are_accepted() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("geo.csv");
    fs::write(
        &path,
        "\u{feff}200,299,CC,Cc,Rc,Tc,0,0,-\n0,99,AA,Aa,Ra,Ta,0,0,-\n100,199,BB,Bb,Rb,Tb\n",
    )?;
    let table = RangeTable::load(&path)?;
    assert_eq!(table.entries()[0].start, 0);
    assert_eq!(table.lookup(250).unwrap().code, "CC");
    assert_eq!(table.lookup(150).unwrap().city, "Tb");
    Ok(())
}

#[test]
fn missing_dataset_is_a_load_error() {
    let err = RangeTable::load("/definitely/not/here.csv").unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn malformed_rows_name_the_line() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("geo.csv");
    fs::write(&path, "0,99,AA,Aa,Ra,Ta\nstart,end,code,country,region,city\n")?;
    match RangeTable::load(&path).unwrap_err() {
        LoadError::Malformed { line, reason, .. } => {
            assert_eq!(line, 2);
            assert!(reason.contains("start"), "{reason}");
        }
        other => panic!("unexpected error {other}"),
    }

    fs::write(&path, "0,99,AA\n")?;
    assert!(matches!(
        RangeTable::load(&path).unwrap_err(),
        LoadError::Malformed { line: 1, .. }
    ));
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzipped_dataset_loads() -> Result<()> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("geo.csv.gz");
    let mut enc = GzEncoder::new(fs::File::create(&path)?, Compression::default());
    enc.write_all(sample_range_csv().as_bytes())?;
    enc.finish()?;

    let table = RangeTable::load(&path)?;
    assert_eq!(table.len(), sample_range_entries().len());
    Ok(())
}
