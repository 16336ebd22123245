use crate::drip::DripListEntry;
use crate::errors::Result;
use crate::scan::ScanReport;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct DripListOutput<'a> {
    max_length: usize,
    entries: &'a [DripListEntry],
}

/// Write a scan report as pretty JSON.
pub fn write_scan_json<W: Write>(writer: &mut W, report: &ScanReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    Ok(())
}

/// Write a drip list as pretty JSON.
pub fn write_drip_json<W: Write>(
    writer: &mut W,
    entries: &[DripListEntry],
    max_length: usize,
) -> Result<()> {
    let output = DripListOutput {
        max_length,
        entries,
    };
    serde_json::to_writer_pretty(&mut *writer, &output)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn drip_json_uses_string_percentages() {
        let entries = vec![DripListEntry {
            package_name: "serde-rs/serde".to_string(),
            package_url: "https://github.com/serde-rs/serde".to_string(),
            ecosystem: "cargo".to_string(),
            split_percentage: dec!(100.0000),
        }];
        let mut out = Vec::new();
        write_drip_json(&mut out, &entries, 200).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["max_length"], 200);
        assert_eq!(value["entries"][0]["split_percentage"], "100.0000");
        assert_eq!(value["entries"][0]["ecosystem"], "cargo");
    }
}
