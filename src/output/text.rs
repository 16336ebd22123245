use crate::drip::DripListEntry;
use crate::errors::Result;
use crate::scan::ScanReport;
use std::io::Write;

/// Write a scan report as human-readable text.
pub fn write_scan_text<W: Write>(writer: &mut W, report: &ScanReport) -> Result<()> {
    let languages: Vec<String> = report.languages.iter().map(ToString::to_string).collect();

    writeln!(writer, "Gardener Import Report")?;
    writeln!(writer, "======================")?;
    writeln!(writer)?;
    writeln!(writer, "Root:       {}", report.root.display())?;
    writeln!(writer, "Languages:  {}", languages.join(", "))?;
    writeln!(writer, "Parsed:     {} files", report.files_parsed)?;
    writeln!(writer, "Skipped:    {} files", report.files_skipped)?;
    writeln!(writer, "Local:      {} imports", report.local_imports)?;
    writeln!(
        writer,
        "Dropped:    {} unresolved relative imports",
        report.dropped_relative
    )?;
    writeln!(writer)?;

    let mut usage: Vec<(&String, &usize)> = report.external_usage.iter().collect();
    usage.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    writeln!(writer, "External Packages ({})", usage.len())?;
    writeln!(writer, "{:-<60}", "")?;
    if usage.is_empty() {
        writeln!(writer, "  (none)")?;
    }
    for (name, files) in usage {
        writeln!(writer, "  {files:>5}  {name}")?;
    }
    writeln!(writer)?;

    writeln!(writer, "Files")?;
    writeln!(writer, "{:-<60}", "")?;
    for file in &report.files {
        writeln!(
            writer,
            "  {}  [{}] external={} local={}",
            file.path.display(),
            file.language,
            file.record.external_imports.len(),
            file.record.local_imports.len()
        )?;
    }

    Ok(())
}

/// Write a drip list as an aligned table.
pub fn write_drip_text<W: Write>(
    writer: &mut W,
    entries: &[DripListEntry],
    max_length: usize,
) -> Result<()> {
    writeln!(
        writer,
        "Drip List ({} entries, max {max_length})",
        entries.len()
    )?;
    writeln!(writer, "{:-<60}", "")?;
    if entries.is_empty() {
        writeln!(writer, "  (no GitHub-hosted dependencies)")?;
        return Ok(());
    }
    for entry in entries {
        writeln!(
            writer,
            "  {:>9}%  {:<32}  {}",
            entry.split_percentage.to_string(),
            entry.package_name,
            entry.ecosystem
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ImportRecord;
    use crate::scan::FileImports;
    use crate::walk::Language;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn drip_table() {
        let entries = vec![
            DripListEntry {
                package_name: "tokio-rs/tokio".to_string(),
                package_url: "https://github.com/tokio-rs/tokio".to_string(),
                ecosystem: "cargo".to_string(),
                split_percentage: dec!(66.6667),
            },
            DripListEntry {
                package_name: "psf/requests".to_string(),
                package_url: "https://github.com/psf/requests".to_string(),
                ecosystem: "pypi".to_string(),
                split_percentage: dec!(33.3333),
            },
        ];
        let mut out = Vec::new();
        write_drip_text(&mut out, &entries, 200).unwrap();
        insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Drip List (2 entries, max 200)
        ------------------------------------------------------------
            66.6667%  tokio-rs/tokio                    cargo
            33.3333%  psf/requests                      pypi
        ");
    }

    #[test]
    fn empty_drip_table() {
        let mut out = Vec::new();
        write_drip_text(&mut out, &[], 5).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Drip List (0 entries, max 5)\n"));
        assert!(text.contains("(no GitHub-hosted dependencies)"));
    }

    #[test]
    fn scan_report_lists_packages_by_usage() {
        let mut record = ImportRecord::default();
        record.external_imports.insert("requests".to_string());
        let report = ScanReport {
            root: PathBuf::from("/repo"),
            languages: vec![Language::Python],
            files: vec![FileImports {
                path: PathBuf::from("app.py"),
                language: Language::Python,
                record,
            }],
            files_parsed: 1,
            files_skipped: 0,
            external_usage: BTreeMap::from([
                ("os".to_string(), 1),
                ("requests".to_string(), 3),
                ("attrs".to_string(), 1),
            ]),
            local_imports: 0,
            dropped_relative: 0,
            elapsed_ms: 0,
        };
        let mut out = Vec::new();
        write_scan_text(&mut out, &report).unwrap();
        let text = String::from_utf8(out).unwrap();

        let requests = text.find("  requests").unwrap();
        let attrs = text.find("  attrs").unwrap();
        let os = text.find("  os").unwrap();
        assert!(requests < attrs && attrs < os);
        assert!(text.contains("Languages:  python"));
        assert!(text.contains("app.py  [python] external=1 local=0"));
    }
}
