use crate::config::ResolvedConfig;
use std::io::Write;

pub const SECTIONS: [&str; 5] = ["scan", "output", "limits", "drip_list", "resolver"];

/// Render `config show` output.
pub fn render_show<W: Write>(w: &mut W, config: &ResolvedConfig) -> std::io::Result<()> {
    if config.loaded_files.is_empty() {
        writeln!(w, "Loaded config files: (none)")?;
    } else {
        writeln!(w, "Loaded config files:")?;
        for (i, path) in config.loaded_files.iter().enumerate() {
            writeln!(w, "  {}. {}", i + 1, path.display())?;
        }
    }
    writeln!(w)?;

    writeln!(w, "Resolved settings:")?;
    for (key, source) in config.provenance.sorted_entries() {
        writeln!(w, "  {key}: {} <- {source}", value_for_key(config, key))?;
    }
    Ok(())
}

/// Render `config explain <section>` output.
pub fn render_explain<W: Write>(
    w: &mut W,
    config: &ResolvedConfig,
    section: &str,
) -> std::io::Result<()> {
    let entries = config.provenance.section(section);
    if entries.is_empty() {
        writeln!(w, "Unknown section: {section}")?;
        writeln!(w, "Available sections: {}", SECTIONS.join(", "))?;
        return Ok(());
    }

    writeln!(w, "[{section}]")?;
    for (key, source) in entries {
        writeln!(w, "  {key}: {} <- {source}", value_for_key(config, key))?;
    }
    Ok(())
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}

fn value_for_key(config: &ResolvedConfig, key: &str) -> String {
    match key {
        "scan.languages" if config.languages.is_empty() => "(auto-detect)".to_string(),
        "scan.languages" => config
            .languages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        "scan.include" => list(&config.include),
        "scan.exclude" => list(&config.exclude),
        "scan.include_tests" => config.include_tests.to_string(),
        "scan.workers" if config.workers == 0 => "(all cores)".to_string(),
        "scan.workers" => config.workers.to_string(),
        "scan.max_file_size" => config.max_file_size.to_string(),
        "output.format" => config.format.to_string(),
        "output.quiet" => config.quiet.to_string(),
        "limits.max_tree_depth" => config.limits.max_tree_depth.to_string(),
        "limits.max_imports_per_file" => config.limits.max_imports_per_file.to_string(),
        "drip_list.max_length" => config.max_length.to_string(),
        "resolver.js_aliases" => {
            let aliases: Vec<String> = config
                .resolver
                .js_aliases
                .iter()
                .map(|(k, v)| format!("{k} -> {}", v.join("|")))
                .collect();
            list(&aliases)
        }
        "resolver.solidity_remappings" => {
            let remappings: Vec<String> = config
                .resolver
                .solidity_remappings
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            list(&remappings)
        }
        "resolver.solidity_src_path" => config
            .resolver
            .solidity_src_path
            .clone()
            .unwrap_or_else(|| "(none)".to_string()),
        "resolver.go_module_path" => config
            .resolver
            .go_module_path
            .clone()
            .unwrap_or_else(|| "(from go.mod)".to_string()),
        _ => "?".to_string(),
    }
}
