//! # CLI Command Implementations

use scheme::{AppConfig, load_schema};
use scheme_core::{Label, Schema, SchemeError, build_schema_label};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum input file size for loading (100 MB).
const MAX_INPUT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file path and size before reading.
fn validate_input_file(path: &Path) -> Result<PathBuf, SchemeError> {
    let canonical = path.canonicalize().map_err(|e| {
        SchemeError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SchemeError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| SchemeError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(SchemeError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_INPUT_FILE_SIZE
        )));
    }

    Ok(canonical)
}

fn label_json(label: &Label) -> serde_json::Value {
    serde_json::json!({
        "key": label.key(),
        "scope": label.scope(),
        "keys": label.keys(),
        "parent": label.parent().map(|p| p.key()),
    })
}

// =============================================================================
// PARSE COMMAND
// =============================================================================

/// Parse a label key against a fresh schema built from the config.
pub fn cmd_parse(config: &AppConfig, text: &str, json_mode: bool) -> Result<(), SchemeError> {
    let schema: Schema<()> = Schema::new(Some(build_schema_label([config.schema_key.as_str()])));
    let label = schema.parse_label(text)?;
    let endpoints = Label::parse_relation(text).ok();

    if json_mode {
        let mut output = label_json(&label);
        if let Some((from, to)) = &endpoints {
            output["from"] = label_json(from);
            output["to"] = label_json(to);
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Label");
    println!("=====");
    println!("Key:    {}", label.key());
    println!("Scope:  {}", label.scope());
    let keys: Vec<&str> = label.keys().iter().map(|k| k.as_str()).collect();
    println!("Keys:   {:?}", keys);
    match label.parent() {
        Some(parent) => println!("Parent: {}", parent.key()),
        None => println!("Parent: (none)"),
    }

    if let Some((from, to)) = endpoints {
        println!();
        println!("Relation");
        println!("  From: {}", from.key());
        println!("  To:   {}", to.key());
    }

    Ok(())
}

// =============================================================================
// LOAD COMMAND
// =============================================================================

/// Load records from a JSON file and summarize the resulting schema.
pub fn cmd_load(
    config: &AppConfig,
    file: &Path,
    json_mode: bool,
    dump: bool,
) -> Result<(), SchemeError> {
    let path = validate_input_file(file)?;
    let text = std::fs::read_to_string(&path)
        .map_err(|e| SchemeError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    let input: serde_json::Value = serde_json::from_str(&text)?;

    let (schema, summaries) = load_schema(config, &input)?;

    if dump {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    if json_mode {
        let output = serde_json::json!({
            "schema": schema.label().key(),
            "documents": summaries,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Schema {}", schema.label().key());
    println!("==================");
    for summary in &summaries {
        println!();
        println!("{}", summary.document);
        println!("  Records:   {}", summary.records);
        println!("  Nodes:     {}", summary.nodes);
        println!("  Relations: {}", summary.relations);
        if summary.dangling > 0 {
            println!("  Dangling:  {}", summary.dangling);
        }
    }

    Ok(())
}
