use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use tracing::{info, warn};

use typecol_cli::document::{fields_table, load_schema, normalize_document, parse_document};

use crate::cli::{FieldsArgs, NormalizeArgs};

/// Returns false when the document does not conform; the issues are printed.
pub fn run_normalize(args: &NormalizeArgs) -> Result<bool> {
    let schema = load_schema(&args.schema)?;
    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read input file {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("read input from stdin")?;
            text
        }
    };
    let input = parse_document(&text)?;

    match normalize_document(&schema, &input) {
        Ok(normalized) => {
            let output = if args.compact {
                serde_json::to_string(&normalized)
            } else {
                serde_json::to_string_pretty(&normalized)
            }
            .context("encode normalized document")?;
            println!("{output}");
            info!(schema = schema.name(), "normalized document");
            Ok(true)
        }
        Err(error) => {
            warn!(schema = schema.name(), %error, "document rejected");
            eprintln!("error: {} does not conform to {}", describe_input(args), schema.name());
            for issue in error.issues() {
                eprintln!("  - {issue}");
            }
            Ok(false)
        }
    }
}

pub fn run_fields(args: &FieldsArgs) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    println!("{}", schema.name());
    println!("{}", fields_table(&schema));
    Ok(())
}

fn describe_input(args: &NormalizeArgs) -> String {
    args.input
        .as_ref()
        .map_or_else(|| "stdin".to_string(), |path| path.display().to_string())
}
