//! Type catalog commands
//!
//! Usage:
//!   yangtree catalog check <PATH>
//!   yangtree catalog describe <PATH> [--json]
//!   yangtree catalog validate <PATH> <TYPE> <VALUE>... [--mapped]

use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use yangtree_core::types::{ScalarValue, TypeDef};
use yangtree_core::{log_op_end, log_op_error, log_op_start};
use yangtree_core::{parse_catalog_file, TypeCatalog, TypeRegistry, YangError};

#[derive(Debug, Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// Parse and compile a catalog file
    Check(CheckArgs),
    /// List the types a catalog defines
    Describe(DescribeArgs),
    /// Check values against one catalog type
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Path to catalog YAML file
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// Path to catalog YAML file
    pub path: PathBuf,

    /// Print the compiled definitions as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to catalog YAML file
    pub path: PathBuf,

    /// Name of the type to validate against
    pub type_name: String,

    /// Values to check
    #[arg(required = true)]
    pub values: Vec<String>,

    /// Show enumeration values as their integers
    #[arg(long)]
    pub mapped: bool,
}

/// Execute catalog command
pub fn execute(args: CatalogArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        CatalogCommand::Check(check_args) => execute_check(check_args),
        CatalogCommand::Describe(describe_args) => execute_describe(describe_args),
        CatalogCommand::Validate(validate_args) => execute_validate(validate_args),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Parse and compile, logging the outcome under `op`
fn load(op: &'static str, path: &Path) -> Result<(TypeCatalog, TypeRegistry), YangError> {
    log_op_start!(op, path = %path.display());
    let start = Instant::now();

    let loaded = parse_catalog_file(path).and_then(|catalog| {
        let registry = catalog.compile()?;
        Ok((catalog, registry))
    });

    match &loaded {
        Ok((catalog, _)) => {
            log_op_end!(
                op,
                duration_ms = elapsed_ms(start),
                module = %catalog.module,
                type_count = catalog.types.len()
            );
        }
        Err(err) => {
            log_op_error!(op, err, duration_ms = elapsed_ms(start));
        }
    }
    loaded
}

fn execute_check(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (catalog, _) = load("catalog_check", &args.path)?;
    println!(
        "✓ {}: {} types compiled ({})",
        catalog.module,
        catalog.types.len(),
        args.path.display()
    );
    Ok(())
}

fn execute_describe(args: DescribeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (catalog, registry) = load("catalog_describe", &args.path)?;

    let mut described = Vec::with_capacity(catalog.types.len());
    for name in catalog.types.keys() {
        let id = registry.lookup(name).ok_or_else(|| YangError::Internal {
            message: format!("type {} missing after compile", name),
        })?;
        described.push((name.as_str(), registry.get(id)?.def()));
    }

    if args.json {
        let entries = described
            .iter()
            .map(|(name, def)| {
                Ok(serde_json::json!({
                    "name": name,
                    "definition": serde_json::to_value(def)?,
                }))
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        let document = serde_json::json!({
            "module": catalog.module,
            "types": entries,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("module {}", catalog.module);
    for (name, def) in described {
        println!("  {}: {}", name, describe_def(def));
    }
    Ok(())
}

fn describe_def(def: &TypeDef) -> String {
    let mut parts = vec![def.base.name().to_string()];
    if let Some(digits) = def.fraction_digits {
        parts.push(format!("fraction-digits {}", digits));
    }
    let restrictions = &def.restrictions;
    if let Some(pattern) = &restrictions.pattern {
        parts.push(format!("pattern '{}'", pattern));
    }
    if !restrictions.range.is_empty() {
        parts.push(format!("range {}", restrictions.range.join(" | ")));
    }
    if !restrictions.length.is_empty() {
        parts.push(format!("length {}", restrictions.length.join(" | ")));
    }
    if !restrictions.dict_key.is_empty() {
        let names: Vec<&str> = restrictions
            .dict_key
            .keys()
            .map(String::as_str)
            .filter(|name| !name.starts_with('@'))
            .collect();
        parts.push(format!("enum {}", names.join("|")));
    }
    parts.join(" ")
}

fn execute_validate(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, registry) = load("catalog_validate", &args.path)?;
    let id = registry
        .lookup(&args.type_name)
        .ok_or_else(|| format!("unknown type: {}", args.type_name))?;

    log_op_start!("value_validate", type_name = %args.type_name, count = args.values.len());
    let start = Instant::now();

    let mut rejected = 0usize;
    for raw in &args.values {
        match registry.construct(id, &ScalarValue::from(raw.as_str())) {
            Ok(value) => println!("✓ {} -> {}", raw, value.get_value(args.mapped)),
            Err(err) => {
                rejected += 1;
                println!("✗ {}: {}", raw, err);
                tracing::debug!(value = %raw, error_code = err.code(), "value rejected");
            }
        }
    }

    log_op_end!(
        "value_validate",
        duration_ms = elapsed_ms(start),
        rejected = rejected
    );

    if rejected > 0 {
        return Err(format!("{} of {} values rejected", rejected, args.values.len()).into());
    }
    Ok(())
}
