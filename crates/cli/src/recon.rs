//! `cardmesh run|validate|classify`: config-driven provider reconciliation.

use std::path::{Path, PathBuf};

use cardmesh_recon::load::load_provider;
use cardmesh_recon::report::{
    coverage_document, flagged_document, master_document, mismatch_report,
};
use cardmesh_recon::{reconcile, ReconConfig, ReconInput, ReconOutput, Scope};
use clap::Args;
use serde::Serialize;

use crate::exit_codes::{
    recon_exit_code, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_ISSUES, EXIT_RECON_LOAD,
    EXIT_RECON_WRITE, EXIT_USAGE,
};
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the .recon.toml config file
    pub config: PathBuf,

    /// Directory for output documents (default: `output.dir` from config, else `out/` next to it)
    #[arg(long, short = 'o')]
    pub out_dir: Option<PathBuf>,

    /// Override the config scope: `all` or comma-separated set codes
    #[arg(long)]
    pub scope: Option<String>,

    /// Print the master document to stdout
    #[arg(long)]
    pub json: bool,

    /// Exit non-zero when the run reports mismatches, flags or warnings
    #[arg(long)]
    pub strict: bool,

    /// Suppress per-warning lines on stderr
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn read_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        recon_err(EXIT_USAGE, format!("cannot read config {}: {e}", path.display()))
    })?;
    ReconConfig::from_toml(&config_str).map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))
}

fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

/// Read every configured source, resolving paths against the config's directory.
fn load_sources(config: &ReconConfig, base: &Path) -> Result<ReconInput, CliError> {
    let mut input = ReconInput::new();
    for (provider, source) in &config.sources {
        let path = base.join(&source.file);
        let data = std::fs::read_to_string(&path).map_err(|e| {
            recon_err(EXIT_RECON_LOAD, format!("cannot read {}: {e}", path.display()))
        })?;
        let collection = load_provider(provider, &data, source)
            .map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;
        tracing::info!(
            provider = %provider,
            records = collection.len(),
            path = %path.display(),
            "loaded source"
        );
        input.providers.insert(provider.clone(), collection);
    }
    Ok(input)
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf, CliError> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| recon_err(EXIT_RECON_WRITE, format!("JSON serialization error: {e}")))?;
    std::fs::write(&path, json)
        .map_err(|e| recon_err(EXIT_RECON_WRITE, format!("cannot write {}: {e}", path.display())))?;
    Ok(path)
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut config = read_config(&args.config)?;
    if let Some(ref scope) = args.scope {
        config.scope = Scope::parse(scope).map_err(|e| {
            CliError::args(e).with_hint("use --scope all or --scope 001,002")
        })?;
    }
    if config.sources.is_empty() {
        return Err(recon_err(EXIT_RECON_INVALID_CONFIG, "config has no [sources]")
            .with_hint("add a [sources.<provider>] table with a file for each provider"));
    }

    let base = base_dir(&args.config);
    let input = load_sources(&config, base)?;

    let output =
        reconcile(&config, &input).map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;

    let out_dir = match (&args.out_dir, &config.output.dir) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => base.join(dir),
        (None, None) => base.join("out"),
    };
    std::fs::create_dir_all(&out_dir).map_err(|e| {
        recon_err(EXIT_RECON_WRITE, format!("cannot create {}: {e}", out_dir.display()))
    })?;

    let created_at = chrono::Utc::now();
    let master = master_document(&output, created_at)
        .map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;

    write_json(&out_dir, "master.json", &master)?;
    write_json(&out_dir, "mismatches.json", &mismatch_report(&output, created_at))?;
    write_json(&out_dir, "coverage.json", &coverage_document(&output, created_at))?;
    write_json(
        &out_dir,
        "flagged.json",
        &flagged_document(&output, config.flag.missing_provider.as_deref(), created_at),
    )?;
    write_json(&out_dir, "warnings.json", &output.warnings)?;
    eprintln!("wrote 5 documents to {}", out_dir.display());

    if args.json {
        let json_str = serde_json::to_string_pretty(&master)
            .map_err(|e| recon_err(EXIT_RECON_WRITE, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&output, args.quiet);

    if args.strict && has_issues(&output) {
        return Err(recon_err(EXIT_RECON_ISSUES, "mismatches, flags or warnings found (--strict)"));
    }
    Ok(())
}

fn has_issues(output: &ReconOutput) -> bool {
    !output.mismatches.is_empty() || !output.flagged.is_empty() || !output.warnings.is_empty()
}

fn print_summary(output: &ReconOutput, quiet: bool) {
    let s = &output.summary;
    eprintln!(
        "{} providers: {} cards ({} in all providers), {} mismatches, {} flagged, {} warnings",
        output.providers.len(),
        s.universe,
        s.in_all_providers,
        s.mismatches,
        s.flagged,
        output.warnings.len(),
    );
    if s.out_of_scope > 0 {
        eprintln!("skipped {} out-of-scope record(s)", s.out_of_scope);
    }
    if !quiet {
        for warning in &output.warnings {
            eprintln!("warning: {warning}");
        }
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "config '{}' is valid: {} provider(s), {} source(s)",
        config.name,
        config.providers.len(),
        config.sources.len(),
    );
    Ok(())
}

pub fn cmd_classify(name_a: String, name_b: String, json: bool) -> Result<(), CliError> {
    let category = if name_a == name_b {
        "identical".to_string()
    } else {
        cardmesh_recon::classify(&name_a, &name_b).to_string()
    };
    if json {
        let value = serde_json::json!({
            "a": name_a,
            "b": name_b,
            "category": category,
        });
        println!("{value}");
    } else {
        println!("{category}");
    }
    Ok(())
}
