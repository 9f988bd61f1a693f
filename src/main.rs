use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use substation_intake::cli::{Cli, Commands};
use substation_intake::config::Config;
use substation_intake::error::IntakeError;
use substation_intake::{open_service, scanner};
use substation_intake_common::{
    category_counts, group_by_category, Category, Classifier, GalleryFilter, ImageRecord,
    ParsedFilename, TaxonomyTable,
};
use tracing_subscriber::EnvFilter;

/// `check --json` の1行分
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckResult<'a> {
    file_name: &'a str,
    valid: bool,
    reason: Option<String>,
    parsed: ParsedFilename,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_record(record: &ImageRecord) {
    let field = |v: &str| if v.is_empty() { "-".to_string() } else { v.to_string() };
    println!(
        "  {}  {}  [{}]  location: {}  date: {}  seq: {}",
        record.id,
        record.filename,
        record.category,
        field(&record.location),
        field(&record.date_taken),
        field(&record.sequence),
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("failed to load config")?;

    match cli.command {
        Commands::Check { names, json } => {
            let table = config.taxonomy()?;
            let classifier = Classifier::new(&table);

            let results: Vec<CheckResult> = names
                .iter()
                .map(|name| {
                    let verdict = classifier.check_file_type(name);
                    CheckResult {
                        file_name: name,
                        valid: verdict.is_ok(),
                        reason: verdict.err().map(|r| r.to_string()),
                        parsed: classifier.parse_image_filename(name),
                    }
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for r in &results {
                    let mark = if r.valid { "✔" } else { "✘" };
                    println!("{} {}  [{}]", mark, r.file_name, r.parsed.category);
                    println!(
                        "    prefix: {}  item: {}  location: {}  date: {}  seq: {}",
                        r.parsed.prefix,
                        r.parsed.item_type,
                        r.parsed.location,
                        r.parsed.date_taken,
                        r.parsed.sequence,
                    );
                    if let Some(reason) = &r.reason {
                        println!("    {}", reason);
                    }
                }
            }
        }

        Commands::Upload { paths, recursive, allow_uncategorized } => {
            println!("📥 substation-intake - upload\n");
            config.allow_uncategorized |= allow_uncategorized;
            let table = config.taxonomy()?;
            let mut service = open_service(&config, &table)?;

            // 1. スキャン
            println!("[1/2] Scanning files...");
            let scanned = scanner::collect_paths(&paths, recursive)?;
            if scanned.is_empty() {
                let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                return Err(IntakeError::NoFilesFound(shown.join(", ")).into());
            }
            println!("✔ {} file(s) found\n", scanned.len());

            // 2. 読み込み・取り込み
            println!("[2/2] Uploading...");
            let pb = ProgressBar::new(scanned.len() as u64);
            pb.set_style(
                ProgressStyle::with_template("  {bar:30} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let mut files = Vec::with_capacity(scanned.len());
            for file in &scanned {
                pb.set_message(file.file_name.clone());
                files.push(file.read().with_context(|| format!("failed to read {}", file.path.display()))?);
                pb.inc(1);
            }
            pb.finish_and_clear();

            let report = service.upload(files).map_err(IntakeError::from).context(
                "upload failed (sign in with `intake config --set-owner <ID>` or set INTAKE_OWNER)",
            )?;

            for record in &report.inserted {
                println!("✔ {}  [{}]", record.filename, record.category);
            }
            if !report.rejected.is_empty() {
                println!("\nThe following files were rejected:");
                for rejected in &report.rejected {
                    println!("✘ {} - {}", rejected.candidate.file_name, rejected.reason);
                }
                println!("\nValid format examples:");
                println!("  vi_switchgear_image.jpg");
                println!("  sc_transformer_location_date.jpg");
                println!("  ts_cbm_test.pdf");
            }
            for failed in &report.failed {
                println!("✘ {} - storage error: {}", failed.file_name, failed.error);
            }

            println!(
                "\n✅ {} uploaded, {} rejected, {} failed",
                report.inserted.len(),
                report.rejected.len(),
                report.failed.len()
            );
        }

        Commands::List { category, search, grouped } => {
            let table = config.taxonomy()?;
            let service = open_service(&config, &table)?;
            let filter = GalleryFilter { category, search };
            let records = service.list(&filter).map_err(IntakeError::from)?;

            if records.is_empty() {
                match category {
                    Some(c) => println!("No files in {} category", c),
                    None => println!("No files uploaded yet"),
                }
                return Ok(());
            }

            if grouped {
                for (category, group) in group_by_category(&records) {
                    println!("{} ({})", category, group.len());
                    for record in group {
                        print_record(record);
                    }
                    println!();
                }
            } else {
                for record in &records {
                    print_record(record);
                }
                println!();
            }

            let summary: Vec<String> = category_counts(&records)
                .into_iter()
                .map(|(c, n)| format!("{}: {}", c, n))
                .collect();
            println!("{}", summary.join("  "));
        }

        Commands::Delete { id, category } => {
            let table = config.taxonomy()?;
            let mut service = open_service(&config, &table)?;

            if let Some(id) = id {
                let removed = service.delete(&id).map_err(IntakeError::from)?;
                println!("✔ Deleted {} ({})", removed.filename, removed.id);
            } else if let Some(category) = category {
                let count = service.delete_category(category).map_err(IntakeError::from)?;
                println!("✔ Deleted {} file(s) in {}", count, category);
            }
        }

        Commands::Taxonomy { category } => {
            let table = config.taxonomy()?;
            let categories: Vec<Category> = match category {
                Some(c) => vec![c],
                None => Category::ALL.to_vec(),
            };

            for category in categories {
                let allowed = match table.allowed_file_kind(category) {
                    Some(kind) => format!("{} only", kind.expected_kind()),
                    None => "-".to_string(),
                };
                println!("{} ({})", category, allowed);
                for entry in table.entries().filter(|e| e.category == category) {
                    println!("  {}_{}", entry.prefix, entry.shortform);
                }
            }
        }

        Commands::Config { set_owner, clear_owner, data_dir, taxonomy, show } => {
            let mut changed = false;
            let signed = set_owner.is_some() || clear_owner;

            if let Some(owner) = set_owner {
                config.set_owner(Some(owner))?;
                println!("✔ Signed in");
            }
            if clear_owner {
                config.set_owner(None)?;
                println!("✔ Signed out");
            }
            if let Some(dir) = data_dir {
                config.data_dir = Some(dir);
                changed = true;
            }
            if let Some(path) = taxonomy {
                // 保存前に読み込めることを確認
                let loaded = TaxonomyTable::from_file(&path)
                    .with_context(|| format!("invalid taxonomy file {}", path.display()))?;
                println!("✔ Taxonomy with {} entries", loaded.len());
                config.taxonomy_path = Some(path);
                changed = true;
            }
            if changed {
                config.save()?;
            }

            if show || !(changed || signed) {
                println!("Config:");
                println!("  path: {}", Config::config_path()?.display());
                println!("  owner: {}", config.owner_id().unwrap_or_else(|| "(signed out)".into()));
                println!("  data dir: {}", config.data_dir()?.display());
                println!(
                    "  taxonomy: {}",
                    config
                        .taxonomy_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "built-in".into())
                );
                println!("  allow uncategorized: {}", config.allow_uncategorized);
            }
        }
    }

    Ok(())
}
