//! Command-line runner for webform element migration.
//!
//! # Responsibility
//! - Run element YAML files through the row handler against a legacy
//!   SQLite snapshot.
//! - Write migrated YAML and print a batch summary.
//!
//! Exit codes: `0` all rows migrated, `1` setup failure, `2` rows skipped.

use clap::Parser;
use log::info;
use serde_yaml::Value;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use webform_migrate_core::db::open_legacy_db;
use webform_migrate_core::{
    default_log_level, encode_elements, init_logging, ElementTree, MigrationReport,
    MigrationSettings, RowMigrationHandler, RowOutcome, SourceRow, SqliteComponentRepository,
};

#[derive(Parser, Debug)]
#[command(name = "webform-migrate", version, about = "Migrate Drupal 7 webform element trees")]
struct Cli {
    /// Legacy SQLite snapshot holding the `webform_component` table.
    #[arg(long, env = "WEBFORM_MIGRATE_LEGACY_DB")]
    legacy_db: PathBuf,

    /// YAML settings file; defaults apply when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Host migration ID the rows belong to.
    #[arg(long)]
    migration_id: Option<String>,

    /// Directory for `<nid>.yml` outputs; stdout when omitted.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when omitted.
    #[arg(long, env = "WEBFORM_MIGRATE_LOG_DIR")]
    log_dir: Option<String>,

    /// Documents as `<nid>=<elements.yml>`.
    #[arg(required = true, value_parser = parse_document)]
    documents: Vec<DocumentArg>,
}

#[derive(Debug, Clone)]
struct DocumentArg {
    nid: i64,
    path: PathBuf,
}

fn parse_document(raw: &str) -> Result<DocumentArg, String> {
    let (nid, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected `<nid>=<path>`, got `{raw}`"))?;
    let nid = nid
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("nid must be an integer, got `{nid}`"))?;
    if path.is_empty() {
        return Err(format!("missing elements path in `{raw}`"));
    }
    Ok(DocumentArg {
        nid,
        path: PathBuf::from(path),
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) => {
            eprintln!("{}", report.summary_line());
            for skipped in &report.skipped {
                eprintln!("skipped nid={} reason={}", skipped.row_id, skipped.reason);
            }
            if report.has_skips() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<MigrationReport, Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let settings = match &cli.settings {
        Some(path) => MigrationSettings::from_yaml_file(path)?,
        None => MigrationSettings::default(),
    };
    let conn = open_legacy_db(&cli.legacy_db)?;
    let repo = SqliteComponentRepository::try_new(&conn)?;
    let handler = RowMigrationHandler::with_settings(repo, settings);

    let settings = handler.settings();
    let migration_id = cli
        .migration_id
        .as_deref()
        .unwrap_or(&settings.webform_migration_id);

    if let Some(out_dir) = &cli.out_dir {
        std::fs::create_dir_all(out_dir)?;
    }

    let mut report = MigrationReport::new();
    for document in &cli.documents {
        let serialized = std::fs::read_to_string(&document.path)
            .map_err(|err| format!("failed to read `{}`: {err}", document.path.display()))?;

        let mut row = SourceRow::new();
        row.set_source_property(&settings.nid_property, Value::from(document.nid));
        row.set_source_property(&settings.elements_property, Value::String(serialized));

        let outcome = handler.on_prepare_row(&mut row, migration_id);
        info!(
            "event=cli_document module=cli status=done nid={} outcome={:?}",
            document.nid, outcome
        );
        if let RowOutcome::Migrated { .. } = outcome {
            let output = match row.get(&settings.elements_property) {
                Some(Value::Mapping(mapping)) => {
                    encode_elements(&ElementTree::from_mapping(mapping.clone()))?
                }
                _ => String::new(),
            };
            write_output(cli, document.nid, &output)?;
        }
        report.record(document.nid.to_string(), &outcome);
    }

    Ok(report)
}

fn write_output(cli: &Cli, nid: i64, yaml: &str) -> Result<(), Box<dyn Error>> {
    match &cli.out_dir {
        Some(out_dir) => {
            std::fs::write(out_dir.join(format!("{nid}.yml")), yaml)?;
        }
        None => {
            println!("# nid {nid}");
            print!("{yaml}");
        }
    }
    Ok(())
}
