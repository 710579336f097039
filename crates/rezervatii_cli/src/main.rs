//! `rezervatii` command-line entry point.
//!
//! # Responsibility
//! - Map subcommands onto core operations (init, import, search, filters,
//!   comparison, occurrence entry).
//! - Print results as plain text or JSON and optionally export tables.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use rezervatii_core::access::{Role, UserAccount};
use rezervatii_core::db::Connection;
use rezervatii_core::export::{
    association_table, comparison_table, export_table, occurrence_table, search_hit_table,
    site_habitat_table, ExportFormat, Table,
};
use rezervatii_core::import::{import_csv, ImportKind};
use rezervatii_core::report::{
    compare_species, filter_associations, filter_occurrences, filter_site_habitats,
    habitat_names, raions, reserve_names, site_names, AssociationFilter, OccurrenceFilter, Report,
    SiteHabitatFilter,
};
use rezervatii_core::repo::occurrence_repo::SqliteOccurrenceRepository;
use rezervatii_core::repo::reserve_repo::SqliteReserveRepository;
use rezervatii_core::repo::species_repo::SqliteSpeciesRepository;
use rezervatii_core::search::{search_catalog, EntityKind, PageRequest};
use rezervatii_core::service::{NewOccurrence, OccurrenceService};
use rezervatii_core::{core_version, init_from_config, open_db, AppConfig};
use std::path::{Path, PathBuf};

/// Nature-reserve catalog: species, associations, sites and habitats.
#[derive(Parser, Debug)]
#[command(name = "rezervatii", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML config file (default: ./rezervatii.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, overriding `database.path`
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or migrate the database
    Init,

    /// Import a CSV sheet
    Import {
        /// species | reserves | associations | sites | habitats
        kind: ImportKind,
        path: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Accent- and typo-tolerant search within one entity kind
    Search {
        /// species | reserves | associations | sites | habitats
        kind: EntityKind,
        /// Blank lists everything alphabetically
        #[arg(default_value = "")]
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Defaults to `search.default_per_page`
        #[arg(long)]
        per_page: Option<u32>,
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Year-indexed filter reports
    Filter {
        #[command(subcommand)]
        report: FilterCommand,
    },

    /// Reserve x year presence matrix for one species
    Compare {
        /// Species id or exact scientific name
        species: String,
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Values for filter inputs
    List {
        #[command(subcommand)]
        lookup: LookupCommand,
    },

    /// Record a species occurrence in a reserve
    AddOccurrence {
        /// Exact scientific name
        #[arg(long)]
        species: String,
        /// Exact reserve name
        #[arg(long)]
        reserve: String,
        #[arg(long)]
        year: i32,
        /// Defaults to the species rarity flag
        #[arg(long)]
        rare: Option<bool>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        observer: Option<String>,
        #[arg(long, default_value = "cli")]
        user: String,
        /// administrator | contributor | viewer
        #[arg(long, default_value = "contributor")]
        role: Role,
    },
}

#[derive(Subcommand, Debug)]
enum FilterCommand {
    Associations {
        /// by_reserve_year | by_reserve_all_years | by_year_all_reserves
        #[arg(long, default_value = "")]
        mode: String,
        #[arg(long, default_value = "")]
        reserve: String,
        #[arg(long, default_value = "")]
        year: String,
        #[command(flatten)]
        export: ExportArgs,
    },
    Occurrences {
        /// by_reserve_all | by_reserve_rare | by_raion_all | by_raion_rare
        #[arg(long, default_value = "")]
        mode: String,
        #[arg(long, default_value = "")]
        reserve: String,
        #[arg(long, default_value = "")]
        raion: String,
        #[command(flatten)]
        export: ExportArgs,
    },
    SiteHabitats {
        /// by_site | by_habitat | by_year
        #[arg(long, default_value = "")]
        mode: String,
        #[arg(long, default_value = "")]
        site: String,
        #[arg(long, default_value = "")]
        habitat: String,
        #[arg(long, default_value = "")]
        year: String,
        #[command(flatten)]
        export: ExportArgs,
    },
}

#[derive(Subcommand, Debug)]
enum LookupCommand {
    Reserves,
    Raions,
    Sites,
    Habitats,
}

#[derive(Args, Debug, Clone)]
struct ExportArgs {
    /// Write the result table to this file
    #[arg(long)]
    export: Option<PathBuf>,
    /// csv | xlsx (default: from the file extension, else csv)
    #[arg(long)]
    format: Option<ExportFormat>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db) = cli.db.clone() {
        config.database.path = db;
    }
    let cwd = std::env::current_dir().context("resolving working directory")?;
    init_from_config(&config.logging, &cwd)
        .map_err(anyhow::Error::msg)
        .context("starting file logging")?;

    let mut conn = open_db(&config.database.path)
        .with_context(|| format!("opening {}", config.database.path.display()))?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    match cli.command {
        Command::Init => {
            println!("database ready at {}", config.database.path.display());
        }
        Command::Import { kind, path, json } => {
            let summary = import_csv(&mut conn, kind, &path)
                .with_context(|| format!("importing {} from {}", kind.as_str(), path.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}: {summary}", kind.as_str());
            }
        }
        Command::Search {
            kind,
            query,
            page,
            per_page,
            json,
            export,
        } => {
            let request = PageRequest::new(page, per_page.unwrap_or(0));
            let results = search_catalog(&conn, kind, &query, &config.search, request)?;
            let table = search_hit_table(&results.items);
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!(
                    "{} results, page {}/{}",
                    results.total,
                    results.page,
                    results.total_pages().max(1)
                );
                print_table(&table);
            }
            write_export(&table, &export)?;
        }
        Command::Filter { report } => run_filter(&conn, &config, report)?,
        Command::Compare { species, export } => {
            let comparison = compare_species(&conn, &species)?;
            let table = comparison_table(&comparison);
            println!("{}", comparison.species.scientific_name);
            print_table(&table);
            write_export(&table, &export)?;
        }
        Command::List { lookup } => {
            let values = match lookup {
                LookupCommand::Reserves => reserve_names(&conn)?,
                LookupCommand::Raions => raions(&conn)?,
                LookupCommand::Sites => site_names(&conn)?,
                LookupCommand::Habitats => habitat_names(&conn)?,
            };
            for value in values {
                println!("{value}");
            }
        }
        Command::AddOccurrence {
            species,
            reserve,
            year,
            rare,
            source,
            observer,
            user,
            role,
        } => {
            let mut account = UserAccount::new(user);
            account.set_role(role);
            let service = OccurrenceService::new(
                SqliteSpeciesRepository::new(&conn),
                SqliteReserveRepository::new(&conn),
                SqliteOccurrenceRepository::new(&conn),
            );
            let id = service.add_occurrence(
                &account,
                &NewOccurrence {
                    species_name: species,
                    reserve_name: reserve,
                    year,
                    is_rare: rare,
                    source,
                    observer,
                    ..NewOccurrence::default()
                },
            )?;
            println!("occurrence {id} recorded");
        }
    }

    Ok(())
}

fn run_filter(conn: &Connection, config: &AppConfig, report: FilterCommand) -> Result<()> {
    match report {
        FilterCommand::Associations {
            mode,
            reserve,
            year,
            export,
        } => {
            let filter = AssociationFilter {
                mode,
                reserve_name: reserve,
                year,
            };
            let report = filter_associations(conn, &filter)?;
            emit_report(&report, association_table(&report.rows), &export)
        }
        FilterCommand::Occurrences {
            mode,
            reserve,
            raion,
            export,
        } => {
            let filter = OccurrenceFilter {
                mode,
                reserve_name: reserve,
                raion,
            };
            let report = filter_occurrences(conn, &filter, config.reports.row_cap)?;
            emit_report(&report, occurrence_table(&report.rows), &export)
        }
        FilterCommand::SiteHabitats {
            mode,
            site,
            habitat,
            year,
            export,
        } => {
            let filter = SiteHabitatFilter {
                mode,
                site_name: site,
                habitat_name: habitat,
                year,
            };
            let report = filter_site_habitats(conn, &filter)?;
            emit_report(&report, site_habitat_table(&report.rows), &export)
        }
    }
}

fn emit_report<R>(report: &Report<R>, table: Table, export: &ExportArgs) -> Result<()> {
    if let Some(message) = report.message.as_deref() {
        println!("{message}");
        return Ok(());
    }
    print_table(&table);
    if report.truncated {
        println!("(rezultate limitate la {} rânduri)", report.rows.len());
    }
    write_export(&table, export)
}

fn print_table(table: &Table) {
    println!("{}", table.headers.join("\t"));
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        println!("{}", cells.join("\t"));
    }
}

fn write_export(table: &Table, export: &ExportArgs) -> Result<()> {
    let Some(path) = export.export.as_deref() else {
        return Ok(());
    };
    let format = match export.format {
        Some(format) => format,
        None => format_from_extension(path)?,
    };
    export_table(table, format, path).with_context(|| format!("exporting to {}", path.display()))?;
    println!("exported {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

fn format_from_extension(path: &Path) -> Result<ExportFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        None => Ok(ExportFormat::Csv),
        Some(ext) => match ext.parse() {
            Ok(format) => Ok(format),
            Err(err) => bail!("{err}; pass --format explicitly"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{format_from_extension, Cli, Command, FilterCommand};
    use clap::Parser;
    use rezervatii_core::export::ExportFormat;
    use rezervatii_core::search::EntityKind;
    use std::path::Path;

    #[test]
    fn parses_search_with_global_db_flag() {
        let cli = Cli::try_parse_from([
            "rezervatii",
            "search",
            "species",
            "rosa canina",
            "--db",
            "/tmp/x.sqlite3",
            "--per-page",
            "10",
        ])
        .expect("search arguments should parse");
        assert_eq!(cli.db.as_deref(), Some(Path::new("/tmp/x.sqlite3")));
        match cli.command {
            Command::Search {
                kind,
                query,
                per_page,
                ..
            } => {
                assert_eq!(kind, EntityKind::Species);
                assert_eq!(query, "rosa canina");
                assert_eq!(per_page, Some(10));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn filter_modes_default_to_blank() {
        let cli = Cli::try_parse_from(["rezervatii", "filter", "occurrences", "--raion", "Orhei"])
            .expect("filter arguments should parse");
        match cli.command {
            Command::Filter {
                report: FilterCommand::Occurrences { mode, raion, .. },
            } => {
                assert_eq!(mode, "");
                assert_eq!(raion, "Orhei");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_kinds_are_rejected() {
        assert!(Cli::try_parse_from(["rezervatii", "import", "plants", "x.csv"]).is_err());
    }

    #[test]
    fn export_format_follows_extension() {
        assert_eq!(
            format_from_extension(Path::new("out.xlsx")).expect("xlsx extension"),
            ExportFormat::Xlsx
        );
        assert_eq!(
            format_from_extension(Path::new("out")).expect("csv default"),
            ExportFormat::Csv
        );
        assert!(format_from_extension(Path::new("out.pdf")).is_err());
    }
}
