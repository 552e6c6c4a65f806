use clap::{Parser, Subcommand, ValueEnum};
use epi_core::period::current_year;
use epi_core::snapshot::{load_registry_yaml, load_snapshot};
use epi_core::{
    canonical_disease_id, canonical_location_id, resolve_months, AgeInterval, DiseaseId,
    DiseaseSelection, LocationId, Report, ReportRequest, ReportType, Sex,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "epi")]
#[command(about = "Disease surveillance reporting CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum IdKind {
    Location,
    Disease,
}

#[derive(Subcommand)]
enum Commands {
    /// List selectable periods, newest first
    Periods {
        /// monthly, quarterly, semiannual or annual
        report_type: String,
        /// First year to list
        #[arg(long, default_value_t = epi_core::constants::DEFAULT_FIRST_REPORT_YEAR)]
        from_year: u16,
        /// Last year to list (defaults to the current year)
        #[arg(long)]
        to_year: Option<u16>,
    },
    /// Show the months a period covers
    Months {
        /// monthly, quarterly, semiannual or annual
        report_type: String,
        /// Period value, e.g. 2025-01, 2025_Q1, 2025_S2, 2025_FULL
        period: String,
    },
    /// Show the id derived from a display name
    Canonicalise {
        #[arg(value_enum)]
        kind: IdKind,
        name: String,
    },
    /// Print a report from an offline snapshot
    Report {
        /// Snapshot JSON with `config` and `reports`
        #[arg(long)]
        snapshot: PathBuf,
        /// YAML registry overriding the snapshot's config
        #[arg(long)]
        registry: Option<PathBuf>,
        /// monthly, quarterly, semiannual or annual
        #[arg(long = "type")]
        report_type: String,
        /// Period value, e.g. 2025_Q1
        #[arg(long)]
        period: String,
        /// Disease id (repeatable; all diseases when omitted)
        #[arg(long = "disease")]
        diseases: Vec<String>,
        /// Location id (repeatable; all locations when omitted)
        #[arg(long = "location")]
        locations: Vec<String>,
        /// Age interval such as 0_1 or 65_plus (repeatable; all when omitted)
        #[arg(long = "interval")]
        intervals: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Periods {
            report_type,
            from_year,
            to_year,
        }) => {
            let report_type: ReportType = report_type.parse()?;
            let to_year = to_year.unwrap_or_else(current_year);
            for option in report_type.period_catalogue(from_year, to_year) {
                println!("{:<12} {}", option.value, option.label);
            }
        }
        Some(Commands::Months {
            report_type,
            period,
        }) => {
            let report_type: ReportType = report_type.parse()?;
            let resolved = resolve_months(report_type, &period);
            if resolved.is_empty() {
                eprintln!("Select a valid period: '{}' does not resolve", period);
            } else {
                for month in resolved.months {
                    println!("{}", month);
                }
            }
        }
        Some(Commands::Canonicalise { kind, name }) => {
            let id = match kind {
                IdKind::Location => canonical_location_id(&name),
                IdKind::Disease => canonical_disease_id(&name),
            };
            if id.is_empty() {
                eprintln!("'{}' has no usable characters", name);
            } else {
                println!("{}", id);
            }
        }
        Some(Commands::Report {
            snapshot,
            registry,
            report_type,
            period,
            diseases,
            locations,
            intervals,
        }) => {
            let mut context = load_snapshot(&snapshot)?;
            if let Some(path) = registry {
                context = context.with_registry(Arc::new(load_registry_yaml(&path)?));
            }

            let mut request = ReportRequest::new(report_type.parse()?, period);
            if !diseases.is_empty() {
                request = request.with_diseases(DiseaseSelection::only(
                    diseases
                        .iter()
                        .map(|d| DiseaseId::parse(d))
                        .collect::<Result<Vec<_>, _>>()?,
                ));
            }
            if !locations.is_empty() {
                request = request.with_locations(
                    locations
                        .iter()
                        .map(|l| LocationId::parse(l))
                        .collect::<Result<_, _>>()?,
                );
            }
            if !intervals.is_empty() {
                request = request.with_intervals(
                    intervals
                        .iter()
                        .map(|i| i.parse::<AgeInterval>())
                        .collect::<Result<_, _>>()?,
                );
            }

            match context.run(&request) {
                Ok(report) => print!("{}", render_report(&report)),
                Err(e) => eprintln!("{}", e),
            }
        }
        None => {
            println!("Use 'epi --help' for commands");
        }
    }

    Ok(())
}

/// Renders the report matrix as a plain-text table with row, column and grand totals.
fn render_report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.title);

    if report.matrix.is_empty() {
        let _ = writeln!(out, "No data to display.");
        return out;
    }

    let location_width = report
        .matrix
        .rows()
        .iter()
        .map(|r| r.location.as_str().len())
        .max()
        .unwrap_or(0)
        .max("Total".len());

    let _ = write!(out, "{:<location_width$}", "Location");
    for interval in report.matrix.intervals() {
        for sex in Sex::ALL {
            let _ = write!(out, " {:>10}", format!("{} {}", interval.label(), sex.as_str()));
        }
    }
    let _ = writeln!(out, " {:>7} {:>7} {:>7}", "M", "F", "Total");

    for row in report.matrix.rows() {
        let _ = write!(out, "{:<location_width$}", row.location.as_str());
        for cell in &row.cells {
            let _ = write!(out, " {:>10} {:>10}", cell.m, cell.f);
        }
        let totals = report
            .totals
            .per_location
            .get(&row.location)
            .copied()
            .unwrap_or_default();
        let _ = writeln!(out, " {:>7} {:>7} {:>7}", totals.m, totals.f, totals.total);
    }

    let _ = write!(out, "{:<location_width$}", "Total");
    for interval in report.matrix.intervals() {
        let column = report
            .totals
            .per_column
            .get(interval)
            .copied()
            .unwrap_or_default();
        let _ = write!(out, " {:>10} {:>10}", column.m, column.f);
    }
    let grand = report.totals.grand;
    let _ = writeln!(out, " {:>7} {:>7} {:>7}", grand.m, grand.f, grand.total);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use epi_core::{RecordStore, Registry, ReportingContext};
    use std::collections::BTreeMap;

    fn report() -> Report {
        let registry = Registry::from_parts(["Flu"], ["EPSP: Casbah"]).unwrap();
        let store = RecordStore::from_backend(BTreeMap::from([(
            "k".to_string(),
            serde_json::json!({
                "monthId": "2025-01",
                "disease": "Flu",
                "data": {"EPSP_Casbah": {"M_0_1": 5, "F_0_1": 3}}
            }),
        )]));
        ReportingContext::new(Arc::new(registry), Arc::new(store))
            .run(
                &ReportRequest::new(ReportType::Monthly, "2025-01")
                    .with_intervals(vec![AgeInterval::Under1]),
            )
            .unwrap()
    }

    #[test]
    fn table_has_header_rows_and_totals() {
        let text = render_report(&report());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "All Diseases Report for 2025-01");
        assert!(lines[1].starts_with("Location"));
        assert!(lines[1].contains("0-1 M"));
        assert!(lines[2].starts_with("EPSP_Casbah"));
        assert!(lines[2].trim_end().ends_with("5       3       8"));
        assert!(lines[3].starts_with("Total"));
        assert!(lines[3].trim_end().ends_with('8'));
    }

    #[test]
    fn cli_parses_report_arguments() {
        let cli = Cli::try_parse_from([
            "epi",
            "report",
            "--snapshot",
            "snap.json",
            "--type",
            "quarterly",
            "--period",
            "2025_Q1",
            "--location",
            "EPSP_Casbah",
            "--location",
            "EPSP_Hydra",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Report {
                report_type,
                locations,
                diseases,
                ..
            }) => {
                assert_eq!(report_type, "quarterly");
                assert_eq!(locations.len(), 2);
                assert!(diseases.is_empty());
            }
            _ => panic!("expected report command"),
        }
    }
}
