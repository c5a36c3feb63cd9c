// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{anyhow, bail, Context, Result};
use campus_compass::catalog::EMBEDDED_SEED;
use campus_compass::config;
use campus_compass::{
    check_catalog, export_csv, Catalog, CatalogFilter, College, ComparisonSet, Config, Highlight,
    QueryOutcome, QueryService, Served,
};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str);

    // Log lines would tear the TUI unless asked for explicitly
    let log_filter = if command.is_none() && env::var_os("CAMPUS_LOG").is_none() {
        "off".to_string()
    } else {
        config::log_filter()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_filter))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let service = QueryService::embedded(&config).context("Failed to load embedded catalog")?;
    let rest = args.get(1..).unwrap_or_default();

    match command {
        Some("list") => {
            let filter = parse_filter(rest)?;
            let outcome = runtime.block_on(service.fetch_catalog(&filter));
            print_outcome(&outcome);
        }
        Some("search") => {
            let query = rest.join(" ");
            let outcome = runtime.block_on(service.search_catalog(&query));
            print_outcome(&outcome);
        }
        Some("show") => {
            let id = rest.first().ok_or_else(|| anyhow!("Usage: campus show <id>"))?;
            let catalog = load_catalog(&runtime, &service);
            let college = catalog
                .find_by_id(id)
                .ok_or_else(|| anyhow!("College not found: {}", id))?;
            print_college(college);
        }
        Some("compare") => run_compare(&load_catalog(&runtime, &service), &config, rest)?,
        Some("check") => run_check(rest.first().map(Path::new))?,
        Some("export") => {
            let path = rest.first().ok_or_else(|| anyhow!("Usage: campus export <path.csv>"))?;
            let catalog = load_catalog(&runtime, &service);
            let rows = export_csv(catalog.colleges(), Path::new(path))?;
            println!("✓ Exported {} colleges to {}", rows, path);
        }
        Some("help") | Some("--help") | Some("-h") => print_usage(),
        Some(other) => {
            print_usage();
            bail!("Unknown command: {}", other);
        }
        None => run_ui_mode(runtime, service, &config)?,
    }

    Ok(())
}

fn print_usage() {
    println!("🎓 Campus Compass {}", campus_compass::VERSION);
    println!();
    println!("Usage:");
    println!("  campus                                  Interactive browser (TUI)");
    println!("  campus list [--type T] [--location L] [--rating R]");
    println!("  campus search <query>");
    println!("  campus show <id>");
    println!("  campus compare <id> <id> [<id>]");
    println!("  campus check [seed.json]                Validate a catalog seed");
    println!("  campus export <path.csv>");
}

fn parse_filter(args: &[String]) -> Result<CatalogFilter> {
    let mut filter = CatalogFilter::new();
    let mut iter = args.iter();

    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("Missing value for {}", flag))?;
        filter = match flag.as_str() {
            "--type" => filter.with_type(value.as_str()),
            "--location" => filter.with_location(value.as_str()),
            "--rating" => {
                let rating: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid rating: {}", value))?;
                filter.with_rating(rating)
            }
            other => bail!("Unknown option: {}", other),
        };
    }

    Ok(filter)
}

/// Whole catalog through the source, warning when the saved copy is used
fn load_catalog(runtime: &tokio::runtime::Runtime, service: &QueryService) -> Catalog {
    let (catalog, served) = runtime.block_on(service.load_catalog());
    if served == Served::Fallback {
        eprintln!("⚠️  Catalog source unavailable, showing last saved catalog");
    }
    catalog
}

fn print_outcome(outcome: &QueryOutcome) {
    if outcome.is_fallback() {
        eprintln!("⚠️  Catalog source unavailable, showing last saved catalog");
    }
    if outcome.colleges.is_empty() {
        println!("No colleges match.");
        return;
    }

    println!("{:<4} {:<52} {:<22} {:>6}  {}", "ID", "Name", "Type", "Rating", "Location");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for c in &outcome.colleges {
        println!(
            "{:<4} {:<52} {:<22} {:>6.1}  {}",
            c.id, c.name, c.college_type, c.rating, c.location
        );
    }
    println!("\n{} colleges", outcome.colleges.len());
}

fn print_college(c: &College) {
    println!("🏛️  {}", c.name);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Type:         {}", c.college_type);
    println!("Location:     {}", c.location);
    println!("Established:  {}", c.established_label());
    println!("Rating:       {:.1} ({} reviews)", c.rating, c.review_count);
    println!("Students:     {}", c.students_count);
    println!("Courses:      {}", c.courses_count);
    println!("Placement:    {}%  avg package {}", c.placement_rate, c.avg_package);
    println!("Rankings:     NIRF {}  QS {}", c.rankings.nirf, c.rankings.qs);
    println!("Fees:         tuition {}  hostel {}", c.fees.tuition, c.fees.hostel);
    println!("Campus:       {}", c.campus_size);

    if !c.accreditation.is_empty() {
        println!("Accredited:   {}", c.accreditation.join(", "));
    }
    if !c.top_recruiters.is_empty() {
        println!("Recruiters:   {}", c.top_recruiters.join(", "));
    }
    if let Some(stats) = &c.placement_stats {
        println!(
            "Placed:       {} of {} ({}%)",
            stats.placed_students, stats.total_students, stats.placement_percentage
        );
    }
    for cutoff in &c.branch_cutoffs {
        println!("Cutoff:       {} {}", cutoff.branch, cutoff.rank);
    }
    for h in &c.highlights {
        println!("  • {}", h);
    }
    if !c.best_feature.is_empty() {
        println!("\n✨ {}", c.best_feature);
    }
    if !c.description.is_empty() {
        println!("\n{}", c.description);
    }
}

fn run_compare(catalog: &Catalog, config: &Config, ids: &[String]) -> Result<()> {
    if ids.len() < 2 {
        bail!("Usage: campus compare <id> <id> [<id>]");
    }

    let mut set = ComparisonSet::new(config.compare_max);
    for id in ids {
        let college = catalog
            .find_by_id(id)
            .ok_or_else(|| anyhow!("College not found: {}", id))?;
        set.add(college)?;
    }

    let table = set.table();
    print!("{:<24}", "");
    for c in set.selected() {
        print!("{:<34}", truncate(&c.name, 32));
    }
    println!();

    for row in &table.rows {
        print!("{:<24}", row.label);
        for cell in &row.cells {
            let marker = match cell.highlight {
                Highlight::Best => "★ ",
                Highlight::Worst => "▼ ",
                Highlight::Neutral => "",
            };
            print!("{:<34}", truncate(&format!("{}{}", marker, cell.display), 32));
        }
        println!();
    }

    Ok(())
}

fn run_check(path: Option<&Path>) -> Result<()> {
    let seed = match path {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read {}", p.display()))?,
        None => EMBEDDED_SEED.to_string(),
    };
    let colleges: Vec<College> = serde_json::from_str(&seed).context("Catalog seed is malformed")?;

    println!("🔍 Checking {} colleges", colleges.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (reports, summary) = check_catalog(&colleges);
    for report in reports.iter().filter(|r| r.failed_count > 0) {
        println!("{}", report.summary());
        for failure in report.failures() {
            println!("   {:?} {}: {}", failure.severity, failure.field, failure.message);
        }
    }

    println!("\n{}", summary.summary());
    if !summary.is_loadable() {
        bail!("Catalog has critical issues");
    }
    println!("✅ Catalog is loadable");
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(runtime: tokio::runtime::Runtime, service: QueryService, config: &Config) -> Result<()> {
    let mut app = ui::App::new(
        std::sync::Arc::new(service),
        runtime.handle().clone(),
        config.compare_max,
    );
    ui::run_ui(&mut app)?;

    runtime.shutdown_background();
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_runtime: tokio::runtime::Runtime, _service: QueryService, _config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin campus-server --features server");
    std::process::exit(1);
}
