// Entry point and high-level console flow.
//
// The binary is the thin interaction shell over the analytics core:
// - Option [1] loads and cleans the sales CSV, printing diagnostics.
// - Option [2] sets the route/weekday/month filter selection.
// - Option [3] generates the report tables and a JSON summary.
// - Option [4] exports the current filtered view to a timestamped CSV.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit.
mod filter;
mod loader;
mod output;
mod reports;
mod rules;
mod types;
mod util;

use anyhow::Result;
use clap::Parser;
use filter::FilterSelection;
use once_cell::sync::Lazy;
use rules::CleaningRules;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use types::{Record, Weekday};

/// Sales analytics console for the route delivery dataset.
///
/// Loads the sales CSV once per session, then filters, aggregates and
/// exports on demand from an interactive menu.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the sales CSV file
    #[arg(
        short,
        long,
        default_value = "dadosr.csv",
        env = "VENDAS_INPUT",
        value_name = "FILE"
    )]
    input: PathBuf,

    /// Optional TOML file overriding the cleaning rules
    /// (city aliases, weekday overrides)
    #[arg(short, long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    verbose: bool,
}

// Simple in-memory app state so we only load/clean the CSV once but can
// re-filter and re-aggregate any number of times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        data: None,
        selection: None,
    })
});

struct AppState {
    data: Option<Vec<Record>>,
    selection: Option<FilterSelection>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    read_line("Enter choice: ")
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the menu after generating reports.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        let resp = read_line("Back to the menu (Y/N): ").to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load and clean the CSV file.
///
/// On success, we store the dataset in `APP_STATE`, reset the filter
/// selection, and print a short textual summary of what happened.
fn handle_load(input: &Path, rules: &CleaningRules) {
    match loader::load_and_clean(input, rules) {
        Ok((data, load_report)) => {
            println!(
                "Processing dataset... ({} rows read, {} loaded)",
                util::format_int(load_report.total_rows as i64),
                util::format_int(load_report.loaded_rows as i64)
            );
            if load_report.parse_errors() > 0 {
                println!(
                    "Note: {} rows skipped due to parse/validation errors.",
                    util::format_int(load_report.parse_errors() as i64)
                );
                for s in load_report.skipped.iter().take(5) {
                    println!("  line {}: {}", s.line, s.reason);
                }
            }
            println!();
            info!(rows = data.len(), "dataset loaded");
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(data);
            state.selection = None;
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: choose the route/weekday/month filters.
///
/// Blank answers keep the "everything" default for that dimension, matching
/// the widget defaults of the original dashboard.
fn handle_set_filters() {
    let (route_names, default_sel) = {
        let state = APP_STATE.lock().unwrap();
        let Some(data) = state.data.as_ref() else {
            println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
            return;
        };
        (filter::routes(data), FilterSelection::all_of(data))
    };

    println!("Available routes: {}", route_names.join(", "));
    let route_input = read_line("Route (blank = all routes): ");
    let route = if route_input.is_empty() {
        None
    } else if route_names.iter().any(|r| r == &route_input) {
        Some(route_input)
    } else {
        println!("Unknown route '{}', keeping all routes.", route_input);
        None
    };

    println!(
        "Weekday names: {}",
        Weekday::ALL.map(|d| d.name()).join(", ")
    );
    let weekday_input = read_line("Weekdays, comma-separated (blank = all): ");
    let weekdays = if weekday_input.is_empty() {
        default_sel.weekdays.clone()
    } else {
        let mut set = BTreeSet::new();
        for token in weekday_input.split(',') {
            match Weekday::parse(token) {
                Some(day) => {
                    set.insert(day);
                }
                None => println!("Ignoring unknown weekday '{}'.", token.trim()),
            }
        }
        set
    };

    let month_input = read_line("Months, comma-separated (blank = all): ");
    let months = if month_input.is_empty() {
        default_sel.months.clone()
    } else {
        let mut set = BTreeSet::new();
        for token in month_input.split(',') {
            match token.trim().parse::<u32>() {
                Ok(m) => {
                    set.insert(m);
                }
                Err(_) => println!("Ignoring unknown month '{}'.", token.trim()),
            }
        }
        set
    };

    let selection = FilterSelection {
        route,
        weekdays,
        months,
    };
    println!(
        "Filters set: route = {}, {} weekday(s), {} month(s).\n",
        selection.route.as_deref().unwrap_or("all"),
        selection.weekdays.len(),
        selection.months.len()
    );
    let mut state = APP_STATE.lock().unwrap();
    state.selection = Some(selection);
}

/// Snapshot the dataset and current selection out of `APP_STATE`.
fn current_session() -> Option<(Vec<Record>, FilterSelection)> {
    let state = APP_STATE.lock().unwrap();
    let data = state.data.clone()?;
    let selection = state
        .selection
        .clone()
        .unwrap_or_else(|| FilterSelection::all_of(&data));
    Some((data, selection))
}

/// Handle option [3]: generate all report tables and the JSON summary.
///
/// This function is intentionally side-effectful: it writes one CSV per
/// report plus `summary.json`, and prints a markdown preview of each.
fn handle_generate_reports() {
    let Some((data, selection)) = current_session() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let view = filter::apply(&data, &selection);
    let all_routes = selection.route.is_none();
    if let Some(route) = &selection.route {
        println!("Selected route: {}\n", route);
    }

    let stats = reports::summary_stats(&view);
    println!("Key metrics for the current view:");
    println!("  Records:        {}", util::format_int(stats.records as i64));
    println!("  Total value:    {}", util::format_number(stats.total_value, 2));
    println!("  Total invoices: {}", util::format_int(stats.total_invoices as i64));
    println!("  Total items:    {}", util::format_int(stats.total_items as i64));
    println!("  Total weight:   {}\n", util::format_number(stats.total_weight, 2));

    println!("Generating reports...");
    println!("Outputs saved to individual files...\n");
    info!(records = view.len(), all_routes, "generating reports");

    let city_rows = reports::city_summary(&view);
    emit(1, "City Sales Summary", None, "report1_city_summary.csv", &city_rows);

    if all_routes {
        let route_rows = reports::route_summary(&view);
        emit(2, "Route Sales Summary", None, "report2_route_summary.csv", &route_rows);
    } else {
        println!("Report 2: Route Sales Summary (skipped: a single route is selected)\n");
    }

    let (top, bottom) = reports::top_bottom_cities(&view, reports::TOP_CITIES, reports::BOTTOM_CITIES);
    let top_rows = reports::city_ranking_rows(&top);
    emit(
        3,
        "Top Cities by Sales",
        Some("Top 10 by total value"),
        "report3_top_cities.csv",
        &top_rows,
    );
    let bottom_rows = reports::city_ranking_rows(&bottom);
    emit(
        4,
        "Bottom Cities by Sales",
        Some("Last 20 of the descending ranking"),
        "report4_bottom_cities.csv",
        &bottom_rows,
    );

    let weekday_rows = reports::weekday_total_rows(&reports::weekday_totals(&view));
    emit(
        5,
        "Sales by Weekday",
        Some("Canonical Monday-to-Sunday order"),
        "report5_weekday_totals.csv",
        &weekday_rows,
    );

    let weekly_rows = reports::weekly_total_rows(&reports::weekly_totals(&view));
    emit(6, "Sales by Week", None, "report6_weekly_totals.csv", &weekly_rows);

    let top_city_names: Vec<String> = top.iter().map(|(city, _)| city.clone()).collect();
    let matrix_rows = reports::city_weekday_matrix(&view, &top_city_names);
    emit(
        7,
        "Top Cities by Weekday",
        Some("Value per city and weekday, zero-filled"),
        "report7_city_weekday_matrix.csv",
        &matrix_rows,
    );

    let city_eff = reports::city_efficiency(&view);
    emit(8, "City Efficiency", None, "report8_city_efficiency.csv", &city_eff);

    if all_routes {
        let route_eff = reports::route_efficiency(&view);
        emit(9, "Route Efficiency", None, "report9_route_efficiency.csv", &route_eff);
    } else {
        println!("Report 9: Route Efficiency (skipped: a single route is selected)\n");
    }

    let sales_rows = reports::top_sales(&view, reports::TOP_SALES);
    emit(10, "Largest Individual Sales", None, "report10_top_sales.csv", &sales_rows);

    if let Err(e) = output::write_json("summary.json", &stats) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (summary.json):");
    println!(
        "{{\"total_value\": {}, \"avg_value_per_invoice\": {}}}\n",
        util::format_number(stats.total_value, 2),
        util::format_opt(stats.avg_value_per_invoice, 2)
    );
}

fn emit<T>(no: usize, title: &str, note: Option<&str>, file: &str, rows: &[T])
where
    T: tabled::Tabled + serde::Serialize + Clone,
{
    if let Err(e) = output::write_csv(file, rows) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(no, title, note, rows, 3);
    println!("(Full table exported to {})\n", file);
}

/// Handle option [4]: export the current filtered view as CSV.
fn handle_export() {
    let Some((data, selection)) = current_session() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let view = filter::apply(&data, &selection);
    match output::export_filtered(Path::new("."), &view) {
        Ok(path) => {
            println!(
                "Exported {} filtered rows to {}\n",
                util::format_int(view.len() as i64),
                path.display()
            );
        }
        Err(e) => eprintln!("Export failed: {}\n", e),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let rules = match &args.rules {
        Some(path) => CleaningRules::load(path)?,
        None => CleaningRules::default(),
    };

    loop {
        println!("Sales Analytics:");
        println!("[1] Load the file");
        println!("[2] Set filters");
        println!("[3] Generate reports");
        println!("[4] Export filtered data");
        println!("[5] Exit\n");
        match read_choice().as_str() {
            "1" => {
                handle_load(&args.input, &rules);
            }
            "2" => {
                handle_set_filters();
            }
            "3" => {
                println!();
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => {
                handle_export();
            }
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter a number between 1 and 5.\n");
            }
        }
    }
    Ok(())
}
