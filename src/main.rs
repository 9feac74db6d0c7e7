use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use raps_wealth::api::{SipArgs, build_sip_request, request_rng, run_http_server};
use raps_wealth::core::{FundCatalog, SipTotals, format_inr, generate_history, project};

#[derive(Parser, Debug)]
#[command(
    name = "raps-wealth",
    about = "Mutual fund explorer: SIP projections, comparisons and a portfolio dashboard"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "RAPS_CATALOG",
        help = "Fund catalog JSON file; the built-in catalog is used when absent"
    )]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API and the web page
    Serve(ServeArgs),
    /// Print a month-by-month SIP ledger and summary
    Sip(SipArgs),
    /// Print a synthesized NAV history for one fund
    History(HistoryArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "RAPS_PORT", default_value_t = 8080)]
    port: u16,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[arg(long, default_value = "1")]
    fund: String,
    #[arg(long, default_value_t = 30)]
    days: usize,
    #[arg(long)]
    seed: Option<u64>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn load_catalog(path: Option<&PathBuf>) -> Result<FundCatalog, String> {
    match path {
        Some(path) => FundCatalog::load(path)
            .map_err(|e| format!("could not load catalog {}: {e}", path.display())),
        None => Ok(FundCatalog::builtin()),
    }
}

fn print_totals(label: &str, totals: &SipTotals) {
    println!("{label}");
    println!("  Total invested : {}", format_inr(totals.total_amount));
    println!("  Total units    : {:.4}", totals.total_units);
    println!("  Current value  : {}", format_inr(totals.current_value));
    println!("  Profit         : {}", format_inr(totals.profit));
    println!("  Returns        : {:.2}%", totals.returns);
}

fn run_sip(catalog: &FundCatalog, args: &SipArgs) -> Result<(), String> {
    let request = build_sip_request(args)?;
    let fund = catalog.resolve(&args.fund);
    let mut rng = request_rng(args.seed);
    let report = project(fund, &request, &mut rng);

    println!("{} ({})", fund.name, fund.category);
    println!(
        "{:>4}  {:<10}  {:>10}  {:>10}  {:>12}  {:>14}",
        "No", "Date", "NAV", "Amount", "Cum. units", "Value"
    );
    for row in &report.ledger {
        println!(
            "{:>4}  {:<10}  {:>10.2}  {:>10.0}  {:>12.4}  {:>14.0}",
            row.sequence,
            row.date,
            row.nav,
            row.regular.amount,
            row.regular.cumulative_units,
            row.regular.current_value
        );
    }

    println!();
    println!("Installments: {}", report.summary.installments);
    print_totals("Regular SIP", &report.summary.regular);
    if let Some(top_up) = &report.summary.top_up {
        print_totals("Top-up SIP", top_up);
    }
    Ok(())
}

fn run_history(catalog: &FundCatalog, args: &HistoryArgs) {
    let fund = catalog.resolve(&args.fund);
    let mut rng = request_rng(args.seed);
    let today = Local::now().date_naive();
    println!("{} NAV, last {} days", fund.name, args.days);
    for point in generate_history(fund.nav, args.days, today, &mut rng) {
        println!("{}  {:>10.2}", point.date, point.nav);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let catalog = match load_catalog(cli.catalog.as_ref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Serve(args) => {
            if let Err(e) = run_http_server(args.port, catalog).await {
                tracing::error!("Server error: {e}");
                return ExitCode::FAILURE;
            }
        }
        Command::Sip(args) => {
            if let Err(e) = run_sip(&catalog, &args) {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
        Command::History(args) => run_history(&catalog, &args),
    }
    ExitCode::SUCCESS
}
