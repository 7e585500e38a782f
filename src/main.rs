// Entry point and interactive CLI flow.
//
// - Option [1] loads the data files, printing diagnostics.
// - Option [2] generates every report the configured role may open: a
//   TAP → Salesforce summary and/or the detail table, previewed on the
//   console and exported to the output directory.
// - After generating reports, the user can go back to the menu or exit.
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use once_cell::sync::Lazy;
use sales_report::access::{AccessPolicy, ReportKind, UserRole};
use sales_report::config::AppConfig;
use sales_report::loader::{DataSource, Dataset, JsonSource, OmzetCsvSource};
use sales_report::output;
use sales_report::reports::{self, OmzetScope, SalesPlanScope, SummaryColumn};
use sales_report::rollup::{collapse, outer_keys, RollupSpec, RowKind, SummaryRow};
use sales_report::table::{Column, TableView};
use sales_report::types::{
    D2cSalesRecord, OmzetOutletRecord, Period, SalesPlanRecord, SellThruRecord, StockDetailRecord,
    StockSummaryRecord,
};
use sales_report::util::{self, DateRange};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Sales report generator for stock, omzet, sales plan, sell-thru and D2C data
#[derive(Parser, Debug)]
#[command(name = "sales_report")]
#[command(about = "Summarize and export outlet sales reports")]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the data files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory the exports are written to
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Role used to decide which reports are available, e.g. "Manager"
    #[arg(long)]
    role: Option<UserRole>,

    /// Detail table page size
    #[arg(long)]
    page_size: Option<usize>,

    /// First day of the date range (YYYY-MM-DD, inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day of the date range (YYYY-MM-DD, inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Sales plan period: Total or W1..W5
    #[arg(long, default_value = "Total")]
    period: Period,

    /// Show only the subtotal of this TAP in summary previews (repeatable)
    #[arg(long = "collapse", value_name = "TAP")]
    collapse: Vec<String>,

    /// Show only subtotals and the grand total in summary previews
    #[arg(long)]
    collapse_all: bool,
}

// Loaded data sets live for the whole session so the files are read once but
// reports can be generated many times.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    stock_summary: Dataset<StockSummaryRecord>,
    stock_detail: Dataset<StockDetailRecord>,
    omzet: Dataset<OmzetOutletRecord>,
    sales_plan: Dataset<SalesPlanRecord>,
    sell_thru_perdana: Dataset<SellThruRecord>,
    sell_thru_voucher: Dataset<SellThruRecord>,
    d2c: Dataset<D2cSalesRecord>,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Session {
    config: AppConfig,
    policy: AccessPolicy,
    dates: DateRange,
    period: Period,
}

/// `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn refresh<R>(name: &str, dataset: &mut Dataset<R>, source: &dyn DataSource<R>) {
    match dataset.refresh(source) {
        Ok(n) => println!("{}: {} rows loaded from {}", name, util::format_int(n as u64), source.describe()),
        Err(e) => {
            eprintln!("{}: failed to load {}: {}", name, source.describe(), e);
            if dataset.is_loaded() {
                println!("{}: keeping the {} rows loaded earlier", name, util::format_int(dataset.records().len() as u64));
            }
        }
    }
}

/// Option [1]: (re)load every data file.
fn handle_load(session: &Session) {
    let cfg = &session.config;
    let mut state = state();
    refresh(
        "Stock Voucher Summary",
        &mut state.stock_summary,
        &JsonSource::<StockSummaryRecord>::new(cfg.stock_summary_path()),
    );
    refresh(
        "Stock Voucher Detail",
        &mut state.stock_detail,
        &JsonSource::<StockDetailRecord>::new(cfg.stock_detail_path()),
    );
    refresh("Omzet Outlet", &mut state.omzet, &OmzetCsvSource::new(cfg.omzet_path()));
    refresh(
        "Sales Plan Voucher",
        &mut state.sales_plan,
        &JsonSource::<SalesPlanRecord>::new(cfg.sales_plan_path()),
    );
    refresh(
        "Sell Thru Digipos Perdana",
        &mut state.sell_thru_perdana,
        &JsonSource::<SellThruRecord>::new(cfg.sell_thru_perdana_path()),
    );
    refresh(
        "Sell Thru Digipos Voucher",
        &mut state.sell_thru_voucher,
        &JsonSource::<SellThruRecord>::new(cfg.sell_thru_voucher_path()),
    );
    refresh(
        "Penjualan D2C",
        &mut state.d2c,
        &JsonSource::<D2cSalesRecord>::new(cfg.d2c_path()),
    );
    println!();
}

/// Summary rows shown in the preview: TAP groups named in the config (or all
/// of them) keep only their subtotal.
fn visible_rows(cfg: &AppConfig, rows: &[SummaryRow]) -> Vec<SummaryRow> {
    let wanted: Vec<String> = cfg.collapsed_taps.iter().map(|t| t.trim().to_uppercase()).collect();
    let collapsed: BTreeSet<String> = outer_keys(rows)
        .into_iter()
        .filter(|k| cfg.collapse_all || wanted.contains(&k.to_uppercase()))
        .collect();
    collapse(rows, &collapsed)
}

/// A TAP → Salesforce summary of one data set.
struct SummaryPlan<R> {
    title: String,
    file_prefix: String,
    note: String,
    spec: RollupSpec<R>,
    columns: Vec<SummaryColumn>,
}

fn run_summary<R>(session: &Session, plan: SummaryPlan<R>, records: &[R]) -> Result<()> {
    let cfg = &session.config;
    let today = Local::now().date_naive();

    let rows = plan.spec.rollup(records);
    let groups = rows.iter().filter(|r| r.kind == RowKind::Subtotal).count();
    let shown = visible_rows(cfg, &rows);
    output::preview_table(
        &format!("{} Summary", plan.title),
        Some(&format!("{}; {} TAP groups", plan.note, groups)),
        &output::summary_table(&shown, "Salesforce", &plan.columns),
        if shown.len() < rows.len() { shown.len() } else { cfg.preview_rows },
    );

    let summary = output::summary_table(&rows, "Salesforce", &plan.columns);
    let summary_path = cfg.out_dir.join(format!("summary_{}_{}.csv", plan.file_prefix, today.format("%Y-%m-%d")));
    output::write_csv(&summary_path, &summary).with_context(|| format!("writing {}", summary_path.display()))?;
    let json_path = summary_path.with_extension("json");
    output::write_json(&json_path, &output::summary_records(&rows, &plan.columns))
        .with_context(|| format!("writing {}", json_path.display()))?;
    println!("(Summary exported to {} and {})\n", summary_path.display(), json_path.display());
    info!(report = %plan.title, rows = rows.len(), "summary generated");
    Ok(())
}

/// The filterable detail table of one data set.
struct DetailPlan<R> {
    title: String,
    file_prefix: String,
    columns: Vec<Column<R>>,
}

fn run_detail<R>(session: &Session, plan: DetailPlan<R>, records: &[R]) -> Result<()> {
    let cfg = &session.config;
    let today = Local::now().date_naive();

    let view = TableView::new(plan.columns, cfg.page_size);
    let page = view.current_page(records);
    let options = view.unique_options(records);
    let option_counts: Vec<String> = options
        .iter()
        .filter_map(|(key, values)| view.column(key).map(|c| format!("{} ({})", c.header, values.len())))
        .collect();
    let detail = output::export_rows(&view, records);
    output::preview_table(
        &format!("Detail {}", plan.title),
        Some(&format!(
            "page {} of {}, {} rows; filters: {}",
            page.page,
            page.total_pages,
            util::format_int(page.total_count as u64),
            option_counts.join(", ")
        )),
        &detail,
        cfg.preview_rows.min(cfg.page_size),
    );
    let detail_path = cfg
        .out_dir
        .join(output::export_file_name(&format!("detail_{}", plan.file_prefix), today));
    output::write_xlsx(&detail_path, &plan.title, &detail)
        .with_context(|| format!("writing {}", detail_path.display()))?;
    println!("(Full table exported to {})\n", detail_path.display());
    info!(report = %plan.title, rows = detail.len(), "detail generated");
    Ok(())
}

fn generate(session: &Session, kind: ReportKind, state: &AppState) -> Result<()> {
    let label = session.config.grand_total_label.as_str();
    let title = kind.title().to_string();
    let grouped = "Grouped by TAP and Salesforce".to_string();
    match kind {
        ReportKind::StockVoucher => {
            if state.stock_summary.is_loaded() {
                let plan = SummaryPlan {
                    title: title.clone(),
                    file_prefix: "stock_voucher".to_string(),
                    note: grouped,
                    spec: reports::stock_summary(label),
                    columns: reports::stock_summary_columns(),
                };
                run_summary(session, plan, state.stock_summary.records())?;
            }
            if state.stock_detail.is_loaded() {
                let plan = DetailPlan {
                    title,
                    file_prefix: "stock_voucher".to_string(),
                    columns: reports::stock_columns(),
                };
                run_detail(session, plan, state.stock_detail.records())?;
            }
            Ok(())
        }
        ReportKind::OmzetOutlet => {
            let records = OmzetScope { dates: session.dates }.apply(state.omzet.records());
            let summary = SummaryPlan {
                title: title.clone(),
                file_prefix: "omzet_outlet".to_string(),
                note: grouped,
                spec: reports::omzet_summary(label),
                columns: reports::omzet_summary_columns(),
            };
            run_summary(session, summary, &records)?;
            let detail = DetailPlan {
                title,
                file_prefix: "omzet_outlet".to_string(),
                columns: reports::omzet_columns(),
            };
            run_detail(session, detail, &records)
        }
        ReportKind::SalesPlanVoucher => {
            let scope = SalesPlanScope {
                period: session.period,
                dates: session.dates,
                ..SalesPlanScope::default()
            };
            let opts = reports::sales_plan_options(state.sales_plan.records());
            println!(
                "Sales plan options: flags [{}], validity [{}], paket [{}]",
                opts.flags.join(", "),
                opts.validities.join(", "),
                opts.pakets.join(", ")
            );
            let records = scope.apply(state.sales_plan.records());
            let summary = SummaryPlan {
                title: title.clone(),
                file_prefix: "sales_plan_voucher".to_string(),
                note: format!("Period {}", session.period),
                spec: reports::sales_plan_summary(session.period, label),
                columns: reports::sales_plan_summary_columns(),
            };
            run_summary(session, summary, &records)?;
            let detail = DetailPlan {
                title,
                file_prefix: "sales_plan_voucher".to_string(),
                columns: reports::sales_plan_columns(session.period),
            };
            run_detail(session, detail, &records)
        }
        ReportKind::SellThruDigipos => {
            let lines = [
                ("Perdana", "perdana", &state.sell_thru_perdana),
                ("Voucher Fisik", "voucher", &state.sell_thru_voucher),
            ];
            for (line, suffix, dataset) in lines {
                if !dataset.is_loaded() {
                    continue;
                }
                let summary = SummaryPlan {
                    title: format!("{} {}", title, line),
                    file_prefix: format!("sell_thru_digipos_{}", suffix),
                    note: grouped.clone(),
                    spec: reports::sell_thru_summary(label),
                    columns: reports::sell_thru_summary_columns(),
                };
                run_summary(session, summary, dataset.records())?;
                let detail = DetailPlan {
                    title: format!("{} {}", title, line),
                    file_prefix: format!("sell_thru_digipos_{}", suffix),
                    columns: reports::sell_thru_columns(),
                };
                run_detail(session, detail, dataset.records())?;
            }
            Ok(())
        }
        ReportKind::PenjualanD2c => {
            let detail = DetailPlan {
                title,
                file_prefix: "penjualan_d2c".to_string(),
                columns: reports::d2c_columns(),
            };
            run_detail(session, detail, state.d2c.records())
        }
    }
}

fn is_loaded(state: &AppState, kind: ReportKind) -> bool {
    match kind {
        ReportKind::StockVoucher => state.stock_summary.is_loaded() || state.stock_detail.is_loaded(),
        ReportKind::OmzetOutlet => state.omzet.is_loaded(),
        ReportKind::SalesPlanVoucher => state.sales_plan.is_loaded(),
        ReportKind::SellThruDigipos => state.sell_thru_perdana.is_loaded() || state.sell_thru_voucher.is_loaded(),
        ReportKind::PenjualanD2c => state.d2c.is_loaded(),
    }
}

/// Option [2]: generate every report the role may open.
fn handle_generate_reports(session: &Session) {
    let role = session.config.role;
    let state = state();
    if !ReportKind::ALL.iter().any(|k| is_loaded(&state, *k)) {
        println!("Error: No data loaded. Please load the data files first (option 1).\n");
        return;
    }
    if let Err(e) = std::fs::create_dir_all(&session.config.out_dir) {
        eprintln!("Cannot create {}: {}\n", session.config.out_dir.display(), e);
        return;
    }

    println!("Generating reports for {}...", role);
    for kind in ReportKind::ALL {
        if let Err(e) = session.policy.check(role, kind) {
            println!("Skipping {}: {}", kind, e);
            continue;
        }
        if !is_loaded(&state, kind) {
            println!("Skipping {}: no data loaded", kind);
            continue;
        }
        if let Err(e) = generate(session, kind, &state) {
            warn!(report = %kind, error = %e, "report failed");
            eprintln!("Write error: {:#}", e);
        }
    }
}

fn build_config(args: &Args) -> Result<AppConfig> {
    let mut cfg = match &args.config {
        Some(path) => AppConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        cfg.data_dir = dir.clone();
    }
    if let Some(dir) = &args.out_dir {
        cfg.out_dir = dir.clone();
    }
    if let Some(role) = args.role {
        cfg.role = role;
    }
    if let Some(size) = args.page_size {
        cfg.page_size = size;
    }
    if !args.collapse.is_empty() {
        cfg.collapsed_taps = args.collapse.clone();
    }
    if args.collapse_all {
        cfg.collapse_all = true;
    }
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let policy = AccessPolicy::default();
    info!(role = %config.role, reports = ?policy.reports_for(config.role), "session started");

    let session = Session {
        config,
        policy,
        dates: DateRange::new(args.from, args.to),
        period: args.period,
    };

    loop {
        println!("Select Report Action:");
        println!("[1] Load the data files");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&session),
            "2" => {
                println!();
                handle_generate_reports(&session);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
    Ok(())
}
