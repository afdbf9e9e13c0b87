//! paylist-runner: headless payment listing runner.
//!
//! Usage:
//!   paylist-runner --db payments.db --status publish --page 2
//!   paylist-runner --seed 42 --count 120 --search smith --orderby amount --order asc
//!   paylist-runner --seed 42 --ipc-mode

use anyhow::Result;
use paylist_core::{
    bulk::{BulkAction, BulkActionHook},
    config::ListingConfig,
    counts::status_views,
    engine::{ListingEngine, PageResult},
    error::ListingResult,
    filter::FilterSpec,
    fixtures::{seed_store, PaymentGenerator},
    format::{DefaultFormatter, RowView},
    store::SqliteStore,
    types::RecordId,
};
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Counts,
    List {
        #[serde(default)]
        query: BTreeMap<String, String>,
    },
    BulkAction {
        action: String,
        ids: Vec<RecordId>,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct ListResponse<'a> {
    total_count: u64,
    total_pages: u64,
    current_page: u32,
    rows: Vec<RowView>,
    views: Vec<paylist_core::counts::StatusView>,
    filter: &'a FilterSpec,
}

/// Logs every bulk action the engine reports.
struct AuditLogHook;

impl BulkActionHook for AuditLogHook {
    fn name(&self) -> &'static str {
        "audit_log"
    }

    fn on_bulk_action(&mut self, id: RecordId, action: &BulkAction) -> ListingResult<()> {
        log::info!("audit: bulk action '{}' on payment {id}", action.name());
        Ok(())
    }
}

/// Request parameters accepted on the command line, keyed by their
/// listing query names.
const QUERY_FLAGS: &[(&str, &str)] = &[
    ("--status", "status"),
    ("--page", "paged"),
    ("--per-page", "per_page"),
    ("--orderby", "orderby"),
    ("--order", "order"),
    ("--user", "user"),
    ("--search", "s"),
    ("--year", "year"),
    ("--month", "m"),
    ("--day", "day"),
    ("--mode", "mode"),
];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = arg_value(&args, "--seed").and_then(|s| s.parse::<u64>().ok());
    let count = parse_arg(&args, "--count", 35usize);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = arg_value(&args, "--db").unwrap_or(":memory:");

    let config = match arg_value(&args, "--config") {
        Some(path) => ListingConfig::load(path)?,
        None => ListingConfig::default(),
    };

    let store = SqliteStore::open(db)?;
    store.migrate()?;

    let mut formatter = DefaultFormatter::new(config.display.clone());
    if let Some(seed) = seed {
        let mut generator = PaymentGenerator::new(seed);
        for (id, name) in generator.registered_users() {
            formatter.register_user(id, name);
        }
        let payments = generator.generate(count);
        seed_store(&store, &payments)?;
    }

    let mut engine = ListingEngine::new(store);
    engine.register_hook(Box::new(AuditLogHook));

    if ipc_mode {
        return run_ipc_loop(&mut engine, &formatter, &config);
    }

    if let Some(ids) = arg_value(&args, "--delete") {
        let ids = ids
            .split(',')
            .map(|s| s.trim().parse::<RecordId>())
            .collect::<Result<Vec<_>, _>>()?;
        let report = engine.delete_records(&ids, "delete");
        println!(
            "deleted: {:?}  failed: {:?}",
            report.succeeded,
            report.failed_ids()
        );
        println!();
    }

    let query: Vec<(&str, &str)> = QUERY_FLAGS
        .iter()
        .filter_map(|(flag, key)| arg_value(&args, flag).map(|v| (*key, v)))
        .collect();
    let spec = FilterSpec::from_query(query, config.per_page)?;
    let page = engine.fetch_page(spec.clone())?;
    print_listing(&engine, &formatter, &spec, &page)?;

    Ok(())
}

fn run_ipc_loop(
    engine: &mut ListingEngine<SqliteStore>,
    formatter: &DefaultFormatter,
    config: &ListingConfig,
) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("ipc: unreadable command: {e}");
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Counts => match engine.compute_counts() {
                Ok(counts) => writeln!(stdout, "{}", serde_json::to_string(&counts)?)?,
                Err(e) => write_error(&mut stdout, &e.to_string())?,
            },
            IpcCommand::List { query } => {
                let result = FilterSpec::from_query(&query, config.per_page).and_then(|spec| {
                    let page = engine.fetch_page(spec.clone())?;
                    let counts = engine.compute_counts()?;
                    Ok((spec, page, counts))
                });
                match result {
                    Ok((spec, page, counts)) => {
                        let response = ListResponse {
                            total_count: page.total_count,
                            total_pages: page.total_pages,
                            current_page: page.current_page,
                            rows: page.render(formatter),
                            views: status_views(&counts, &spec.status),
                            filter: &spec,
                        };
                        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
                    }
                    Err(e) => write_error(&mut stdout, &e.to_string())?,
                }
            }
            IpcCommand::BulkAction { action, ids } => {
                let report = engine.delete_records(&ids, &action);
                writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(out, "{}", err_json)?;
    out.flush()?;
    Ok(())
}

fn print_listing(
    engine: &ListingEngine<SqliteStore>,
    formatter: &DefaultFormatter,
    spec: &FilterSpec,
    page: &PageResult,
) -> Result<()> {
    let counts = engine.compute_counts()?;
    let tabs: Vec<String> = status_views(&counts, &spec.status)
        .into_iter()
        .map(|v| {
            let marker = if v.current { "*" } else { "" };
            format!("{marker}{} ({})", v.label, v.count)
        })
        .collect();

    println!("=== PAYMENTS ===");
    println!("  {}", tabs.join(" | "));
    println!(
        "  page {}/{}  ({} matching, {} per page)",
        page.current_page, page.total_pages, page.total_count, page.page_size
    );
    println!();

    let rows = page.render(formatter);
    if rows.is_empty() {
        println!("  (No payments found)");
        return Ok(());
    }
    for row in &rows {
        println!(
            "  #{:<6} {:<36} {:>12}  {:<20} {:<20} {}",
            row.id, row.email, row.amount, row.date, row.user, row.status
        );
        let details = &row.details;
        for line in &details.items {
            println!("           - {line}");
        }
        println!(
            "           {}  discount: {}  buyer: {} <{}>",
            details.date_time, details.discount, details.buyer_name, details.buyer_email
        );
        if let Some(method) = &details.payment_method {
            println!("           method: {method}  key: {}", details.purchase_key);
        } else {
            println!("           key: {}", details.purchase_key);
        }
    }
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    arg_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
