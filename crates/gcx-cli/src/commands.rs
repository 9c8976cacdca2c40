use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context};
use colored::Colorize;
use gcx_book::counts::indexed_counts;
use gcx_book::{Book, BookConfig, CompressionMode, LoadReport};
use gcx_types::{CmdtyCurrId, Decimal};
use gcx_xml::{read_source, Encoding};
use serde::Serialize;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Info(args) => cmd_info(args, config, cli.format),
        Command::Accounts(args) => cmd_accounts(args, config, cli.format),
        Command::Price(args) => cmd_price(args, config, cli.format),
        Command::Rewrite(args) => cmd_rewrite(args, config, cli.format),
        Command::Check(args) => cmd_check(args, config, cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BookConfig> {
    match path {
        Some(path) => BookConfig::load(path)
            .with_context(|| format!("reading config {}", path.display())),
        None => Ok(BookConfig::default()),
    }
}

fn open(path: &Path, config: BookConfig) -> anyhow::Result<Book> {
    Book::open_with(path, config).with_context(|| format!("opening {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn encoding_name(encoding: Encoding) -> &'static str {
    match encoding {
        Encoding::Plain => "plain",
        Encoding::Gzip => "gzip",
    }
}

// ---------------------------------------------------------------
// info
// ---------------------------------------------------------------

#[derive(Serialize)]
struct InfoReport<'a> {
    book_id: Option<String>,
    encoding: &'static str,
    default_currency: Option<String>,
    counts: BTreeMap<&'static str, usize>,
    report: &'a LoadReport,
}

fn info_report(book: &Book) -> InfoReport<'_> {
    InfoReport {
        book_id: book.id().map(|id| id.to_hex()),
        encoding: encoding_name(book.encoding()),
        default_currency: book.default_currency().map(ToString::to_string),
        counts: indexed_counts(book.index()),
        report: book.report(),
    }
}

fn cmd_info(args: InfoArgs, config: BookConfig, format: OutputFormat) -> anyhow::Result<()> {
    let book = open(&args.file, config)?;
    let info = info_report(&book);
    if format == OutputFormat::Json {
        return print_json(&info);
    }

    println!("Book {}", info.book_id.as_deref().unwrap_or("(no id)").yellow().bold());
    println!("  File: {} ({})", args.file.display(), info.encoding);
    println!(
        "  Default currency: {}",
        info.default_currency.as_deref().unwrap_or("none").cyan()
    );
    for (ty, n) in &info.counts {
        if *n > 0 {
            println!("  {:<18} {}", ty, n);
        }
    }
    print_load_report(info.report);
    Ok(())
}

fn print_load_report(report: &LoadReport) {
    if report.is_clean() {
        println!("{} Loaded cleanly", "✓".green().bold());
        return;
    }
    for skip in &report.skipped {
        println!("  {} {} at {:?}: {}", "skipped".red(), skip.kind, skip.origin, skip.reason);
    }
    for miss in &report.lookup_misses {
        println!(
            "  {} {} {} -> {} {}",
            "dangling".yellow(),
            miss.from,
            miss.id,
            miss.field,
            miss.target
        );
    }
    for m in &report.count_mismatches {
        println!(
            "  {} {}: declared {}, found {}",
            "count".yellow(),
            m.cd_type,
            m.declared,
            m.indexed
        );
    }
    if report.unusable_prices > 0 {
        println!("  {} {} incomplete price records", "prices".yellow(), report.unusable_prices);
    }
    if report.commodity_map_divergent {
        println!("  {} commodity and x-code maps disagree", "commodities".yellow());
    }
}

// ---------------------------------------------------------------
// accounts
// ---------------------------------------------------------------

#[derive(Debug, PartialEq, Serialize)]
struct AccountRow {
    id: String,
    name: String,
    account_type: String,
    commodity: Option<String>,
    balance: Decimal,
    default_balance: Option<Decimal>,
}

fn account_rows(book: &Book, templates: bool) -> Vec<AccountRow> {
    let index = book.index();
    let mut rows: Vec<AccountRow> = index
        .accounts
        .iter()
        .filter(|a| !a.is_root())
        .map(|a| AccountRow {
            id: a.id.to_hex(),
            name: index.full_name(&a.id).unwrap_or_else(|| a.name.clone()),
            account_type: a.account_type.as_str().to_string(),
            commodity: a.commodity.as_ref().map(ToString::to_string),
            balance: index.balance(&a.id),
            default_balance: book.balance_in_default_currency(&a.id),
        })
        .collect();
    if templates {
        rows.extend(index.template_accounts.iter().map(|a| AccountRow {
            id: a.id.to_hex(),
            name: a.name.clone(),
            account_type: a.account_type.as_str().to_string(),
            commodity: a.commodity.as_ref().map(ToString::to_string),
            balance: Decimal::ZERO,
            default_balance: None,
        }));
    }
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

fn cmd_accounts(args: AccountsArgs, config: BookConfig, format: OutputFormat) -> anyhow::Result<()> {
    let book = open(&args.file, config)?;
    let rows = account_rows(&book, args.templates);
    if format == OutputFormat::Json {
        return print_json(&rows);
    }

    for row in &rows {
        let converted = match (row.default_balance, book.default_currency()) {
            (Some(v), Some(cur)) if row.commodity.as_deref() != Some(cur.to_string().as_str()) => {
                format!("  ({} {})", v, cur.code())
            }
            _ => String::new(),
        };
        println!(
            "{:<40} {:<10} {:>16} {}{}",
            row.name.bold(),
            row.account_type.dimmed(),
            row.balance,
            row.commodity.as_deref().unwrap_or(""),
            converted.dimmed()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------
// price
// ---------------------------------------------------------------

#[derive(Debug, PartialEq, Serialize)]
struct PriceReport {
    from: String,
    to: String,
    factor: Option<Decimal>,
}

fn price_report(book: &Book, commodity: &str, to: Option<&str>) -> anyhow::Result<PriceReport> {
    let from = CmdtyCurrId::from_str(commodity).with_context(|| format!("commodity {commodity:?}"))?;
    let to = to
        .map(|raw| CmdtyCurrId::from_str(raw).with_context(|| format!("currency {raw:?}")))
        .transpose()?;
    let Some(target) = to.as_ref().or(book.default_currency()) else {
        bail!("the book has no default currency, pass --to");
    };
    let factor = book.resolve_price(&from, Some(target));
    Ok(PriceReport {
        from: from.to_string(),
        to: target.to_string(),
        factor,
    })
}

fn cmd_price(args: PriceArgs, config: BookConfig, format: OutputFormat) -> anyhow::Result<()> {
    let book = open(&args.file, config)?;
    let report = price_report(&book, &args.commodity, args.to.as_deref())?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }
    match report.factor {
        Some(factor) => println!("1 {} = {} {}", report.from.bold(), factor.to_string().green(), report.to),
        None => println!("{} no price for {} in {}", "✗".red(), report.from.bold(), report.to),
    }
    Ok(())
}

// ---------------------------------------------------------------
// rewrite
// ---------------------------------------------------------------

fn compression_mode(c: Compression) -> CompressionMode {
    match c {
        Compression::Auto => CompressionMode::Auto,
        Compression::Gzip => CompressionMode::Gzip,
        Compression::Plain => CompressionMode::Plain,
    }
}

fn cmd_rewrite(args: RewriteArgs, mut config: BookConfig, format: OutputFormat) -> anyhow::Result<()> {
    if let Some(c) = args.compression {
        config.compression = compression_mode(c);
    }
    let mut book = open(&args.input, config)?;
    book.save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let encoding = book.config().compression.encoding(book.encoding());
    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "output": args.output.display().to_string(),
            "encoding": encoding_name(encoding),
            "clean": book.report().is_clean(),
        }));
    }
    println!(
        "{} Wrote {} ({})",
        "✓".green().bold(),
        args.output.display().to_string().bold(),
        encoding_name(encoding)
    );
    if !book.report().is_clean() {
        print_load_report(book.report());
    }
    Ok(())
}

// ---------------------------------------------------------------
// check
// ---------------------------------------------------------------

#[derive(Serialize)]
struct CheckOutcome<'a> {
    clean: bool,
    round_trip: bool,
    /// 1-based line of the first difference between input and output.
    first_difference: Option<usize>,
    report: &'a LoadReport,
}

/// First line at which two documents differ, ignoring the generation
/// timestamp and the case of GUID fields.
fn first_difference(original: &str, rendered: &str) -> Option<usize> {
    fn normalize(line: &str) -> Option<String> {
        if line.starts_with("<!-- Generated ") {
            return None;
        }
        if line.contains("type=\"guid\"") {
            return Some(line.to_lowercase());
        }
        Some(line.to_string())
    }
    let mut a = original.lines().map(normalize);
    let mut b = rendered.lines().map(normalize);
    let mut line = 0;
    loop {
        line += 1;
        match (a.next(), b.next()) {
            (None, None) => return None,
            (Some(x), Some(y)) if x == y => continue,
            _ => return Some(line),
        }
    }
}

fn check_book<'a>(book: &'a Book, original: &[u8]) -> anyhow::Result<CheckOutcome<'a>> {
    let rendered = book.to_bytes()?;
    let original = String::from_utf8_lossy(original);
    let rendered = String::from_utf8_lossy(&rendered);
    let first = first_difference(&original, &rendered);
    debug!(first_difference = ?first, "compared rendered book with input");
    Ok(CheckOutcome {
        clean: book.report().is_clean(),
        round_trip: first.is_none(),
        first_difference: first,
        report: book.report(),
    })
}

fn cmd_check(args: CheckArgs, config: BookConfig, format: OutputFormat) -> anyhow::Result<()> {
    let book = open(&args.file, config)?;
    let (original, _) = read_source(&args.file)?;
    let outcome = check_book(&book, &original)?;

    if format == OutputFormat::Json {
        print_json(&outcome)?;
    } else {
        print_load_report(outcome.report);
        match outcome.first_difference {
            None => println!("{} Round trip is byte-identical", "✓".green().bold()),
            Some(line) => println!("{} Output differs from input at line {}", "✗".red().bold(), line),
        }
    }
    if !(outcome.clean && outcome.round_trip) {
        bail!("check failed for {}", args.file.display());
    }
    Ok(())
}
