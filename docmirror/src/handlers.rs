use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use docmirror_core::convert::{API_KEY_ENV, ReaderConfig, ReaderConverter};
use docmirror_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_discovery, spinner};
use docmirror_core::export::{ExportOptions, ExportSummary, export_pages, prepare_output_dir};
use docmirror_core::report::{ReportFormat, generate_report, save_report};
use docmirror_scanner::FetchConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, warn};
use url::Url;

pub fn print_banner() {
    println!(
        "{} {}",
        "docmirror".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    println!("{}", "documentation sites as linked local markdown".bright_black());
    println!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Install the global `tracing` subscriber. Warnings by default, `-v` info, `-vv` debug.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse the start URL, assuming https:// when no scheme is given
pub fn parse_start_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("Start URL is empty");
    }

    let candidate = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        let with_scheme = format!("https://{}", trimmed);
        warn!("No scheme in '{}', using {}", trimmed, with_scheme);
        with_scheme
    };

    let url = Url::parse(&candidate).with_context(|| format!("Invalid start URL '{}'", input))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        bail!("Start URL must be an http(s) URL with a host: {}", input);
    }

    Ok(candidate)
}

/// True when the input opens with `scheme://`. A `://` inside a path or query does not count.
fn has_scheme(input: &str) -> bool {
    input.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Pick the first non-blank key, preferring the explicit one
pub fn pick_api_key(explicit: Option<&str>, from_env: Option<String>) -> Option<String> {
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(from_env)
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

/// Resolve the reader API key from `--api-key`, then the environment (including `.env`)
pub fn resolve_api_key(explicit: Option<&String>) -> Result<String> {
    if explicit.is_none() {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
    }

    pick_api_key(explicit.map(String::as_str), std::env::var(API_KEY_ENV).ok()).with_context(
        || {
            format!(
                "No reader API key. Pass --api-key or set {} (a .env file works too)",
                API_KEY_ENV
            )
        },
    )
}

/// Build discovery options from the shared subcommand flags
pub fn crawl_options_from(args: &ArgMatches, quiet: bool) -> Result<CrawlOptions> {
    let raw_url = args.get_one::<String>("URL").context("A start URL is required")?;
    let url = parse_start_url(raw_url)?;

    let mut fetch = FetchConfig::default();
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        fetch.timeout = Duration::from_secs(*timeout);
    }
    if let Some(user_agent) = args.get_one::<String>("user-agent") {
        fetch.user_agent = user_agent.clone();
    }

    Ok(CrawlOptions {
        url,
        max_depth: args.get_one::<usize>("depth").copied().unwrap_or(0),
        parent_level: args.get_one::<usize>("parent").copied().unwrap_or(0),
        workers: args.get_one::<usize>("workers").copied().unwrap_or(4).max(1),
        fetch,
        show_progress_bars: !quiet,
    })
}

pub async fn handle_list(args: &ArgMatches, quiet: bool) -> Result<()> {
    let options = crawl_options_from(args, quiet)?;
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let result = execute_discovery(options, None)
        .await
        .context("Link discovery failed")?;
    let report = generate_report(&result, format).context("Failed to render report")?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", report),
    }

    Ok(())
}

pub async fn handle_convert(args: &ArgMatches, quiet: bool) -> Result<()> {
    // Preconditions come first so a bad setup never starts a crawl
    let api_key = resolve_api_key(args.get_one::<String>("api-key"))?;
    let output_dir = args
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("output"));
    prepare_output_dir(&output_dir).await?;

    let mut reader = ReaderConfig::new(api_key);
    if let Some(endpoint) = args.get_one::<String>("endpoint") {
        reader = reader.with_endpoint(endpoint.clone());
    }
    let converter = ReaderConverter::new(reader)?;

    let options = crawl_options_from(args, quiet)?;
    let workers = options.workers;
    let result = execute_discovery(options, None)
        .await
        .context("Link discovery failed")?;

    if result.discovered.is_empty() {
        println!("{} No internal pages found to convert.", "⚠".yellow().bold());
        return Ok(());
    }
    for failure in &result.failures {
        println!(
            "{} Could not fetch {} ({})",
            "⚠".yellow(),
            failure.url,
            failure.error.bright_black()
        );
    }

    let progress_bar = (!quiet).then(|| Arc::new(spinner("Converting pages...")));
    let pb_clone = progress_bar.clone();
    let progress_callback: CrawlProgressCallback = Arc::new(move |msg: String| {
        if let Some(ref pb) = pb_clone {
            pb.set_message(msg);
        }
    });

    let export_options = ExportOptions {
        output_dir,
        workers,
        combined: args.get_one::<PathBuf>("combined").cloned(),
    };
    let summary = export_pages(
        &result.discovered,
        &converter,
        &export_options,
        Some(progress_callback),
    )
    .await;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    print_export_summary(&summary?);
    Ok(())
}

pub fn print_export_summary(summary: &ExportSummary) {
    print_divider();
    println!("{}", "  EXPORT SUMMARY".bright_white().bold());
    print_divider();

    println!(
        "{} {} pages written to {}",
        "✓".green().bold(),
        summary.written.len(),
        summary.output_dir.display().to_string().bright_white()
    );

    if let Some(ref combined) = summary.combined {
        println!(
            "{} Combined markdown: {}",
            "✓".green().bold(),
            combined.display().to_string().bright_white()
        );
    }

    if !summary.skipped.is_empty() {
        println!("{} {} pages skipped:", "✗".red().bold(), summary.skipped.len());
        for page in &summary.skipped {
            println!("  {} {} ({})", "•".yellow(), page.url, page.reason.bright_black());
        }
    }
}
