//! Relic Scanner
//!
//! Watches the Warframe log for the void relic reward screen, reads the
//! reward names off a screenshot and prints each item's market price and
//! ducat value.

mod capture;
mod catalog;
mod config;
mod detection;
mod logging;
mod matching;
mod ocr;
mod paths;
mod report;
mod watcher;
mod worker;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::capture::{CommandCapture, FileCapture, ScreenSource};
use crate::catalog::{Catalog, CatalogOptions, MarketClient, load_catalog};
use crate::config::AppConfig;
use crate::detection::DetectionSettings;
use crate::matching::Matcher;
use crate::ocr::{OcrEngine, TesseractCli};
use crate::report::PriceSource;
use crate::watcher::{Cooldown, LogTail, TriggerMatcher};
use crate::worker::{CatalogMatchers, DetectionRequest, MatcherProvider, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "relic-scanner", version)]
#[command(about = "Identifies Warframe relic rewards and prints their prices")]
struct Cli {
    /// Config file (default: <config dir>/relic-scanner/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Skip market price lookups
    #[arg(long, global = true)]
    no_prices: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow EE.log and scan every reward screen
    Watch,
    /// Scan a saved screenshot
    Scan { image: PathBuf },
    /// Resolve two rows of reward text
    Match {
        #[arg(long, default_value = "")]
        upper: String,
        #[arg(long, default_value = "")]
        lower: String,
    },
    /// Find the catalog item closest to a noisy name
    Align { text: String },
    /// Show the item catalog, downloading it if needed
    Catalog {
        /// Ask the server even when the cache is fresh
        #[arg(long)]
        refresh: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Failed to create application directories: {}", e);
    }
    logging::init(
        &paths::get_logs_dir().join("relic-scanner.log"),
        cli.verbose,
    );

    std::panic::set_hook(Box::new(|info| {
        log::error!("PANIC: {}", info);
    }));

    config::init_config(cli.config.as_deref());
    let config = config::get_config();

    let client = MarketClient::new(&config.api_base_url, &config.locale)?;
    let show_prices = config.show_prices && !cli.no_prices;

    match cli.command {
        Command::Watch => run_watch(config, client, show_prices),
        Command::Scan { image } => run_scan(config, &client, &image, show_prices),
        Command::Match { upper, lower } => {
            let matcher = build_matcher(config, &client)?;
            let settings = DetectionSettings::from_config(config);
            let upper = detection::correct_text(&matcher, &upper, &settings);
            let lower = detection::correct_text(&matcher, &lower, &settings);
            log::debug!("Corrected rows: {:?} / {:?}", upper.words(), lower.words());
            let items = matching::resolve(upper.words(), lower.words(), matcher.items());
            let items: Vec<_> = items.iter().collect();
            print_report(&items, show_prices.then_some(&client as &dyn PriceSource))
        }
        Command::Align { text } => {
            let catalog = load_catalog(&client, &catalog_options(config, false))?;
            let items: Vec<_> = matching::best_match(&text, &catalog.items).into_iter().collect();
            print_report(&items, show_prices.then_some(&client as &dyn PriceSource))
        }
        Command::Catalog { refresh } => {
            let catalog = load_catalog(&client, &catalog_options(config, refresh))?;
            print_catalog(&catalog);
            Ok(())
        }
    }
}

fn catalog_options(config: &AppConfig, refresh: bool) -> CatalogOptions {
    CatalogOptions {
        cache_path: paths::get_items_cache_path(),
        locale: config.locale.clone(),
        ttl: config.catalog_ttl(),
        refresh,
    }
}

fn build_matcher(config: &AppConfig, client: &MarketClient) -> Result<Matcher> {
    let catalog = load_catalog(client, &catalog_options(config, false))?;
    Ok(Matcher::new(
        catalog.fingerprint(),
        catalog.items,
        config.word_max_distance,
    ))
}

fn build_ocr(config: &AppConfig) -> Result<TesseractCli> {
    let executable = config.tesseract_path.as_deref().map(paths::expand_path).transpose()?;
    let tessdata = config.tessdata_dir.as_deref().map(paths::expand_path).transpose()?;
    let found = ocr::ensure_tesseract(
        executable.as_deref(),
        tessdata.as_deref(),
        &config.ocr_language,
    )?;

    let mut engine = TesseractCli::new(found.executable, found.tessdata);
    engine.language = config.ocr_language.clone();
    if config.locale != catalog::item::FALLBACK_LOCALE {
        // Localized names use letters outside the ASCII whitelist.
        engine.whitelist = None;
    }
    Ok(engine)
}

fn pipeline(
    config: &AppConfig,
    screen: Box<dyn ScreenSource>,
    matchers: Box<dyn MatcherProvider>,
    capture_delay: Duration,
) -> Result<Pipeline> {
    let ocr: Box<dyn OcrEngine> = Box::new(build_ocr(config)?);
    Ok(Pipeline {
        screen,
        ocr,
        matchers,
        settings: DetectionSettings::from_config(config),
        capture_delay,
    })
}

fn print_report(items: &[&catalog::CatalogItem], prices: Option<&dyn PriceSource>) -> Result<()> {
    let mut out = io::stdout().lock();
    report::write_report(&mut out, items, prices)
}

fn print_catalog(catalog: &Catalog) {
    println!(
        "Catalog {} ({} items)",
        catalog.fingerprint(),
        catalog.len()
    );
    for item in &catalog.items {
        println!("{:<48} {:>4} ducats  {}", item.name, item.ducats, item.slug);
    }
}

fn run_scan(
    config: &AppConfig,
    client: &MarketClient,
    image: &Path,
    show_prices: bool,
) -> Result<()> {
    let matcher = Arc::new(build_matcher(config, client)?);
    let mut pipeline = pipeline(
        config,
        Box::new(FileCapture::new(image)),
        Box::new(matcher),
        Duration::ZERO,
    )?;

    let items = pipeline.run_once()?;
    let items: Vec<_> = items.iter().collect();
    print_report(&items, show_prices.then_some(client as &dyn PriceSource))
}

fn run_watch(config: &AppConfig, client: MarketClient, show_prices: bool) -> Result<()> {
    let log_path = paths::resolve_ee_log(config.log_file.as_deref(), &config.steam_library)?;
    log::info!("Watching {}", log_path.display());

    let mut tail = LogTail::open_at_end(&log_path)?;
    let triggers = TriggerMatcher::new(&config.trigger_patterns)?;
    let mut cooldown = Cooldown::new(Duration::from_secs(config.cooldown_secs));

    // Fails early when the catalog cannot be loaded at all.
    let mut matchers = CatalogMatchers::new(
        MarketClient::new(&config.api_base_url, &config.locale)?,
        catalog_options(config, false),
        config.word_max_distance,
    );
    matchers.matcher()?;

    let screen = CommandCapture::new(&config.capture_command)?;
    let pipeline = pipeline(
        config,
        Box::new(screen),
        Box::new(matchers),
        Duration::from_millis(config.capture_delay_ms),
    )?;

    let (sender, receiver) = worker::create_detection_queue();
    let handle = worker::spawn_detection_worker(receiver, pipeline, move |request, items| {
        let items: Vec<_> = items.iter().collect();
        let prices = show_prices.then_some(&client as &dyn PriceSource);
        if let Err(e) = print_report(&items, prices) {
            log::error!("Detection #{}: failed to print report: {:#}", request.id, e);
        }
    })?;

    let stop = AtomicBool::new(false);
    let mut next_id = 1;
    watcher::watch(
        &mut tail,
        &triggers,
        &mut cooldown,
        Duration::from_millis(config.poll_interval_ms),
        &stop,
        || {
            if let Err(e) = sender.send(DetectionRequest::new(next_id)) {
                log::error!("Detection worker is gone: {}", e);
            }
            next_id += 1;
        },
    )?;

    drop(sender);
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("Detection worker panicked"))
        .context("Shutting down")?;
    Ok(())
}
