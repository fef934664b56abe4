use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{arg, value_parser, Command};
use healthprobe::config::Config;
use healthprobe::{logging, report, Cancel, Endpoint, Engine, Options};
use tracing::{info, warn};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

fn cli() -> Command {
    Command::new("healthprobe")
        .about("A fast, concurrent API health checker")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(arg!(-c --config <path> "Config file path (YAML/JSON)").required(false))
        .arg(
            arg!(-t --timeout <timeout> "Request timeout, e.g. 5s or 500ms")
                .required(false)
                .value_parser(humantime::parse_duration),
        )
        .arg(
            arg!(-r --retries <retries> "Retry count on failure")
                .required(false)
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(-i --interval <interval> "Check interval in watch mode")
                .required(false)
                .value_parser(humantime::parse_duration),
        )
        .arg(arg!(-w --watch "Keep checking every interval until interrupted"))
        .arg(
            arg!(-f --format <format> "Output format")
                .required(false)
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(arg!(-v --verbose "Capture response bodies and log debug output"))
        .arg(
            arg!(--concurrency <max> "Check at most this many endpoints at once")
                .required(false)
                .value_parser(value_parser!(usize)),
        )
        .arg(arg!([urls] ... "http:// or https:// URLs to check"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("verbose"));

    match run(&matches).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every endpoint was healthy in the last round.
async fn run(matches: &clap::ArgMatches) -> anyhow::Result<bool> {
    let mut endpoints = Vec::new();
    let mut options = Options::default();
    let mut interval = DEFAULT_INTERVAL;

    if let Some(path) = matches.get_one::<String>("config") {
        let config = Config::load(path).with_context(|| format!("loading config {}", path))?;
        options = config.apply(options);
        if let Some(configured) = config.settings.interval.filter(|i| !i.is_zero()) {
            interval = configured;
        }
        endpoints = config.endpoints;
    }

    for url in matches.get_many::<String>("urls").unwrap_or_default() {
        match Endpoint::from_url_arg(url) {
            Some(endpoint) => endpoints.push(endpoint),
            None => warn!(argument = %url, "skipping argument that is not an http(s) url"),
        }
    }

    if endpoints.is_empty() {
        bail!("no endpoints specified; use -c <config> or pass URLs as arguments");
    }

    if let Some(timeout) = matches.get_one::<Duration>("timeout") {
        options.timeout = *timeout;
    }
    if let Some(retries) = matches.get_one::<u32>("retries") {
        options.retries = *retries;
    }
    if let Some(max) = matches.get_one::<usize>("concurrency") {
        options = options.with_max_concurrency(*max);
    }
    if let Some(configured) = matches.get_one::<Duration>("interval") {
        interval = *configured;
    }
    options.verbose = matches.get_flag("verbose");

    let json = matches
        .get_one::<String>("format")
        .is_some_and(|format| format == "json");
    let verbose = options.verbose;
    let engine = Engine::new(options).context("building check engine")?;

    let (canceller, cancel) = Cancel::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling checks");
            canceller.cancel();
        }
    });

    loop {
        let results = engine.check_all(&cancel, &endpoints).await;

        if json {
            println!("{}", report::render_json(&results)?);
        } else {
            print!("{}", report::render_text(&results, verbose));
        }

        let healthy = report::all_healthy(&results);
        if !matches.get_flag("watch") || cancel.is_cancelled() {
            return Ok(healthy);
        }

        if cancel.run(tokio::time::sleep(interval)).await.is_none() {
            return Ok(healthy);
        }
    }
}
