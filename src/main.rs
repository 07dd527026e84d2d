use clap::{Arg, ArgAction, ArgMatches, Command};
use relay_i18n::mt::{
    MockMode, MockTranslator, TranslationCache, TranslationConfig, TranslationRequest,
    TranslationService, format_bytes,
};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("relay-mt")
        .version("0.1.0")
        .about("Diagnostics for the relay-i18n translation pipeline")
        .subcommand_required(true)
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Cache directory (default: platform cache dir or RELAY_CACHE_DIR)"),
        )
        .subcommand(
            Command::new("translate")
                .about("Translate text through the full pipeline")
                .arg(
                    Arg::new("text")
                        .help("Text to translate")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("target-language")
                        .help("Target language code (en, ko, zh)")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("source-language")
                        .long("source")
                        .short('s')
                        .help("Source language code (default: auto)")
                        .default_value("auto"),
                )
                .arg(
                    Arg::new("mock")
                        .long("mock")
                        .short('m')
                        .help("Use mock translator instead of real providers")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("long")
                        .long("long")
                        .short('l')
                        .help("Force paragraph chunking")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .short('v')
                        .help("Show how the translation was produced")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("status").about("Check every translation provider"))
        .subcommand(
            Command::new("cache")
                .about("Inspect or maintain the translation cache")
                .subcommand_required(true)
                .subcommand(Command::new("stats").about("Show entry count and size"))
                .subcommand(Command::new("cleanup").about("Remove expired entries"))
                .subcommand(Command::new("clear").about("Remove every entry")),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    let mut config = TranslationConfig::from_env()?;
    if let Some(dir) = matches.get_one::<PathBuf>("cache-dir") {
        config.cache_dir = Some(dir.clone());
    }

    match matches.subcommand() {
        Some(("translate", sub)) => translate(&config, sub).await,
        Some(("status", _)) => status(&config).await,
        Some(("cache", sub)) => cache(&config, sub),
        _ => unreachable!("subcommand_required prevents this"),
    }
}

async fn translate(
    config: &TranslationConfig,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = required(matches, "text")?;
    let target = required(matches, "target-language")?;
    let source = required(matches, "source-language")?;
    let verbose = matches.get_flag("verbose");

    let service = if matches.get_flag("mock") {
        TranslationService::builder()
            .config(config.clone())
            .provider(MockTranslator::new(MockMode::Suffix))
            .cache(TranslationCache::from_config(config))
            .build()
    } else {
        TranslationService::from_config(config)?
    };

    if verbose {
        println!("📝 Source: \"{}\"", text);
        println!("🌍 {} → {}", source, target);
        println!();
    }

    if matches.get_flag("long") {
        let result = service.translate_long_content(text, target).await;
        println!("{}", result);
        return Ok(());
    }

    let request = TranslationRequest::new(text, target).with_source(source);
    let outcome = service.translate(&request).await;

    if verbose {
        let mark = if outcome.success { "✅" } else { "❌" };
        println!("{} Method: {}", mark, outcome.method);
    }
    println!("{}", outcome.text);

    if !outcome.success {
        return Err("Translation failed, original text returned".into());
    }
    Ok(())
}

async fn status(config: &TranslationConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = TranslationService::from_config(config)?;

    println!("Configured providers:");
    for method in service.available_methods() {
        let state = if method.configured { "configured" } else { "not configured" };
        println!("  {:<16} {:?} ({})", method.name, method.tier, state);
    }
    println!();

    let report = service.check_provider_status().await;
    println!("Premium:");
    print_status("Google Translate", report.premium.available, report.premium.error.as_deref());
    println!("Free:");
    for provider in &report.free {
        print_status(&provider.name, provider.available, provider.error.as_deref());
    }
    Ok(())
}

fn print_status(name: &str, available: bool, error: Option<&str>) {
    match (available, error) {
        (true, _) => println!("  ✅ {}", name),
        (false, Some(error)) => println!("  ❌ {}: {}", name, error),
        (false, None) => println!("  ❌ {}", name),
    }
}

fn cache(config: &TranslationConfig, matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let cache = TranslationCache::from_config(config);

    match matches.subcommand() {
        Some(("stats", _)) => {
            let stats = cache.stats();
            println!("Entries: {}", stats.total_entries);
            println!("Size:    {}", format_bytes(stats.total_size));
            println!("Health:  {}", stats.health());
        }
        Some(("cleanup", _)) => {
            let removed = cache.cleanup();
            println!("Removed {} expired entries", removed);
        }
        Some(("clear", _)) => {
            let removed = cache.clear();
            println!("Removed {} entries", removed);
        }
        _ => unreachable!("subcommand_required prevents this"),
    }
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str, Box<dyn std::error::Error>> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument '{}'", id).into())
}
