use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tsuyaku::mt::{GeminiProvider, MockMode, MockTranslator, StreamingTranslator};
use tsuyaku::{
    FileStore, GeminiConfig, HistoryList, KeyValueStore, Language, MemoryStore, Orchestrator,
    Persistence, SOURCE_LANGUAGES, SessionState, TARGET_LANGUAGES, TranslateOutcome,
    TranslationPhase,
};

fn cli() -> Command {
    Command::new("tsuyaku")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Streaming LLM translation with custom rules and local history")
        .subcommand_required(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .env("TSUYAKU_DATA_DIR")
                .global(true)
                .help("Directory holding history and rules (default: platform data dir)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .help("Log request details to stderr")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("translate")
                .about("Translate text, streaming the result as it arrives")
                .arg(
                    Arg::new("text")
                        .help("Text to translate (read from stdin when omitted)")
                        .index(1),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .short('t')
                        .help("Target language (en, ja, zh-cn, zh-tw)")
                        .default_value("en"),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .short('f')
                        .help("Source language, or auto to detect")
                        .default_value("auto"),
                )
                .arg(
                    Arg::new("swap-after")
                        .long("swap-after")
                        .help("Swap languages afterwards and translate the result back")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("mock")
                        .long("mock")
                        .short('m')
                        .help("Use the mock translator instead of Gemini")
                        .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("model").long("model").help("Gemini model name"))
                .arg(
                    Arg::new("temperature")
                        .long("temperature")
                        .value_parser(clap::value_parser!(f32))
                        .help("Sampling temperature (default: 0.3)"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("List, show or clear past translations")
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .short('n')
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(Arg::new("show").long("show").help("Print one record by id"))
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .help("Delete all history")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("rules")
                .about("Show or change the custom rules included in every prompt")
                .arg(Arg::new("set").long("set").help("Replace the rules with this text"))
                .arg(
                    Arg::new("file")
                        .long("file")
                        .help("Replace the rules with the contents of a file")
                        .conflicts_with("set"),
                )
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .help("Remove all rules")
                        .action(ArgAction::SetTrue)
                        .conflicts_with_all(["set", "file"]),
                ),
        )
        .subcommand(Command::new("languages").about("List supported languages"))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tsuyaku=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(matches: &ArgMatches) -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    let dir = matches
        .get_one::<String>("data-dir")
        .map(PathBuf::from)
        .or_else(FileStore::default_dir);

    match dir {
        Some(dir) => Ok(Arc::new(FileStore::open(dir)?)),
        None => {
            tracing::warn!("No data directory available; history and rules will not be kept");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn build_translator(
    matches: &ArgMatches,
) -> Result<Arc<dyn StreamingTranslator>, Box<dyn std::error::Error>> {
    if matches.get_flag("mock") {
        return Ok(Arc::new(MockTranslator::with_delay(MockMode::Suffix, 40)));
    }

    let mut config = GeminiConfig::from_env();
    if let Some(model) = matches.get_one::<String>("model") {
        config = config.with_model(model.as_str());
    }
    if let Some(temperature) = matches.get_one::<f32>("temperature") {
        config = config.with_temperature(*temperature);
    }
    Ok(Arc::new(GeminiProvider::new(config)?))
}

fn read_source_text(matches: &ArgMatches) -> std::io::Result<String> {
    match matches.get_one::<String>("text") {
        Some(text) => Ok(text.clone()),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Prints each fragment's new suffix so the terminal shows the translation growing.
///
/// Output stops at the first write error (e.g. a closed pipe); the translation
/// itself still runs to completion.
fn stream_to<W: Write + Send>(mut out: W) -> impl FnMut(&SessionState) + Send {
    let mut printed = String::new();
    let mut closed = false;
    move |state: &SessionState| {
        if closed {
            return;
        }
        if let Err(e) = print_update(&mut out, state, &mut printed) {
            tracing::debug!("output closed, no longer streaming: {}", e);
            closed = true;
        }
    }
}

fn print_update(
    out: &mut impl Write,
    state: &SessionState,
    printed: &mut String,
) -> std::io::Result<()> {
    let text = &state.translated_text;
    match state.phase {
        TranslationPhase::Requesting => {
            if text.is_empty() {
                printed.clear();
                return Ok(());
            }
            match text.strip_prefix(printed.as_str()) {
                Some(rest) => write!(out, "{}", rest)?,
                None => write!(out, "\n{}", text)?,
            }
            out.flush()?;
            printed.clone_from(text);
        }
        TranslationPhase::Succeeded | TranslationPhase::Failed => {
            if !printed.is_empty() {
                writeln!(out)?;
            }
        }
        TranslationPhase::Idle => {}
    }
    Ok(())
}

async fn run_translation(app: &mut Orchestrator) -> Result<(), Box<dyn std::error::Error>> {
    match app.translate(stream_to(std::io::stdout())).await {
        TranslateOutcome::Succeeded(_) => Ok(()),
        TranslateOutcome::Ignored(reason) => {
            eprintln!("Nothing to translate ({:?})", reason);
            Ok(())
        }
        TranslateOutcome::Failed(message) => Err(message.into()),
    }
}

async fn cmd_translate(
    matches: &ArgMatches,
    store: Arc<dyn KeyValueStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let to: Language = matches
        .get_one::<String>("to")
        .map(String::as_str)
        .unwrap_or("en")
        .parse()?;
    let from: Language = matches
        .get_one::<String>("from")
        .map(String::as_str)
        .unwrap_or("auto")
        .parse()?;

    let mut app = Orchestrator::new(build_translator(matches)?, store);
    app.set_source_language(from);
    app.set_target_language(to)?;
    app.set_source_text(read_source_text(matches)?.trim_end().to_string());

    tracing::debug!(provider = app.provider_name(), "translating");
    run_translation(&mut app).await?;

    if matches.get_flag("swap-after") {
        app.swap_languages();
        eprintln!(
            "--- {} → {} ---",
            app.session().source_language,
            app.session().target_language
        );
        run_translation(&mut app).await?;
    }
    Ok(())
}

fn cmd_history(matches: &ArgMatches, store: Arc<dyn KeyValueStore>) -> Result<(), Box<dyn std::error::Error>> {
    let persistence = Persistence::new(store);
    let history = persistence.load_history();

    if matches.get_flag("clear") {
        persistence.save_history(&HistoryList::new())?;
        println!("Cleared {} record(s)", history.len());
        return Ok(());
    }

    if let Some(id) = matches.get_one::<String>("show") {
        let record = history
            .get(id)
            .ok_or_else(|| format!("No history record with id {}", id))?;
        println!(
            "{} → {}",
            record.source_language(),
            record.target_language()
        );
        println!("{}", record.original());
        println!("---");
        println!("{}", record.translated());
        return Ok(());
    }

    if history.is_empty() {
        println!("No translation history");
        return Ok(());
    }

    let limit = matches.get_one::<usize>("limit").copied().unwrap_or(20);
    for record in history.iter().take(limit) {
        let preview: String = record.original().chars().take(40).collect();
        println!(
            "{}  {}  {} → {}  {}",
            record.id(),
            record.created_at().format("%Y-%m-%d %H:%M"),
            record.source_language().code(),
            record.target_language().code(),
            preview.replace('\n', " ")
        );
    }
    Ok(())
}

fn cmd_rules(matches: &ArgMatches, store: Arc<dyn KeyValueStore>) -> Result<(), Box<dyn std::error::Error>> {
    let persistence = Persistence::new(store);

    let replacement = if matches.get_flag("clear") {
        Some(String::new())
    } else if let Some(text) = matches.get_one::<String>("set") {
        Some(text.clone())
    } else if let Some(path) = matches.get_one::<String>("file") {
        Some(std::fs::read_to_string(path)?)
    } else {
        None
    };

    match replacement {
        Some(rules) => {
            persistence.save_rules(&rules)?;
            println!("Rules saved ({} chars)", rules.chars().count());
        }
        None => {
            let rules = persistence.load_rules();
            if rules.trim().is_empty() {
                println!("No custom rules");
            } else {
                println!("{}", rules);
            }
        }
    }
    Ok(())
}

fn cmd_languages() {
    for language in SOURCE_LANGUAGES {
        let target = if TARGET_LANGUAGES.contains(&language) {
            "source/target"
        } else {
            "source only"
        };
        println!(
            "{} {:<6} {:<22} {}",
            language.flag(),
            language.code(),
            language.label(),
            target
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();
    let verbose = matches.get_flag("verbose")
        || matches
            .subcommand()
            .is_some_and(|(_, sub)| sub.get_flag("verbose"));
    init_tracing(verbose);

    match matches.subcommand() {
        Some(("translate", sub)) => cmd_translate(sub, open_store(sub)?).await,
        Some(("history", sub)) => cmd_history(sub, open_store(sub)?),
        Some(("rules", sub)) => cmd_rules(sub, open_store(sub)?),
        Some(("languages", _)) => {
            cmd_languages();
            Ok(())
        }
        _ => unreachable!("subcommand_required"),
    }
}
