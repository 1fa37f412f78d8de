use carchive::cli::{Cli, Commands, ConfigAction};
use carchive::config::Config;
use carchive::error::{CarchiveError, Result};
use carchive::search::{EntityType, SearchCriteria, SearchManager, SearchResults};
use carchive::storage::Database;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Init => {
            cmd_init(cli.config)?;
        }
        Commands::Search {
            query,
            mode,
            types,
            role,
            provider,
            gencom_type,
            conversation,
            days,
            since,
            until,
            sort,
            offset,
            limit,
            json,
        } => {
            cmd_search(SearchArgs {
                config_path: cli.config,
                query,
                mode,
                types,
                roles: role,
                providers: provider,
                gencom_types: gencom_type,
                conversation,
                days,
                since,
                until,
                sort,
                offset,
                limit,
                json,
            })?;
        }
        Commands::Stats => {
            cmd_stats(cli.config)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose { "carchive=debug" } else { "carchive=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_init(config_path: Option<std::path::PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let db_path = expand_path(&config.database_path())?;

    let _db = Database::new(&db_path)?;

    println!("✓ Archive database initialized at: {}", db_path.display());
    Ok(())
}

struct SearchArgs {
    config_path: Option<std::path::PathBuf>,
    query: String,
    mode: String,
    types: String,
    roles: Vec<String>,
    providers: Vec<String>,
    gencom_types: Vec<String>,
    conversation: Option<String>,
    days: Option<i64>,
    since: Option<String>,
    until: Option<String>,
    sort: String,
    offset: usize,
    limit: Option<usize>,
    json: bool,
}

fn cmd_search(args: SearchArgs) -> Result<()> {
    let config = load_config(args.config_path)?;
    let db_path = expand_path(&config.database_path())?;

    if !db_path.exists() {
        return Err(CarchiveError::Config(format!(
            "No archive database at {}. Run 'carchive init' first.",
            db_path.display()
        )));
    }

    let entity_types = args
        .types
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.parse::<EntityType>())
        .collect::<Result<Vec<_>>>()?;

    let mut builder = SearchCriteria::builder()
        .text_query(args.query)
        .search_mode(args.mode.parse()?)
        .entity_types(entity_types)
        .roles(args.roles)
        .providers(args.providers)
        .gencom_types(args.gencom_types)
        .sort_by(args.sort.parse()?)
        .offset(args.offset)
        .limit(args.limit.unwrap_or(config.search.default_limit));

    if let Some(conversation_id) = args.conversation {
        builder = builder.conversation_id(conversation_id);
    }
    if let Some(days) = args.days {
        builder = builder.days(days);
    }
    match (args.since, args.until) {
        (None, None) => {}
        (since, until) => {
            let start = since
                .map(|s| parse_date(&s, false))
                .transpose()?
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            let end = until
                .map(|s| parse_date(&s, true))
                .transpose()?
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            builder = builder.date_range(start, end);
        }
    }

    let criteria = builder.build()?;

    let database = Arc::new(Database::new(&db_path)?);
    let manager = SearchManager::new(database, config.search.clone());
    let results = manager.search(&criteria)?;

    if args.json {
        let json = serde_json::to_string_pretty(&results).map_err(|e| CarchiveError::Json {
            source: e,
            context: "Failed to serialize search results".to_string(),
        })?;
        println!("{}", json);
    } else {
        print_results(&results);
    }

    Ok(())
}

fn print_results(results: &SearchResults) {
    if results.results.is_empty() {
        println!("No matches.");
        return;
    }

    for result in &results.results {
        let when = result
            .created_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "----".to_string());
        let role = result.role.as_deref().unwrap_or("-");

        println!(
            "[{:>12}] {}  {}  {}  {}",
            result.entity_type,
            when,
            role,
            result.id,
            snippet(&result.content, 80)
        );
    }

    println!(
        "\n{} of {} matches ({:.1} ms)",
        results.results.len(),
        results.total_count,
        results.query_time_ms
    );
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flattened: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= max_chars {
        flattened
    } else {
        let truncated: String = flattened.chars().take(max_chars).collect();
        format!("{}…", truncated)
    }
}

/// Accept YYYY-MM-DD (expanded to the start or end of that day) or RFC 3339
fn parse_date(input: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date: NaiveDate = input.parse().map_err(|_| {
        CarchiveError::InvalidCriteria(format!(
            "Cannot parse date '{}': expected YYYY-MM-DD or RFC 3339",
            input
        ))
    })?;

    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59).unwrap()
    } else {
        date.and_hms_opt(0, 0, 0).unwrap()
    };
    Ok(time.and_utc())
}

fn cmd_stats(config_path: Option<std::path::PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let db_path = expand_path(&config.database_path())?;

    if !db_path.exists() {
        return Err(CarchiveError::Config(format!(
            "No archive database at {}. Run 'carchive init' first.",
            db_path.display()
        )));
    }

    let database = Database::new(&db_path)?;
    let stats = database.stats()?;

    println!("Carchive Statistics");
    println!("===================");
    println!("Providers:     {}", stats.provider_count);
    println!("Conversations: {}", stats.conversation_count);
    println!("Messages:      {}", stats.message_count);
    println!("Chunks:        {}", stats.chunk_count);
    println!("Gencom:        {}", stats.gencom_count);
    println!("Media:         {}", stats.media_count);

    Ok(())
}

fn cmd_config(config_path: Option<std::path::PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| CarchiveError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| CarchiveError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'carchive config init' to create one."
        );
        return Ok(Config::default());
    }

    Config::load(&path)
}

fn expand_path(path: &std::path::Path) -> Result<std::path::PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| CarchiveError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| CarchiveError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
