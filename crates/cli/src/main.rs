use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use textprint_core::filter::FilterParams;
use textprint_server::Server;
use textprint_storage_ephemeral::EphemeralStorage;
use textprint_storage_local::{LocalConfig, LocalStorage};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_ROOT: &str = "./data";
const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Backend {
    Local,
    Ephemeral,
}

#[derive(Parser, Debug)]
#[command(name = "textprint", version, about = "Content-addressed string analysis")]
struct Cli {
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Analyze and store a string.
    Add(ValueArgs),
    /// Show the stored analysis of a string.
    Get(ValueArgs),
    /// Remove a stored string.
    Delete(ValueArgs),
    /// List stored strings matching structured filters.
    List(ListArgs),
    /// List stored strings matching a natural language query.
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, value_enum)]
    backend: Option<Backend>,
    #[arg(long)]
    root: Option<String>,
    #[arg(long)]
    addr: Option<String>,
}

#[derive(Args, Debug)]
struct StoreArgs {
    #[arg(long)]
    root: Option<String>,
}

#[derive(Args, Debug)]
struct ValueArgs {
    value: String,
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long)]
    is_palindrome: Option<String>,
    #[arg(long)]
    min_length: Option<String>,
    #[arg(long)]
    max_length: Option<String>,
    #[arg(long)]
    word_count: Option<String>,
    #[arg(long)]
    contains_character: Option<String>,
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Args, Debug)]
struct QueryArgs {
    text: String,
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct SectionDefaults {
    backend: Option<Backend>,
    root: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ServeSection {
    backend: Option<Backend>,
    root: Option<String>,
    addr: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct LocalStorageSection {
    fsync: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StorageSection {
    #[serde(default)]
    local: Option<LocalStorageSection>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct AppConfig {
    #[serde(default)]
    default: Option<SectionDefaults>,
    #[serde(default)]
    serve: Option<ServeSection>,
    #[serde(default)]
    storage: Option<StorageSection>,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let cfg = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve(args) => serve(args, &cfg).await?,
        Commands::Add(args) => {
            let server = local_server(args.store.root, &cfg)?;
            let record = server.create(args.value).await?;
            print_json(&record)?;
        }
        Commands::Get(args) => {
            let server = local_server(args.store.root, &cfg)?;
            let record = server.get(args.value).await?;
            print_json(&record)?;
        }
        Commands::Delete(args) => {
            let server = local_server(args.store.root, &cfg)?;
            server.delete(args.value.clone()).await?;
            print_json(&serde_json::json!({ "deleted": true, "value": args.value }))?;
        }
        Commands::List(args) => {
            let params = FilterParams {
                is_palindrome: args.is_palindrome,
                min_length: args.min_length,
                max_length: args.max_length,
                word_count: args.word_count,
                contains_character: args.contains_character,
            };
            let spec = params.parse()?;
            let server = local_server(args.store.root, &cfg)?;
            print_json(&server.list(spec).await?)?;
        }
        Commands::Query(args) => {
            let server = local_server(args.store.root, &cfg)?;
            print_json(&server.filter_by_natural_language(args.text).await?)?;
        }
    }
    Ok(())
}

async fn serve(args: ServeArgs, cfg: &AppConfig) -> Result<()> {
    let serve_cfg = cfg.serve.clone().unwrap_or_default();
    let defaults = cfg.default.clone().unwrap_or_default();
    let backend = args
        .backend
        .or(serve_cfg.backend)
        .or(defaults.backend)
        .unwrap_or(Backend::Ephemeral);
    let addr = args
        .addr
        .or(serve_cfg.addr)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    info!(backend = ?backend, %addr, "starting server");
    match backend {
        Backend::Ephemeral => {
            let server = Server::new(EphemeralStorage::new());
            server.run_http(&addr).await?;
        }
        Backend::Local => {
            let root = args.root.or(serve_cfg.root);
            let server = local_server(root, cfg)?;
            server.run_http(&addr).await?;
        }
    }
    Ok(())
}

fn resolve_root(arg: Option<String>, cfg: &AppConfig) -> PathBuf {
    let raw = arg
        .or_else(|| cfg.default.as_ref().and_then(|d| d.root.clone()))
        .unwrap_or_else(|| DEFAULT_ROOT.to_string());
    expand_path(&raw)
}

fn local_server(root: Option<String>, cfg: &AppConfig) -> Result<Server<LocalStorage>> {
    if let Some(Backend::Ephemeral) = cfg.default.as_ref().and_then(|d| d.backend) {
        tracing::warn!("ephemeral backend ignored outside `serve`; using local storage");
    }
    let root = resolve_root(root, cfg);
    let mut local = LocalConfig::default();
    if let Some(fsync) = cfg
        .storage
        .as_ref()
        .and_then(|s| s.local.as_ref())
        .and_then(|l| l.fsync)
    {
        local.fsync = fsync;
    }
    let storage = LocalStorage::with_config(&root, local)
        .map_err(|e| eyre!("failed to open local storage at {}: {}", root.display(), e))?;
    Ok(Server::new(storage))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<AppConfig> {
    let mut builder = config::Config::builder()
        .add_source(config::Environment::with_prefix("TEXTPRINT").separator("__"));

    if let Some(raw) = path {
        let expanded = expand_path(raw);
        if !expanded.exists() {
            tracing::warn!(
                path = expanded.display().to_string(),
                "config file not found; continuing with defaults and env overrides"
            );
        }
        builder = builder.add_source(config::File::from(expanded).required(false));
    }

    let cfg = builder
        .build()
        .map_err(|e| eyre!("config load error: {}", e))?;
    cfg.try_deserialize()
        .map_err(|e| eyre!("config parse error: {}", e))
}

fn expand_path(input: &str) -> PathBuf {
    if input == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from(input));
    }
    if let Some(rest) = input.strip_prefix("~/") {
        return home_dir()
            .map(|mut base| {
                base.push(rest);
                base
            })
            .unwrap_or_else(|| PathBuf::from(rest));
    }
    PathBuf::from(input)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
}
