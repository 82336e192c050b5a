//! `conntree`: load, seed and inspect connection stores

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use conntree_loader::DefaultSqlConnectionsLoader;
use conntree_model::ConnectionTree;
use conntree_persist::{paths, CacheStore};
use conntree_security::{
    AesGcmCryptographyProvider, CryptographyProvider, ExposeSecret as _, SecretString,
};
use conntree_store::{
    DatabaseConnector, MetaDataRetriever, SqliteConnector, TreeSerializer, UnreachableConnector,
};
use tracing_subscriber::EnvFilter;

mod prompt;
mod render;
mod settings;

use prompt::TerminalRequestor;
use settings::Settings;

fn cli() -> Command {
    let db = Arg::new("db")
        .long("db")
        .value_parser(value_parser!(PathBuf))
        .help("SQLite store file");
    let json = Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the tree as JSON");

    Command::new("conntree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Connection trees from a shared SQL store, with a local cache copy")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Settings file (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("load")
                .about("Load the tree, falling back to the cache copy")
                .arg(db.clone())
                .arg(
                    Arg::new("cache")
                        .long("cache")
                        .value_parser(value_parser!(PathBuf))
                        .help("Cache file (default: <data-dir>/mRemoteNG/sqlcache.xml)"),
                )
                .arg(
                    Arg::new("local-props")
                        .long("local-props")
                        .value_parser(value_parser!(PathBuf))
                        .help("Local connection properties file"),
                )
                .arg(json.clone()),
        )
        .subcommand(
            Command::new("seed")
                .about("Write a tree into a store, replacing its contents")
                .arg(db.required(true))
                .arg(
                    Arg::new("from")
                        .long("from")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Tree JSON, as printed by `load --json`"),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .action(ArgAction::SetTrue)
                        .help("Protect the store with a password (CONNTREE_PASSWORD or prompt)"),
                )
                .arg(
                    Arg::new("no-local-cache")
                        .long("no-local-cache")
                        .action(ArgAction::SetTrue)
                        .help("Tell clients not to keep a cache copy"),
                ),
        )
        .subcommand(
            Command::new("cache")
                .about("Print the cache copy")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_parser(value_parser!(PathBuf))
                        .help("Cache file (default: <data-dir>/mRemoteNG/sqlcache.xml)"),
                )
                .arg(json),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));
    let settings = Settings::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    let crypto: Arc<dyn CryptographyProvider> = Arc::new(AesGcmCryptographyProvider::new());

    match matches.subcommand() {
        Some(("load", args)) => load(args, settings, crypto),
        Some(("seed", args)) => seed(args, crypto.as_ref()),
        Some(("cache", args)) => show_cache(args, &settings, crypto),
        _ => bail!("unknown command"),
    }
}

fn load(
    args: &ArgMatches,
    settings: Settings,
    crypto: Arc<dyn CryptographyProvider>,
) -> anyhow::Result<()> {
    let Some(db) = args
        .get_one::<PathBuf>("db")
        .cloned()
        .or(settings.store.database)
    else {
        bail!("no store given; pass --db or set [store] database");
    };
    let mut config = settings.loader;
    if let Some(cache) = args.get_one::<PathBuf>("cache") {
        config = config.with_cache_path(cache);
    }
    if let Some(props) = args.get_one::<PathBuf>("local-props") {
        config = config.with_local_properties_path(props);
    }

    let loader = DefaultSqlConnectionsLoader::from_config(open_store(&db), crypto, config)?
        .with_requestor(Arc::new(TerminalRequestor::new()));
    let tree = loader.load()?;

    print_tree(&tree, args.get_flag("json"))?;
    eprintln!(
        "store {}: {}",
        db.display(),
        if loader.is_database_reachable() {
            "reachable"
        } else {
            "unreachable (cache copy)"
        }
    );
    Ok(())
}

fn open_store(db: &Path) -> Arc<dyn DatabaseConnector> {
    match SqliteConnector::open_existing(db) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(store = %db.display(), error = %e, "could not open store");
            Arc::new(UnreachableConnector::new(db.display().to_string(), e.to_string()))
        }
    }
}

fn seed(args: &ArgMatches, crypto: &dyn CryptographyProvider) -> anyhow::Result<()> {
    let (Some(db), Some(from)) = (args.get_one::<PathBuf>("db"), args.get_one::<PathBuf>("from"))
    else {
        bail!("--db and --from are required");
    };
    let text =
        std::fs::read_to_string(from).with_context(|| format!("reading {}", from.display()))?;
    let tree: ConnectionTree =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", from.display()))?;
    let Some(root_info) = tree.root().root_info() else {
        bail!("tree in {} has no root", from.display());
    };

    let key = if args.get_flag("password") {
        match prompt::password_for_seed() {
            Some(key) if !key.expose_secret().is_empty() => key,
            _ => bail!("no password given"),
        }
    } else {
        SecretString::from(root_info.default_password().to_owned())
    };

    let store = SqliteConnector::open(db)?;
    let rows = TreeSerializer::new(crypto, &key).serialize(&tree)?;
    store.replace_rows(&rows)?;
    MetaDataRetriever::new()
        .with_local_cache(!args.get_flag("no-local-cache"))
        .write_database_metadata(tree.root(), &key, crypto, &store)?;

    tracing::info!(store = %db.display(), nodes = tree.len(), "seeded store");
    Ok(())
}

fn show_cache(
    args: &ArgMatches,
    settings: &Settings,
    crypto: Arc<dyn CryptographyProvider>,
) -> anyhow::Result<()> {
    let path = match args.get_one::<PathBuf>("path") {
        Some(path) => path.clone(),
        None => match &settings.loader.cache_path {
            Some(path) => path.clone(),
            None => paths::default_cache_path()?,
        },
    };
    let tree = CacheStore::new(&path, crypto).read()?;
    print_tree(&tree, args.get_flag("json"))
}

fn print_tree(tree: &ConnectionTree, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", render::tree_json(tree)?);
    } else {
        print!("{}", render::render_tree(tree));
    }
    Ok(())
}
