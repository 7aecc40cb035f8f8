// TopLedger Explorer - Main executable
// Author: Gabriel Demetrios Lafis

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Arg, ArgMatches, Command};
use log::{error, info};

use topledger_explorer::{
    api::{AppState, Server, ServerConfig},
    data::ApiCatalog,
    fetch::{fetch_api_data, TopLedgerClient},
    processing::ExplorerSession,
    utils::{init_file_logging, init_logging, Config},
};

fn cli() -> Command<'static> {
    Command::new("TopLedger Explorer")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gabriel Demetrios Lafis")
        .about("Fetches, joins and charts TopLedger analytics queries")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file")
                .takes_value(true),
        )
        .subcommand(
            Command::new("server")
                .about("Run the API server")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("Sets the server host")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("Sets the server port")
                        .takes_value(true),
                ),
        )
        .subcommand(Command::new("catalog").about("List the APIs in the cache snapshot"))
        .subcommand(
            Command::new("fetch")
                .about("Fetch the rows of one API")
                .arg(Arg::new("api").value_name("API_ID").required(true)),
        )
        .subcommand(
            Command::new("join")
                .about("Join selected columns and print the table")
                .arg(
                    Arg::new("select")
                        .short('s')
                        .long("select")
                        .value_name("API_ID:COLUMN")
                        .help("Column to select; repeat for more")
                        .takes_value(true)
                        .multiple_occurrences(true)
                        .required(true),
                )
                .arg(
                    Arg::new("map")
                        .short('m')
                        .long("map")
                        .value_name("API_ID=COLUMN")
                        .help("Date column an API is aligned on")
                        .takes_value(true)
                        .multiple_occurrences(true),
                )
                .arg(Arg::new("csv").long("csv").help("Print CSV instead of JSON")),
        )
}

fn split_pair<'a>(value: &'a str, separator: char) -> anyhow::Result<(&'a str, &'a str)> {
    value
        .split_once(separator)
        .filter(|(left, right)| !left.is_empty() && !right.is_empty())
        .ok_or_else(|| anyhow!("expected '<API_ID>{}<COLUMN>', got '{}'", separator, value))
}

async fn run_join(matches: &ArgMatches, config: &Config) -> anyhow::Result<()> {
    let catalog = Arc::new(ApiCatalog::load(&config.cache.api_cache_path));
    let client = TopLedgerClient::new(&config.upstream)?;
    let mut session = ExplorerSession::new(catalog);

    for selection in matches.values_of("select").into_iter().flatten() {
        let (api_id, column) = split_pair(selection, ':')?;
        session.select(api_id, column)?;
    }
    for mapping in matches.values_of("map").into_iter().flatten() {
        let (api_id, column) = split_pair(mapping, '=')?;
        session.set_date_mapping(api_id, column);
    }

    session.refetch(&client, None).await;

    for column in session.columns() {
        if let Some(err) = &column.error {
            error!("{}: {:?} {}", column.key(), err.kind, err.message);
        }
    }

    let table = session.joined_table();
    if table.needs_date_mapping {
        bail!("multiple APIs selected; pass --map API_ID=COLUMN for each API without a selected date column");
    }

    if matches.is_present("csv") {
        table.write_csv(io::stdout())?;
    } else {
        println!("{}", serde_json::to_string_pretty(&table)?);
    }

    Ok(())
}

async fn run(matches: ArgMatches, config: Config) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("server", sub)) => {
            // Override config with command line arguments
            let host = sub.value_of("host").unwrap_or(&config.server.host).to_string();
            let port = match sub.value_of("port") {
                Some(port) => port.parse::<u16>().with_context(|| format!("invalid port '{}'", port))?,
                None => config.server.port,
            };

            let server_config = ServerConfig {
                host,
                port,
                workers: config.workers(),
                enable_cors: config.server.enable_cors,
            };

            let state = AppState::from_config(&config)?;
            info!("Serving {} APIs and {} datasets", state.catalog.len(), state.datasets.len());

            Server::new(state, server_config).run().await?;
        },
        Some(("catalog", _)) => {
            let catalog = ApiCatalog::load(&config.cache.api_cache_path);
            for api in catalog.iter() {
                println!("{}\t{}\t{}", api.id, api.name, api.columns.join(","));
            }
        },
        Some(("fetch", sub)) => {
            let api_id = sub.value_of("api").unwrap_or_default();
            let catalog = ApiCatalog::load(&config.cache.api_cache_path);
            let api = catalog
                .get(api_id)
                .ok_or_else(|| anyhow!("unknown API '{}'", api_id))?;

            let client = TopLedgerClient::new(&config.upstream)?;
            let rows = fetch_api_data(&client, api, None).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        },
        Some(("join", sub)) => run_join(sub, &config).await?,
        _ => println!("No subcommand specified. Use --help for usage information."),
    }

    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    // Load configuration
    let config = match matches.value_of("config") {
        Some(path) => Config::from_file(path).with_context(|| format!("loading config file {}", path))?,
        None => Config::default(),
    };

    // Initialize logging
    let level = config.log_level_filter();
    let logging = match config.logging.file.as_deref() {
        Some(path) => init_file_logging(level, Path::new(path)).map_err(|e| e.to_string()),
        None => init_logging(level).map_err(|e| e.to_string()),
    };
    if let Err(err) = logging {
        eprintln!("Error initializing logger: {}", err);
    }

    run(matches, config).await
}
