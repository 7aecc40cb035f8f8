// Explorer join example
// Author: Gabriel Demetrios Lafis

use std::io;
use std::sync::Arc;

use topledger_explorer::{
    data::ApiCatalog,
    fetch::TopLedgerClient,
    processing::{translate, ChartConfiguration, ChartKind, ExplorerSession, VisualizationKind},
    utils::{init_logging, UpstreamConfig},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging(log::LevelFilter::Info)?;

    // Load the catalog; without a snapshot this is the built-in SOL burn entry
    let catalog = Arc::new(ApiCatalog::load("public/api-cache.json"));
    let client = TopLedgerClient::new(&UpstreamConfig::default())?;

    // Select a date column and a value column from the same API
    let mut session = ExplorerSession::new(catalog);
    session.select("sol-burn", "block_date")?;
    session.select("sol-burn", "sol_burn")?;

    session.refetch(&client, None).await;

    for column in session.columns() {
        match &column.error {
            Some(err) => println!("{}: {:?} {}", column.key(), err.kind, err.message),
            None => println!("{}: {} rows", column.key(), column.data.len()),
        }
    }

    // Print the joined table as CSV
    let table = session.joined_table();
    table.write_csv(io::stdout())?;

    // Turn it into a renderer chart config
    let configuration = ChartConfiguration {
        name: "SOL burn".to_string(),
        description: "Daily SOL burned".to_string(),
        kind: VisualizationKind::Chart,
        chart_type: ChartKind::Line,
        x_column: "sol-burn_block_date".to_string(),
        y_columns: vec!["sol-burn_sol_burn".to_string()],
        group_by: None,
        series: Vec::new(),
        colors: Vec::new(),
    };

    let chart = translate(&configuration)?;
    println!("{}", serde_json::to_string_pretty(&chart)?);

    Ok(())
}
