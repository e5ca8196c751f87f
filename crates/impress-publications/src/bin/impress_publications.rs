//! impress-publications CLI
//!
//! Renders a JSON array of records into publication list markup.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use impress_publications::{
    records_from_json, Expand, GroupMode, Interaction, MemorySurface, Presenter,
    PublicationsConfig, RecordStore, Surface, ITEM_ATTR,
};

#[derive(Parser, Debug)]
#[command(name = "impress-publications", version, about = "Render publication lists")]
struct Cli {
    /// JSON file holding an array of records
    records: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Group records: none or type
    #[arg(short, long)]
    group: Option<GroupMode>,

    /// Groups to pre-expand: `all` or a comma-separated list of types
    #[arg(short, long)]
    expand: Option<Expand>,

    /// Open the details of the record with this key
    #[arg(short, long)]
    details: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PublicationsConfig::from_toml(&fs::read_to_string(path)?)?,
        None => PublicationsConfig::default(),
    };
    if let Some(group) = cli.group {
        config.group = group;
    }
    if let Some(expand) = cli.expand {
        config.expand = expand;
    }
    config.validate()?;

    let records = records_from_json(&fs::read_to_string(&cli.records)?)?;
    tracing::debug!("Loaded {} records from {:?}", records.len(), cli.records);

    let mut store = RecordStore::new(records);
    store.group(config.group, &config.expand)?;

    let mut presenter = Presenter::new(MemorySurface::new(), config);
    presenter.toggle_spinner(Some(true));
    presenter.display_publications(store)?;
    presenter.toggle_spinner(Some(false));

    if let Some(key) = &cli.details {
        match presenter.surface().find_by_attribute(ITEM_ATTR, key) {
            Some(origin) => {
                presenter.handle_interaction(&Interaction::at(origin))?;
            }
            None => {
                tracing::warn!("No details marker for record {}", key);
            }
        }
    }

    println!("{}", presenter.surface().markup());
    Ok(())
}
