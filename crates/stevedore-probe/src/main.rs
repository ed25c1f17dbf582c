use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use stevedore::catalog::{CatalogDefinition, CatalogRegistry};
use stevedore::resources::{ConsumableMap, ResourceDescription, ResourceKind};
use stevedore::setup::setup_logging;
use stevedore::worker::{ComputeWorker, ServiceWorker, Worker, load_node_configuration};

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum OutputMode {
    #[default]
    Text,
    Json,
}

/// Loads a node configuration and a core catalog and prints what the node
/// could run.
#[derive(Parser)]
#[command(version, about)]
struct Opts {
    /// Node configuration (TOML)
    #[arg(long, env = "STEVEDORE_NODE_CONFIG")]
    config: PathBuf,

    /// Core catalog (TOML)
    #[arg(long, env = "STEVEDORE_CATALOG")]
    catalog: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputMode::Text)]
    output_mode: OutputMode,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn print_worker<D: ResourceDescription>(
    worker: &Worker<D>,
    map: &ConsumableMap,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Text => print!("{}", worker.monitoring_report(map)),
        OutputMode::Json => {
            let tables = worker.tables();
            let value = serde_json::json!({
                "name": worker.name(),
                "kind": D::KIND,
                "description": worker.description().describe(map),
                "max_slots": worker.max_slots(),
                "catalog_version": tables.catalog_version(),
                "executable_cores": tables.executable_cores(),
                "core_slots": tables.all_core_slots(),
                "ideal_slots": tables.all_ideal_slots(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    setup_logging(opts.debug);

    let config = load_node_configuration(&opts.config)
        .with_context(|| format!("Cannot load node configuration {}", opts.config.display()))?;
    let content = std::fs::read_to_string(&opts.catalog)
        .with_context(|| format!("Cannot read catalog {}", opts.catalog.display()))?;
    let definition = CatalogDefinition::from_toml(&content)?;

    let mut map = ConsumableMap::default();
    let registry = CatalogRegistry::new();
    let changed = definition.register_into(&registry, &mut map)?;
    log::debug!("Catalog registered; {} core(s) changed", changed.len());
    let catalog = registry.snapshot();

    let resources = &config.resources;
    match resources.description.kind() {
        ResourceKind::Compute => {
            let description = resources.description.to_compute(&mut map)?;
            let worker =
                ComputeWorker::new(config.name.clone(), description, resources.max_slots, &catalog);
            print_worker(&worker, &map, opts.output_mode)
        }
        ResourceKind::Service => {
            let description = resources.description.to_service()?;
            let worker =
                ServiceWorker::new(config.name.clone(), description, resources.max_slots, &catalog);
            print_worker(&worker, &map, opts.output_mode)
        }
    }
}
