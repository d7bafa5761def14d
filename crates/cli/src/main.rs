use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use specsource_api::ApiClient;
use specsource_engine::{
    DataSourceFactory, HttpRemoteLister, HttpTelemetry, RawFilter, ResourceData, TelemetryHandler, TracingTelemetry,
    FILTER_PROPERTY_NAME,
};
use specsource_registry::{ResourceCatalog, SpecSourceConfig};
use specsource_types::{ItemValue, SpecResource};
use specsource_util::expand_tilde;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "specsource", version, about = "Query OpenAPI collections as filterable data sources")]
struct Cli {
    /// Configuration file (default: <config dir>/specsource/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the data sources an OpenAPI document exposes
    Resources {
        #[arg(long)]
        spec: Option<String>,
    },
    /// Print the queryable schema of a data source as JSON
    Schema {
        #[arg(long)]
        spec: Option<String>,
        /// Resource name, with or without the `data_` prefix
        #[arg(long)]
        resource: String,
    },
    /// Read the single item matching the given filters
    Read {
        #[arg(long)]
        spec: Option<String>,
        #[arg(long)]
        resource: String,
        /// Filter as NAME=VALUE[,VALUE..]; repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<RawFilter>,
        /// Parent identifier as PROPERTY=ID; repeatable
        #[arg(long = "parent", value_parser = parse_key_value)]
        parents: Vec<(String, String)>,
        #[arg(long)]
        base_url: Option<String>,
        /// Extra request header as NAME=VALUE; repeatable
        #[arg(long = "header", value_parser = parse_key_value)]
        headers: Vec<(String, String)>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => SpecSourceConfig::load_from(path),
        None => SpecSourceConfig::load(),
    }
    .with_env_overrides();

    match cli.command {
        Commands::Resources { spec } => {
            let catalog = load_catalog(spec.as_deref(), &config)?;
            for resource in catalog.resources() {
                println!("{}\t{}", resource.data_source_name(), resource.path_template());
            }
        }
        Commands::Schema { spec, resource } => {
            let catalog = load_catalog(spec.as_deref(), &config)?;
            let factory = factory_for(&catalog, &resource)?;
            let schema = factory.schema()?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Commands::Read {
            spec,
            resource,
            filters,
            parents,
            base_url,
            headers,
        } => {
            let catalog = load_catalog(spec.as_deref(), &config)?;
            let factory = factory_for(&catalog, &resource)?;

            let base_url = base_url
                .or_else(|| config.base_url.clone())
                .or_else(|| catalog.base_url().map(str::to_string))
                .ok_or_else(|| anyhow!("no base URL: pass --base-url, set SPECSOURCE_BASE_URL or add servers to the document"))?;
            let mut request_headers = config.headers.clone();
            request_headers.extend(headers);
            let client = ApiClient::new(&base_url, &request_headers, config.timeout())?;
            let lister = HttpRemoteLister::new(client);
            let http_telemetry = config.telemetry_endpoint.as_deref().map(HttpTelemetry::new);
            let telemetry: &dyn TelemetryHandler = match http_telemetry.as_ref() {
                Some(http_telemetry) => http_telemetry,
                None => &TracingTelemetry,
            };

            let mut data = request_data(&filters, parents);
            let outcome = factory.read(&mut data, &lister, telemetry).await;
            if let Some(http_telemetry) = http_telemetry.as_ref() {
                http_telemetry.flush().await;
            }
            outcome?;
            info!(resource = %resource, id = ?data.id, "read succeeded");
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }
    Ok(())
}

fn load_catalog(spec: Option<&str>, config: &SpecSourceConfig) -> Result<ResourceCatalog> {
    let spec = spec
        .or(config.spec.as_deref())
        .context("no OpenAPI document: pass --spec or set `spec` in the configuration file")?;
    let path = expand_tilde(spec);
    debug!(path = %path.display(), "loading OpenAPI document");
    ResourceCatalog::load(&path)
}

fn factory_for(catalog: &ResourceCatalog, name: &str) -> Result<DataSourceFactory> {
    let Some(resource) = catalog.find(name) else {
        bail!(
            "unknown resource '{}'; available: {}",
            name,
            catalog.list_names().join(", ")
        );
    };
    Ok(DataSourceFactory::new(Arc::new(resource.clone())))
}

fn request_data(filters: &[RawFilter], parents: Vec<(String, String)>) -> ResourceData {
    let mut data = ResourceData::new();
    if !filters.is_empty() {
        data.attributes.insert(
            FILTER_PROPERTY_NAME.to_string(),
            ItemValue::List(filters.iter().map(RawFilter::to_item_value).collect()),
        );
    }
    let parents: IndexMap<String, ItemValue> = parents
        .into_iter()
        .map(|(property, id)| (property, ItemValue::String(id)))
        .collect();
    data.attributes.extend(parents);
    data
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{input}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{input}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_filter(input: &str) -> Result<RawFilter, String> {
    let (name, values) = parse_key_value(input)?;
    let values = values
        .split(',')
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    Ok(RawFilter::new(name, values))
}
