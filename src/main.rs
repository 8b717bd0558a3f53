use clap::Parser;
use std::sync::Arc;
use yield_links::config::ServiceConfig;
use yield_links::identity::{HttpIdentityVerifier, IdentityVerifier, StaticIdentity};
use yield_links::renderers::WebDriverRenderer;
use yield_links::results::{ErrorResponse, ScrapeResponse};
use yield_links::store::{LinkStore, MemoryLinkStore, RestLinkStore};
use yield_links::{ExtractionRequest, Extractor};

mod args;
use args::{Args, Command};

/// Identity used for `--dry-run` extractions
const LOCAL_IDENTITY: &str = "local";

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    match args.command {
        Command::Serve => {
            if let Err(e) = config.validate() {
                ::log::error!("Invalid configuration: {}", e);
                std::process::exit(2);
            }
            if let Err(e) = yield_links::server::run_server(config).await {
                ::log::error!("Server stopped: {}", e);
                std::process::exit(1);
            }
        }
        Command::Extract {
            url,
            token,
            dry_run,
        } => {
            let code = run_extract(config, url, token, dry_run).await;
            std::process::exit(code);
        }
    }
}

fn load_config(args: &Args) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    Ok(config.apply_env_overrides())
}

/// Runs one extraction cycle and prints the response body
async fn run_extract(config: ServiceConfig, url: String, token: Option<String>, dry_run: bool) -> i32 {
    let validated = if dry_run {
        config.validate_render()
    } else {
        config.validate()
    };
    if let Err(e) = validated {
        ::log::error!("Invalid configuration: {}", e);
        return 2;
    }

    let clients = if dry_run {
        ::log::info!("Dry run: using identity '{}' and an in-memory store", LOCAL_IDENTITY);
        Ok((
            Arc::new(StaticIdentity::new(LOCAL_IDENTITY)) as Arc<dyn IdentityVerifier>,
            Arc::new(MemoryLinkStore::new()) as Arc<dyn LinkStore>,
        ))
    } else {
        build_remote_clients(&config)
    };
    let (identity, store) = match clients {
        Ok(clients) => clients,
        Err(e) => {
            ::log::error!("Failed to build service clients: {}", e);
            return 2;
        }
    };

    let extractor = Extractor::new(
        identity,
        Arc::new(WebDriverRenderer::new(config.render.clone())),
        store,
    );

    ::log::info!("Starting extraction for URL: {}", url);
    match extractor.extract(ExtractionRequest::new(url, token)).await {
        Ok(outcome) => {
            ::log::info!("Persisted {} records", outcome.persisted);
            print_json(&ScrapeResponse {
                data: outcome.links,
            });
            0
        }
        Err(e) => {
            print_json(&ErrorResponse {
                error: e.public_message(),
            });
            1
        }
    }
}

fn build_remote_clients(
    config: &ServiceConfig,
) -> Result<(Arc<dyn IdentityVerifier>, Arc<dyn LinkStore>), reqwest::Error> {
    Ok((
        Arc::new(HttpIdentityVerifier::new(&config.identity)?),
        Arc::new(RestLinkStore::new(&config.store)?),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => ::log::error!("Failed to serialize response: {}", e),
    }
}
