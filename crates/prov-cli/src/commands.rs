use std::future::Future;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use prov_sdk::{
    BoundProduct, HttpProductStore, ProvenanceService, Resolution, SdkError, SdkResult,
};
use prov_server::ProvServer;
use prov_store::{InMemoryProductStore, ProductStore, ProvenanceClient};
use prov_tag::{LineScannerDriver, TagDriver, TagOrchestrator, UnavailableDriver};
use prov_types::{GpsCoordinates, NewProductDescriptor, NewTransfer, Product, ProductId};
use serde::Serialize;
use tracing::warn;

use crate::cli::*;
use crate::config::{ProvConfig, ScannerKind};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = ProvConfig::load(cli.config.as_deref())?
        .with_overrides(cli.server.as_deref(), cli.scanner);
    let format = cli.format;

    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Config(args) => cmd_config(&config, args),
        Command::Bind(args) => cmd_bind(&build_service(&config)?, args, format).await,
        Command::Resolve(args) => cmd_resolve(&build_service(&config)?, args, format).await,
        Command::Show(args) => cmd_show(&build_service(&config)?, args, format).await,
        Command::Transfer(args) => cmd_transfer(&build_service(&config)?, args, format).await,
        Command::List => cmd_list(&build_service(&config)?, format).await,
    }
}

fn build_service(config: &ProvConfig) -> anyhow::Result<ProvenanceService> {
    let driver: Arc<dyn TagDriver> = match config.scanner {
        ScannerKind::None => Arc::new(UnavailableDriver),
        ScannerKind::Stdin => Arc::new(LineScannerDriver::stdin()),
    };
    let tags = Arc::new(TagOrchestrator::new(driver, config.tag.clone()));

    let store: Arc<dyn ProductStore> = match &config.remote {
        Some(remote) => Arc::new(
            HttpProductStore::new(remote.clone()).context("cannot set up server connection")?,
        ),
        None => {
            warn!("no server configured; records live only until this command exits");
            Arc::new(InMemoryProductStore::new())
        }
    };

    Ok(ProvenanceService::new(
        tags,
        ProvenanceClient::new(store, config.store.clone()),
    ))
}

/// Run a tag operation, turning Ctrl-C into a cancellation of the
/// in-flight transaction.
async fn with_cancel<T>(service: &ProvenanceService, op: impl Future<Output = T>) -> T {
    let tags = Arc::clone(service.tags());
    let watcher = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !tags.cancel() {
                std::process::exit(130);
            }
        }
    });
    let out = op.await;
    watcher.abort();
    out
}

fn position(args: &LocationArgs) -> anyhow::Result<Option<GpsCoordinates>> {
    match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Ok(Some(GpsCoordinates::new(lat, lon)?)),
        (None, None) => Ok(None),
        _ => bail!("--lat and --lon must be given together"),
    }
}

/// Print a recovery hint for a failed product operation and pass it on.
fn report(err: SdkError) -> anyhow::Error {
    if err.offers_manual_entry() {
        eprintln!("{} enter the id by hand: {}", "hint:".yellow(), "prov show <product-id>".bold());
    } else if err.is_retryable() {
        eprintln!("{} present the tag again or retry", "hint:".yellow());
    }
    anyhow::Error::new(err)
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

async fn cmd_serve(config: ProvConfig, args: ServeArgs) -> anyhow::Result<()> {
    let mut server_config = config.server;
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind;
    }
    println!(
        "{} Provenance API on {}",
        "✓".green().bold(),
        format!("http://{}", server_config.bind_addr).bold()
    );
    ProvServer::new(server_config).serve().await?;
    Ok(())
}

fn cmd_config(config: &ProvConfig, args: ConfigArgs) -> anyhow::Result<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => print!("{}", config.to_toml()?),
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(&path, ProvConfig::default().to_toml()?)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("{} Wrote {}", "✓".green().bold(), path.display().to_string().bold());
        }
    }
    Ok(())
}

async fn cmd_bind(service: &ProvenanceService, args: BindArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut descriptor = NewProductDescriptor::new(args.name, args.origin, args.batch, args.date);
    if let Some(created_by) = args.created_by {
        descriptor = descriptor.with_creator(created_by);
    }
    if let Some(gps) = position(&args.location)? {
        descriptor = descriptor.with_gps(gps);
    }

    if format == OutputFormat::Text {
        println!("Present a tag to bind...");
    }
    let bound: SdkResult<BoundProduct> = if args.adopt {
        with_cancel(service, service.adopt_tag(descriptor)).await
    } else {
        with_cancel(service, service.bind_new_product(descriptor)).await
    };
    let bound = bound.map_err(report)?;

    emit(format, &bound.product, || {
        println!("{} Product bound to tag {}", "✓".green().bold(), bound.tag.id.to_string().cyan());
        if bound.simulated {
            println!("  {}", "No tag reader available; the tag step was simulated.".yellow());
        }
        print_product(&bound.product);
    })
}

async fn cmd_resolve(
    service: &ProvenanceService,
    args: ResolveArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if let Some(raw) = args.manual {
        let product = service.resolve_manual(&raw).await.map_err(report)?;
        return emit(format, &product, || print_product(&product));
    }

    if format == OutputFormat::Text {
        println!("Present a tag to resolve...");
    }
    let Resolution { read, product } = with_cancel(service, service.resolve_tag())
        .await
        .map_err(report)?;
    emit(format, &product, || {
        let how = if read.simulated { "simulated tag" } else { "tag" };
        println!("{} Resolved {} {}", "✓".green().bold(), how, read.identifier.cyan());
        print_product(&product);
    })
}

async fn cmd_show(service: &ProvenanceService, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let product = service
        .resolve_manual(&args.product_id)
        .await
        .map_err(report)?;
    emit(format, &product, || print_product(&product))
}

async fn cmd_transfer(
    service: &ProvenanceService,
    args: TransferArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut transfer = NewTransfer::new(args.location, args.transferred_by);
    if let Some(gps) = position(&args.position)? {
        transfer = transfer.with_gps(gps);
    }

    let id = match args.product_id {
        Some(raw) => ProductId::parse(&raw).map_err(|e| report(e.into()))?,
        None => {
            if format == OutputFormat::Text {
                println!("Present the product's tag...");
            }
            with_cancel(service, service.resolve_tag())
                .await
                .map_err(report)?
                .product
                .product_id
        }
    };

    let product = service
        .record_transfer(&id, transfer)
        .await
        .map_err(report)?;
    emit(format, &product, || {
        println!(
            "{} {} is now at {}",
            "✓".green().bold(),
            product.product_id.to_string().cyan(),
            product.current_location().bold()
        );
    })
}

async fn cmd_list(service: &ProvenanceService, format: OutputFormat) -> anyhow::Result<()> {
    let products = service.list_products().await.map_err(report)?;
    emit(format, &products, || {
        if products.is_empty() {
            println!("No products.");
        }
        for p in &products {
            println!(
                "{}  {}  {} ({} transfers)",
                p.product_id.to_string().cyan(),
                p.product_name.bold(),
                p.current_location(),
                p.transfer_history().len()
            );
        }
    })
}

fn print_product(product: &Product) {
    println!("{}  {}", product.product_id.to_string().cyan().bold(), product.product_name.bold());
    println!("  Origin: {}", product.origin);
    println!("  Batch: {}  Produced: {}", product.batch_number, product.date_produced);
    println!("  Created by: {}", product.created_by);
    println!("  Current location: {}", product.current_location().green());
    println!("  History:");
    for (n, t) in product.transfer_history().iter().enumerate() {
        let gps = t
            .gps_coordinates
            .map(|g| format!(" ({:.5}, {:.5})", g.latitude, g.longitude))
            .unwrap_or_default();
        println!(
            "    {}. {}  {}  by {}{}",
            n + 1,
            t.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed(),
            t.location,
            t.transferred_by,
            gps.dimmed()
        );
    }
}
