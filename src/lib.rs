pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod import;
pub mod services;
pub mod sheet;

use std::sync::Arc;
use tokio::signal;
use tokio::sync::{RwLock, broadcast};

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
pub use config::Config;
use db::Store;
use services::{ImportService, Scheduler, SeaOrmImportService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Daemon => run_daemon(config).await,

        Commands::Init => cli::cmd_init(&config).await,

        Commands::ImportRanking {
            board,
            part,
            issue,
            issues,
            file,
            strict,
        } => cli::cmd_import_ranking(&config, board, part, issue, issues, file, strict).await,

        Commands::ImportSnapshots {
            date,
            from,
            to,
            file,
            strict,
        } => cli::cmd_import_snapshots(&config, date, from, to, file, strict).await,

        Commands::ImportCatalog { file, strict } => {
            cli::cmd_import_catalog(&config, &file, strict).await
        }

        Commands::ResolveNames { file } => cli::cmd_resolve_names(&config, &file).await,

        Commands::UpdateStreaks { date } => cli::cmd_update_streaks(&config, date).await,

        Commands::Ranking {
            board,
            part,
            issue,
            page,
            page_size,
            order,
        } => cli::cmd_ranking(&config, board, part, issue, page, page_size, order).await,

        Commands::Song { id } => cli::cmd_song(&config, id).await,
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder
            .extra_field("pid", std::process::id().to_string())?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

fn install_metrics_exporter(config: &Config) -> anyhow::Result<()> {
    if !config.observability.metrics_enabled {
        return Ok(());
    }
    let Some(port) = config.observability.metrics_port else {
        info!("No metrics_port configured, Prometheus exporter disabled");
        return Ok(());
    };

    use metrics_exporter_prometheus::PrometheusBuilder;
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!("Prometheus metrics exporter listening on port {}", port);
    Ok(())
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "vocabili v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    install_metrics_exporter(&config)?;

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    store.ping().await?;

    let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));
    let imports: Arc<dyn ImportService> = Arc::new(SeaOrmImportService::new(
        store,
        Arc::new(RwLock::new(config.clone())),
        event_bus,
    ));

    let scheduler = Arc::new(Scheduler::new(imports, config.scheduler.clone()));

    let scheduler_handle = {
        let sched = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = sched.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler.stop().await;
    if let Err(e) = scheduler_handle.await {
        error!("Scheduler task ended abnormally: {}", e);
    }
    info!("Daemon stopped");

    Ok(())
}
