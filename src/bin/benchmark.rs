use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use db_benchmark::{
    Backend, BenchmarkConfig, ConnectionParameters, DispatchReport, Dispatcher, Engine,
    MetricsRegistry, bootstrap,
    config::{ExporterConfig, read_config_file},
};
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Flood a database with concurrent inserts and export the latencies")]
struct Args {
    /// Config file (.toml or .json), flags below are ignored when given
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// mysql, postgres, sqlite or memory (any case)
    #[arg(long, env = "DBENGINE", value_parser = Engine::from_str, default_value_t = Engine::Mysql)]
    engine: Engine,

    #[arg(long, env = "DBUSER", default_value = "")]
    user: String,

    #[arg(long, env = "DBPASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    #[arg(long, env = "DBHOSTNAME", default_value = "localhost")]
    host: String,

    /// Defaults to the engine's well-known port
    #[arg(long, env = "DBPORT")]
    port: Option<u16>,

    /// Database name, or the database file for sqlite
    #[arg(long, env = "DBNAME", default_value = "")]
    database: String,

    /// Connection pool size, also the number of workers
    #[arg(long, default_value_t = 5)]
    pool_size: u32,

    /// Number of rows to insert
    #[arg(short, long, default_value_t = 500_000)]
    jobs: usize,

    /// Skip applying migrations before the run
    #[arg(long)]
    no_migrate: bool,

    #[arg(long, default_value = "./migrations")]
    migrations_dir: PathBuf,

    /// Address of the metrics exporter
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    #[arg(long)]
    no_exporter: bool,

    /// Keep serving metrics after the run until Ctrl-C
    #[arg(long)]
    hold: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> anyhow::Result<BenchmarkConfig> {
        if let Some(path) = &self.config {
            return read_config_file(path);
        }

        let mut connection = ConnectionParameters::new(self.engine);
        connection.user = self.user;
        connection.password = self.password;
        connection.host = self.host;
        connection.port = self.port;
        connection.database = self.database;
        connection.pool_size = self.pool_size;
        connection.auto_migrate = !self.no_migrate;
        connection.migrations_dir = self.migrations_dir;

        Ok(BenchmarkConfig {
            connection,
            jobs: self.jobs,
            exporter: ExporterConfig {
                enabled: !self.no_exporter,
                bind_addr: self.listen,
            },
        })
    }
}

fn init(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = filter::Targets::new().with_targets(vec![
        ("db_benchmark", level),
        ("tower_http", LevelFilter::WARN),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Fatal errors come back here and are reported once by `main`
async fn run(args: Args) -> anyhow::Result<()> {
    let hold = args.hold;
    let config = args.into_config()?;
    trace!("running with {config:?}");

    let metrics = Arc::new(MetricsRegistry::new()?);

    let backend: Arc<dyn Backend> =
        Arc::new(bootstrap::connect(config.connection.clone(), metrics.clone()).await?);

    let exporter = spawn_exporter(&config.exporter, &metrics, &backend).await?;

    let dispatcher = Dispatcher::new(
        backend.clone(),
        config.connection.pool_size as usize,
        config.jobs,
    );
    let report = dispatcher
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("unable to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await;
    summarize(&report);

    if hold && exporter.is_some() {
        info!("run finished, serving metrics until Ctrl-C");
        tokio::signal::ctrl_c().await?;
    }

    backend.close().await;
    Ok(())
}

#[cfg(feature = "exporter")]
async fn spawn_exporter(
    config: &ExporterConfig,
    metrics: &Arc<MetricsRegistry>,
    backend: &Arc<dyn Backend>,
) -> anyhow::Result<Option<SocketAddr>> {
    if !config.enabled {
        return Ok(None);
    }

    let state = db_benchmark::api::ApiState::new(metrics.clone(), backend.clone());
    let addr = db_benchmark::api::spawn_exporter(config.bind_addr, state)
        .await
        .map_err(|e| e.context("unable to start metrics exporter"))?;
    Ok(Some(addr))
}

#[cfg(not(feature = "exporter"))]
async fn spawn_exporter(
    config: &ExporterConfig,
    _metrics: &Arc<MetricsRegistry>,
    _backend: &Arc<dyn Backend>,
) -> anyhow::Result<Option<SocketAddr>> {
    if config.enabled {
        warn!("built without the exporter feature, metrics are not served");
    }
    Ok(None)
}

fn summarize(report: &DispatchReport) {
    info!(
        "{} of {} inserts succeeded, {} failed in {:.2?} ({:.0} inserts/s){}",
        report.succeeded(),
        report.enqueued,
        report.failed,
        report.elapsed,
        report.throughput(),
        if report.cancelled { ", cancelled" } else { "" }
    );
}
