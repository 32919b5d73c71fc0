/// Application entry point: configuration, clients and the polling loop
use icestat::clients::{HttpClient, OmbordClient, PortalClient};
use icestat::config::AppConfig;
use icestat::render;
use icestat::services::{self, MonitorService};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for the summary line
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("icestat=info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let config = AppConfig::load()?;
    info!(
        interval = ?config.interval,
        count = config.count,
        destination = config.destination.as_deref().unwrap_or("<final stop>"),
        "Configuration loaded"
    );

    let http_client = HttpClient::new(&config)?;
    let endpoints = config.endpoints.clone();
    let portal = PortalClient::new(
        http_client.clone(),
        endpoints.trip_info_url,
        endpoints.status_url,
    );
    let ombord = OmbordClient::new(http_client, endpoints.position_url, endpoints.connectivity_url);
    let mut service = MonitorService::new(portal, ombord, &config);

    services::run(&mut service, config.interval, config.count, |report| {
        println!("{}", render::summary_line(report))
    })
    .await;
    Ok(())
}

