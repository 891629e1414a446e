use hearnear_daemon::core::{DaemonCore, DaemonEvent};
use hearnear_daemon::gateway::Gateway;
use hearnear_daemon::http;
use hearnear_daemon::location::LocationProvider;
use hearnear_daemon::poller::NearbyPoller;
use hearnear_daemon::relay::Relay;
use hearnear_daemon::session::SessionMachine;
use hearnear_daemon::socket;
use hearnear_proto::config::Config;
use hearnear_proto::prefs::PrefsStore;
use hearnear_proto::session::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // File logging under the data dir plus stderr.
    let data_dir = hearnear_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("daemon.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hearnear_daemon=debug")),
        )
        .init();

    info!("Log file: {:?}", log_path);

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    let gateway = Gateway::new(
        config.server.base_url.clone(),
        Duration::from_secs(config.server.request_timeout_secs),
    )?;
    let session = Arc::new(SessionMachine::new(
        gateway.clone(),
        SessionStore::default_location(),
    ));

    // Background reconciliation of any persisted session; never surfaces an
    // error to the user.
    session.verify_on_start().await;

    let location = LocationProvider::from_config(&config.location)?;
    let mut relay = Relay::new(
        gateway.clone(),
        location,
        Arc::clone(&session),
        Duration::from_secs(config.relay.throttle_secs),
    );
    let last_activity = relay.last_activity_handle();
    relay.signal_start();

    let poller = Arc::new(NearbyPoller::new(
        gateway,
        Arc::clone(&session),
        config.poller.clone(),
    ));
    poller.start_auto_refresh();

    // Event channel — all external inputs funnel into DaemonCore.
    let (event_tx, event_rx) = tokio::sync::mpsc::channel::<DaemonEvent>(256);

    // Bind the capture intake socket; success is the relay's
    // "foreground registration".
    let (_intake_addr, _socket_handle) = socket::start_server(
        config.capture.bind_address.clone(),
        config.capture.port,
        event_tx.clone(),
    )
    .await?;
    relay.mark_running();

    let core = DaemonCore::new(
        config.clone(),
        relay,
        Arc::clone(&poller),
        PrefsStore::default_location(),
    );

    if config.http.enabled {
        let _http_handle = http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            http::HttpState {
                session,
                poller,
                prefs: core.prefs_handle(),
                last_activity,
                event_tx: event_tx.clone(),
            },
        );
    }

    // Ctrl-C drains into a clean shutdown of the event loop.
    let shutdown_tx = event_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(DaemonEvent::Shutdown).await;
        }
    });

    info!("Daemon initialised, running event loop");
    core.run(event_rx).await?;

    Ok(())
}
