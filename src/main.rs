use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing_subscriber::EnvFilter;

use payana::config::Config;
use payana::engine::refresh::{Poller, refresh_all};
use payana::error::AppError;
use payana::remote::HttpServiceClient;
use payana::state::AppState;
use payana::surface::{Console, Reply, print_notifications, print_search_results};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let service = HttpServiceClient::new(&config.backend_url, config.request_timeout)?;
    tracing::info!(backend_url = %service.base_url(), "console started");
    let shared_state = Arc::new(AppState::new(Arc::new(service), &config));

    tokio::spawn(print_notifications(
        shared_state.notifications.subscribe(),
    ));
    tokio::spawn(print_search_results(
        shared_state.search_results.subscribe(),
    ));

    refresh_all(&shared_state).await;
    let poller = Poller::spawn(shared_state.clone(), config.refresh_interval);

    let mut console = Console::new(shared_state.clone(), &config);
    println!("{}", console.render_rides());
    println!("{}", console.render_drivers());

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next() => {
                let line = match line {
                    Some(Ok(line)) => line,
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "failed to read input");
                        break;
                    }
                    None => break,
                };
                match console.handle_line(&line).await {
                    Reply::Text(text) => println!("{text}"),
                    Reply::Silent => {}
                    Reply::Quit => break,
                }
            }
        }
    }

    poller.shutdown().await;
    tracing::info!("console stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
