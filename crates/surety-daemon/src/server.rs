//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::event_log::EventLog;
use crate::payouts::PayoutLog;
use crate::simulator::{OracleSimulator, RandomStatus, StatusSource, StatusStrategy};
use std::sync::Arc;
use surety_ledger::{FlightSuretyLedger, SeededIndexSelector, StatusCode};
use tokio::net::TcpListener;

/// Build the ledger and the shared state the API serves from
pub fn build_state(config: &DaemonConfig) -> DaemonResult<AppState> {
    let status_override = config
        .simulator
        .status_override
        .map(StatusCode::try_from)
        .transpose()
        .map_err(DaemonError::Config)?;

    let payouts = Arc::new(PayoutLog::new());

    let selector = match config.simulator.seed {
        Some(seed) => SeededIndexSelector::new(seed),
        None => SeededIndexSelector::from_entropy(),
    };

    let mut builder = FlightSuretyLedger::builder(
        config.genesis.owner.clone(),
        config.genesis.airline.clone(),
    )
    .genesis_name(config.genesis.name.clone())
    .config(config.ledger.clone())
    .index_selector(selector)
    .funds_transfer(payouts.clone());

    if !config.genesis.funded {
        builder = builder.genesis_unfunded();
    }

    let ledger = Arc::new(builder.build()?);
    let status = Arc::new(
        StatusSource::new(RandomStatus::new(config.simulator.seed)).with_override(status_override),
    );
    let events = Arc::new(EventLog::new(config.server.event_history));

    Ok(AppState::new(ledger, status, payouts, events))
}

/// Flight Surety daemon server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let state = build_state(&config)?;
        Ok(Self { config, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let ledger = self.state.ledger.clone();

        // Record notifications for the event listing
        let recorder = self.state.events.clone().spawn_recorder(ledger.subscribe());

        // Start the oracle simulator before serving so no request goes unanswered
        let simulator = if self.config.simulator.enabled {
            let strategy: Arc<dyn StatusStrategy> = self.state.status.clone();
            let simulator = OracleSimulator::bootstrap(
                ledger.clone(),
                self.config.simulator.oracle_count,
                strategy,
            )?;
            Some(simulator.spawn(ledger.subscribe()))
        } else {
            tracing::info!("Oracle simulator disabled");
            None
        };

        // Create router
        let app = create_router(self.state.clone(), self.config.server.enable_cors);

        // Create listener
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Flight Surety daemon listening on {}", addr);

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Flight Surety daemon shutting down");

        if let Some(simulator) = simulator {
            simulator.abort();
        }
        recorder.abort();

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
