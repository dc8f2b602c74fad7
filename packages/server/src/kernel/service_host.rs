//! Long-running service supervision.
//!
//! A [`Service`] owns one loop (a worker's poll loop, the HTTP listener).
//! [`ServiceHost`] runs a set of services until SIGINT/SIGTERM, then cancels
//! the shared token and waits for each service to drain its in-flight work.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// A long-running unit of work bounded by a cancellation token.
#[async_trait::async_trait]
pub trait Service: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run until complete or until `shutdown` is cancelled. Implementations
    /// must notice cancellation between units of work and return promptly.
    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()>;
}

/// Runs services to completion, wiring OS signals to their shutdown token.
#[derive(Default)]
pub struct ServiceHost {
    services: Vec<Box<dyn Service>>,
}

impl ServiceHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: impl Service + 'static) -> Self {
        self.services.push(Box::new(service));
        self
    }

    /// Run all services; returns once every service has stopped after a
    /// signal (or on its own).
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = CancellationToken::new();

        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("shutdown signal received, draining services");
            signal_token.cancel();
        });

        let mut handles = Vec::with_capacity(self.services.len());
        for service in self.services {
            let name = service.name();
            let token = shutdown.clone();
            handles.push(tokio::spawn(async move {
                info!(service = name, "service starting");
                if let Err(e) = service.run(token).await {
                    error!(service = name, error = %e, "service exited with error");
                } else {
                    info!(service = name, "service stopped");
                }
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
        Ok(())
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
