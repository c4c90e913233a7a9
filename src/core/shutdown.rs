use tokio::signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Interrupt,
    Terminate,
}

impl Signal {
    fn as_str(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

/// Resolves once the process is asked to stop; in-flight requests drain after this.
pub(crate) async fn shutdown_signal() {
    let received = tokio::select! {
        signal = interrupt() => signal,
        signal = terminate() => signal,
    };

    tracing::info!(signal = received.as_str(), "shutdown signal received");
}

async fn interrupt() -> Signal {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    Signal::Interrupt
}

#[cfg(unix)]
async fn terminate() -> Signal {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
    Signal::Terminate
}

#[cfg(not(unix))]
async fn terminate() -> Signal {
    std::future::pending::<Signal>().await
}
