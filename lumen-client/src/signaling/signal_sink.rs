use lumen_core::ClientSignal;
use tokio::sync::mpsc;
use tracing::debug;

/// Outbound half of the relay connection, as seen by links.
///
/// Sending never blocks and never fails loudly: a closed relay connection
/// simply swallows frames, the same way the relay drops undeliverable ones.
pub trait SignalSink: Send + Sync {
    fn send(&self, signal: ClientSignal);
}

impl SignalSink for mpsc::UnboundedSender<ClientSignal> {
    fn send(&self, signal: ClientSignal) {
        if mpsc::UnboundedSender::send(self, signal).is_err() {
            debug!("Relay connection closed, dropping outbound signal");
        }
    }
}
