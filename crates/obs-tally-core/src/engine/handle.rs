use crate::{
    CoreError, CoreResult,
    engine::{EngineCommand, Ingress},
    link::ConnectionSettings,
    session::DisplaySnapshot,
};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};

/// Cloneable front door to a running [`crate::Engine`].
#[derive(Clone)]
pub struct EngineHandle {
    ingress_tx: mpsc::Sender<Ingress>,
    display_rx: watch::Receiver<DisplaySnapshot>,
}

impl EngineHandle {
    pub(crate) fn new(
        ingress_tx: mpsc::Sender<Ingress>,
        display_rx: watch::Receiver<DisplaySnapshot>,
    ) -> Self {
        Self {
            ingress_tx,
            display_rx,
        }
    }

    /// Subscribe to display updates.
    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.display_rx.clone()
    }

    /// The latest display fields.
    pub fn display(&self) -> DisplaySnapshot {
        self.display_rx.borrow().clone()
    }

    /// Send a command to the engine.
    pub async fn send(&self, command: EngineCommand) -> CoreResult<()> {
        self.ingress_tx
            .send(Ingress::Command(command))
            .await
            .map_err(|e| CoreError::ChannelClosed {
                message: format!("Engine stopped, dropped {:?}", e.0),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Zero the persisted total.
    pub async fn reset_total(&self) -> CoreResult<()> {
        self.send(EngineCommand::ResetTotal).await
    }

    /// Correct the persisted total by `seconds`.
    pub async fn adjust_total_by(&self, seconds: i64) -> CoreResult<()> {
        self.send(EngineCommand::AdjustTotalBy(seconds)).await
    }

    /// Connect with the current settings.
    pub async fn connect(&self) -> CoreResult<()> {
        self.send(EngineCommand::Connect).await
    }

    /// Disconnect and stop reconnecting.
    pub async fn disconnect(&self) -> CoreResult<()> {
        self.send(EngineCommand::Disconnect).await
    }

    /// Switch to new connection settings.
    pub async fn reconfigure(&self, settings: ConnectionSettings) -> CoreResult<()> {
        self.send(EngineCommand::Reconfigure(settings)).await
    }

    /// Stop the engine after folding any active session.
    pub async fn shutdown(&self) -> CoreResult<()> {
        self.send(EngineCommand::Shutdown).await
    }
}
