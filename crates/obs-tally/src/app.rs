use crate::{
    AdjustDirection, AppCommand, AppError, AppResult, MenuIds, TrayCommand, TrayView,
    config::{Config, ConfigSource},
};

use std::{panic::Location, path::PathBuf, time::Duration};

use error_location::ErrorLocation;
use obs_tally_core::{CoreResult, EngineHandle};
use tao::event_loop::EventLoopProxy;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

/// Main application state.
///
/// Runs on the async runtime thread. Sends tray updates back to the main
/// thread via `tray_proxy` because `TrayIcon` is `!Send` and must remain on
/// the UI thread.
pub struct App {
    pub(crate) engine: EngineHandle,
    pub(crate) engine_task: JoinHandle<CoreResult<()>>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) config: Config,
    pub(crate) config_source: ConfigSource,
    pub(crate) config_path: PathBuf,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) menu_ids: MenuIds,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("OBS Tally starting");

        // MenuEvent::receiver() is a blocking crossbeam receiver; one
        // blocking task forwards menu clicks and exits once tray_event_rx
        // is dropped.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let mut display_rx = self.engine.subscribe();
        self.refresh_tray();

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    if let Some(cmd) = self.menu_ids.command_for(&event.id)
                        && let Err(e) = self.command_tx.send(cmd).await
                    {
                        error!(error = ?e, "Failed to forward menu command");
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    if let Err(e) = self.handle_command(cmd).await {
                        error!(command = ?cmd, error = ?e, "Failed to handle command");
                    }
                }

                changed = display_rx.changed() => {
                    if changed.is_err() {
                        warn!("Engine stopped unexpectedly, shutting down");
                        break;
                    }
                    self.refresh_tray();
                }
            }
        }

        self.stop_engine().await;

        drop(tray_event_rx);

        match tokio::time::timeout(Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        let _ = self.shutdown_tx.send(true);
        let _ = self.tray_proxy.send_event(TrayCommand::Shutdown);
        info!("OBS Tally shut down successfully");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn handle_command(&mut self, cmd: AppCommand) -> AppResult<()> {
        match cmd {
            AppCommand::AdjustTotal(direction) => {
                let delta = adjust_delta(direction, self.config.display.adjust_step());
                self.engine.adjust_total_by(delta).await?;
            }
            AppCommand::ResetTotal => {
                self.engine.reset_total().await?;
                info!("Total reset requested");
            }
            AppCommand::ToggleDisplayMode => {
                self.config.display.mode = self.config.display.mode.toggled();
                info!(mode = %self.config.display.mode, "Display mode changed");
                self.refresh_tray();
                self.config
                    .save_if_writable(&self.config_path, self.config_source)?;
            }
            AppCommand::Reconnect => {
                (self.config, self.config_source) = Config::load_with_source(&self.config_path)?;
                self.engine
                    .reconfigure(self.config.connection.to_settings())
                    .await?;
                self.refresh_tray();
            }
            AppCommand::OpenSettings => {
                open::that(&self.config_path).map_err(|e| AppError::ConfigError {
                    reason: format!("Failed to open {}: {}", self.config_path.display(), e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
                info!(config_path = ?self.config_path, "Opened settings file");
            }
            AppCommand::Shutdown => {}
        }

        Ok(())
    }

    fn refresh_tray(&self) {
        let view = TrayView::render(&self.engine.display(), self.config.display.mode);
        if self.tray_proxy.send_event(TrayCommand::Update(view)).is_err() {
            warn!("Event loop closed, tray not updated");
        }
    }

    /// Fold any active session and wait for the engine to finish.
    async fn stop_engine(&mut self) {
        if let Err(e) = self.engine.shutdown().await {
            warn!(error = ?e, "Engine already stopped");
        }

        match tokio::time::timeout(Duration::from_secs(2), &mut self.engine_task).await {
            Ok(Ok(Ok(()))) => info!("Engine stopped cleanly"),
            Ok(Ok(Err(e))) => error!(error = ?e, "Engine stopped with error"),
            Ok(Err(e)) => error!(error = ?e, "Engine task panicked"),
            Err(_) => warn!("Engine did not stop within timeout"),
        }
    }
}

/// Signed delta for one adjust step.
pub(crate) fn adjust_delta(direction: AdjustDirection, step: i64) -> i64 {
    match direction {
        AdjustDirection::Increase => step,
        AdjustDirection::Decrease => -step,
    }
}
