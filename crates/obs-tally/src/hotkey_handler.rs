//! Global hotkeys for correcting the total and switching the display mode.
//!
//! CTRL+SHIFT+Up / CTRL+SHIFT+Down adjust the total by the configured step and
//! CTRL+SHIFT+M toggles between session and total time. Presses are turned
//! into [`AppCommand`]s on the async runtime.

use crate::{AdjustDirection, AppCommand, AppError, AppResult};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey, Modifiers},
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Ids of the registered hotkeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBindings {
    /// CTRL+SHIFT+Up.
    pub increase_id: u32,
    /// CTRL+SHIFT+Down.
    pub decrease_id: u32,
    /// CTRL+SHIFT+M.
    pub toggle_mode_id: u32,
}

impl HotkeyBindings {
    /// Command bound to a hotkey id, if any.
    pub fn command_for(&self, id: u32) -> Option<AppCommand> {
        if id == self.increase_id {
            Some(AppCommand::AdjustTotal(AdjustDirection::Increase))
        } else if id == self.decrease_id {
            Some(AppCommand::AdjustTotal(AdjustDirection::Decrease))
        } else if id == self.toggle_mode_id {
            Some(AppCommand::ToggleDisplayMode)
        } else {
            None
        }
    }
}

/// Forwards hotkey presses to the main application.
pub struct HotkeyHandler {
    bindings: HotkeyBindings,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Register the three global hotkeys.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkeys to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkeys() -> AppResult<(GlobalHotKeyManager, HotkeyBindings)> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let modifiers = Some(Modifiers::CONTROL | Modifiers::SHIFT);
        let increase = HotKey::new(modifiers, Code::ArrowUp);
        let decrease = HotKey::new(modifiers, Code::ArrowDown);
        let toggle_mode = HotKey::new(modifiers, Code::KeyM);

        for (hotkey, label) in [
            (increase, "CTRL+SHIFT+Up"),
            (decrease, "CTRL+SHIFT+Down"),
            (toggle_mode, "CTRL+SHIFT+M"),
        ] {
            manager
                .register(hotkey)
                .map_err(|e| AppError::HotkeyRegistrationFailed {
                    reason: format!("Failed to register {}: {}", label, e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            info!(hotkey = label, "Global hotkey registered");
        }

        Ok((
            manager,
            HotkeyBindings {
                increase_id: increase.id(),
                decrease_id: decrease.id(),
                toggle_mode_id: toggle_mode.id(),
            },
        ))
    }

    /// Create a handler for previously registered hotkeys.
    pub fn new(bindings: HotkeyBindings, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self {
            bindings,
            command_tx,
        }
    }

    /// Run the hotkey handler event loop until a shutdown signal is received.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // GlobalHotKeyEvent::receiver() is a blocking crossbeam receiver, so
        // one blocking task forwards events. It exits on the first send after
        // event_rx is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    if let Err(e) = self.dispatch(event.id, event.state).await {
                        warn!(error = ?e, "Failed to forward hotkey");
                    }
                }
            }
        }

        drop(event_rx);

        // The blocking task may sit in recv() until the next key press.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Forward the command bound to `id`; releases and unknown ids are ignored.
    #[instrument(skip(self))]
    pub(crate) async fn dispatch(&self, id: u32, state: HotKeyState) -> AppResult<()> {
        if state != HotKeyState::Pressed {
            return Ok(());
        }
        let Some(command) = self.bindings.command_for(id) else {
            return Ok(());
        };

        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send {:?}: {}", command, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(command = ?command, "Hotkey pressed");
        Ok(())
    }
}
