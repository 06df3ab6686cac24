//! OBS Tally: running total of OBS recording time in the system tray.

mod app;
mod app_command;
mod config;
mod display_mode;
mod error;
mod hotkey_handler;
mod logging;
mod tray_command;
mod tray_icon_state;
mod tray_manager;
mod tray_view;

pub(crate) use {
    app::App,
    app_command::{AdjustDirection, AppCommand},
    display_mode::DisplayMode,
    error::{AppError, Result as AppResult},
    hotkey_handler::{HotkeyBindings, HotkeyHandler},
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::{MenuIds, TrayManager},
    tray_view::TrayView,
};

use crate::config::Config;

use std::sync::Arc;

use global_hotkey::GlobalHotKeyManager;
use obs_tally_core::{ConnectionSupervisor, Engine, FileTotalStore, ingress_channel};
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Application entry point.
fn main() {
    let log_dir = Config::data_dir().ok().map(|dir| dir.join("logs"));
    let log_guard = logging::init(log_dir.as_deref());

    let config_path = match Config::config_path() {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to resolve config path: {:?}", e);
            std::process::exit(1);
        }
    };

    let (config, config_source) = match Config::load_with_source(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let total_path = match Config::total_store_path() {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to resolve data directory: {:?}", e);
            std::process::exit(1);
        }
    };

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new(&config.display) {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Dropping the manager unregisters the hotkeys, so it lives in the closure.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;
    let mut startup = Some((config, config_source, config_path, total_path));

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::Update(view) => {
                        if let Err(e) = tray_manager.update(&view) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let Some((config, config_source, config_path, total_path)) = startup.take() else {
                    return;
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                // Registered on the main thread: tao's event loop pumps the
                // Windows messages needed for WM_HOTKEY delivery.
                let bindings: Option<HotkeyBindings> = match HotkeyHandler::register_hotkeys() {
                    Ok((manager, bindings)) => {
                        hotkey_manager = Some(manager);
                        Some(bindings)
                    }
                    Err(e) => {
                        warn!(error = ?e, "Global hotkeys unavailable, tray menu still works");
                        None
                    }
                };

                let tray_proxy = tray_proxy.clone();
                let menu_ids = tray_manager.menu_ids().clone();

                // Tokio runtime on its own thread; TrayManager and
                // hotkey_manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let (ingress_tx, ingress_rx) = ingress_channel();
                        let supervisor = ConnectionSupervisor::new(ingress_tx.clone());
                        let store = Arc::new(FileTotalStore::new(total_path));
                        info!(total_path = ?store.path(), "Using total store");

                        let engine = Engine::new(
                            supervisor,
                            store,
                            config.engine_settings(),
                            ingress_tx,
                            ingress_rx,
                        );
                        let engine_handle = engine.handle();
                        let engine_task = tokio::spawn(engine.run());

                        let app = App {
                            engine: engine_handle,
                            engine_task,
                            tray_proxy,
                            config,
                            config_source,
                            config_path,
                            command_tx: command_tx.clone(),
                            command_rx,
                            shutdown_tx,
                            menu_ids,
                        };

                        tokio::join!(
                            async {
                                let Some(bindings) = bindings else {
                                    return;
                                };
                                let hotkey_handler = HotkeyHandler::new(bindings, command_tx);
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        // Keep hotkey_manager and the log writer alive for the app's lifetime.
        let _ = (&hotkey_manager, &log_guard);
    });
}
