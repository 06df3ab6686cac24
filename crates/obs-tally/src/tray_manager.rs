//! System tray icon acting as the on-screen tally.
//!
//! The icon colour follows the recording state, the title (macOS menu bar)
//! shows the selected figure and the tooltip carries both figures plus the
//! connection status. The context menu drives the user commands.

use crate::{
    AdjustDirection, AppCommand, AppError, AppResult, TrayIconState, TrayView,
    config::DisplayConfig, tray_view::step_label,
};

use std::panic::Location;

use error_location::ErrorLocation;
use image::{Rgba, RgbaImage};
use tracing::{debug, info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const ICON_SIZE: u32 = 32;

/// Ids of the tray menu items, used to route menu events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuIds {
    /// Session/total toggle.
    pub toggle_mode: MenuId,
    /// Add one adjust step.
    pub increase: MenuId,
    /// Subtract one adjust step.
    pub decrease: MenuId,
    /// Reset the total.
    pub reset: MenuId,
    /// Reload settings and reconnect.
    pub reconnect: MenuId,
    /// Open the config file.
    pub settings: MenuId,
    /// Quit.
    pub exit: MenuId,
}

impl MenuIds {
    /// Command for a clicked menu item, if it is one of ours.
    pub fn command_for(&self, id: &MenuId) -> Option<AppCommand> {
        let command = if *id == self.toggle_mode {
            AppCommand::ToggleDisplayMode
        } else if *id == self.increase {
            AppCommand::AdjustTotal(AdjustDirection::Increase)
        } else if *id == self.decrease {
            AppCommand::AdjustTotal(AdjustDirection::Decrease)
        } else if *id == self.reset {
            AppCommand::ResetTotal
        } else if *id == self.reconnect {
            AppCommand::Reconnect
        } else if *id == self.settings {
            AppCommand::OpenSettings
        } else if *id == self.exit {
            AppCommand::Shutdown
        } else {
            return None;
        };
        Some(command)
    }
}

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    status_item: MenuItem,
    toggle_mode_item: MenuItem,
    menu_ids: MenuIds,
    icon_state: TrayIconState,
}

impl TrayManager {
    /// Create the tray icon in the offline state.
    #[track_caller]
    #[instrument(skip(display_config), fields(display = ?display_config))]
    pub fn new(display_config: &DisplayConfig) -> AppResult<Self> {
        let menu = Menu::new();

        let step = step_label(display_config.adjust_step_seconds);
        let status_item = MenuItem::new("Disconnected", false, None);
        let toggle_mode_item = MenuItem::new(display_config.mode.toggle_label(), true, None);
        let increase_item = MenuItem::new(format!("Add {}", step), true, None);
        let decrease_item = MenuItem::new(format!("Subtract {}", step), true, None);
        let reset_item = MenuItem::new("Reset Total", true, None);
        let reconnect_item = MenuItem::new("Reconnect", true, None);
        let settings_item = MenuItem::new("Open Settings", true, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let menu_ids = MenuIds {
            toggle_mode: toggle_mode_item.id().clone(),
            increase: increase_item.id().clone(),
            decrease: decrease_item.id().clone(),
            reset: reset_item.id().clone(),
            reconnect: reconnect_item.id().clone(),
            settings: settings_item.id().clone(),
            exit: exit_item.id().clone(),
        };

        menu.append_items(&[
            &status_item,
            &PredefinedMenuItem::separator(),
            &toggle_mode_item,
            &increase_item,
            &decrease_item,
            &reset_item,
            &PredefinedMenuItem::separator(),
            &reconnect_item,
            &settings_item,
            &exit_item,
        ])
        .map_err(|e| AppError::TrayError {
            reason: format!("Failed to build tray menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let icon_state = TrayIconState::Offline;
        let tray_icon = TrayIconBuilder::new()
            .with_tooltip("OBS Tally - Disconnected")
            .with_menu(Box::new(menu))
            .with_icon(Self::build_icon(icon_state)?)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            status_item,
            toggle_mode_item,
            menu_ids,
            icon_state,
        })
    }

    /// Redraw icon, title, tooltip and menu labels.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update(&mut self, view: &TrayView) -> AppResult<()> {
        if view.icon != self.icon_state {
            self.tray_icon
                .set_icon(Some(Self::build_icon(view.icon)?))
                .map_err(|e| AppError::TrayError {
                    reason: format!("Failed to update icon: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            debug!(from = ?self.icon_state, to = ?view.icon, "Tray icon changed");
            self.icon_state = view.icon;
        }

        self.tray_icon
            .set_tooltip(Some(&view.tooltip))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon.set_title(Some(&view.title));

        self.status_item.set_text(&view.status);
        self.toggle_mode_item.set_text(view.mode.toggle_label());

        Ok(())
    }

    /// Draw a filled circle in the state's colour.
    #[track_caller]
    fn build_icon(state: TrayIconState) -> AppResult<Icon> {
        let color = Rgba(state.color());
        let center = (ICON_SIZE as f32 - 1.0) / 2.0;
        let radius = ICON_SIZE as f32 / 2.0 - 1.0;

        let image = RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
            let (dx, dy) = (x as f32 - center, y as f32 - center);
            if dx * dx + dy * dy <= radius * radius {
                color
            } else {
                Rgba([0, 0, 0, 0])
            }
        });

        Icon::from_rgba(image.into_raw(), ICON_SIZE, ICON_SIZE).map_err(|e| AppError::TrayError {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Ids of the menu items, for routing menu events.
    pub fn menu_ids(&self) -> &MenuIds {
        &self.menu_ids
    }
}
