/// Direction of a manual total correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustDirection {
    /// Add the configured step.
    Increase,
    /// Subtract the configured step.
    Decrease,
}

/// Commands sent from the hotkey handler and tray menu to the main application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Correct the total by one adjust step.
    AdjustTotal(AdjustDirection),
    /// Zero the persisted total.
    ResetTotal,
    /// Switch the tray title between session and total time.
    ToggleDisplayMode,
    /// Reload connection settings from the config file and reconnect.
    Reconnect,
    /// Open the config file in the default editor.
    OpenSettings,
    /// Request application shutdown.
    Shutdown,
}
