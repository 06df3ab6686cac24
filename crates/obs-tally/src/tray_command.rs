use crate::TrayView;

/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`),
/// so all tray mutations and process lifecycle events flow through this enum.
#[derive(Debug, Clone)]
pub enum TrayCommand {
    /// Redraw the tray icon, title, tooltip and menu labels.
    Update(TrayView),
    /// Shut down the application. The main thread will exit the event loop.
    Shutdown,
}
