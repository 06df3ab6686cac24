use crate::{CoreResult, link::ConnectionSettings, session::RawStatus};

use std::future::Future;

/// One logical connection to the recording device.
///
/// Implementations report lifecycle and push events through the engine's
/// ingress queue, tagged with [`DeviceLink::generation`].
pub trait DeviceLink: Clone + Send + Sync + 'static {
    /// Open the connection and complete the handshake.
    ///
    /// Returns `Ok(())` without doing anything while an attempt is already
    /// in flight or a connection is established.
    fn connect(&self, settings: &ConnectionSettings)
    -> impl Future<Output = CoreResult<()>> + Send;

    /// Close the connection or cancel an in-flight attempt. Always safe to call.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;

    /// Ask the device for a fresh record status.
    fn get_record_status(&self) -> impl Future<Output = CoreResult<RawStatus>> + Send;

    /// Counter bumped by every connect attempt and every disconnect.
    ///
    /// Events and poll results tagged with an older generation are stale.
    fn generation(&self) -> u64;
}
