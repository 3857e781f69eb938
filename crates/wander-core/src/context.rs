//! The borrowed view every engine works through during one session.

use tokio::time::Duration;

use crate::catalog::Catalog;
use crate::config::BotConfig;
use crate::session::Gateway;

/// Gateway, configuration, and catalog for one authenticated session.
pub struct SessionContext<'a, C> {
    /// Serialized access to the session.
    pub gateway: &'a Gateway<C>,
    /// Active configuration.
    pub config: &'a BotConfig,
    /// Display-name lookup.
    pub catalog: &'a dyn Catalog,
}

impl<C> Clone for SessionContext<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for SessionContext<'_, C> {}

/// Sleep for a pacing interval. Zero returns immediately.
pub(crate) async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
