//! Dry-run notifier.

use tracing::info;

use super::{Notifier, NotifyError};

/// Logs notifications instead of delivering them.
///
/// Used when no bot token is configured, so the monitor can run end to end
/// without publishing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        info!(destination, text, "Notification (dry run, not sent)");
        Ok(())
    }
}
