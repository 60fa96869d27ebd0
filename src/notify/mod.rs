//! Notification delivery.
//!
//! The monitor only needs to hand a finished message to a destination; how
//! it gets there is the [`Notifier`]'s business. Two implementations are
//! provided:
//!
//! - [`TelegramNotifier`]: posts to a Telegram channel via the Bot API
//! - [`LogNotifier`]: logs the message instead of sending it (dry run)

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

mod log;
mod telegram;

pub use log::LogNotifier;
pub use telegram::{
    DEFAULT_BASE_URL as DEFAULT_TELEGRAM_BASE_URL, TelegramConfig, TelegramNotifier,
};

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The request could not be sent or the response could not be read.
    #[error("failed to send message: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the message.
    #[error("message rejected with status {status}: {body:?}")]
    Rejected { status: u16, body: String },

    /// Delivery did not complete within the configured timeout.
    #[error("message delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Delivers a text message to a destination.
///
/// The destination is passed through untouched; callers supply the fully
/// qualified address (for Telegram channels, `@channel_name`).
pub trait Notifier: Send + Sync {
    /// Send `text` to `destination`.
    fn send_message(
        &self,
        destination: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}
