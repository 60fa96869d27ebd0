//! Broadcast message text.
//!
//! Messages are in Polish, for the DUW audience, and HTML formatted; the
//! Telegram notifier sends them with `parse_mode = "HTML"`.

use crate::types::Queue;

/// Builds the broadcast text describing `queue`'s current condition.
///
/// An enabled queue gets the ticket count, plus the ticket being served when
/// upstream reports one. An active but disabled queue gets a short
/// "unavailable" note.
pub fn build_status_message(queue: &Queue) -> String {
    if !queue.enabled {
        return format!("💤 Kolejka <b>{}</b> jest obecnie niedostępna.", queue.name);
    }

    if queue.ticket_value.is_empty() {
        format!(
            "🔔 Kolejka <b>{}</b> jest teraz dostępna!\n🧾 Pozostało biletów: <b>{}</b>",
            queue.name, queue.tickets_left
        )
    } else {
        format!(
            "🔔 Kolejka <b>{}</b> jest teraz dostępna!\n🎟️ Ostatni przywołany bilet: <b>{}</b>\n🧾 Pozostało biletów: <b>{}</b>",
            queue.name, queue.ticket_value, queue.tickets_left
        )
    }
}
