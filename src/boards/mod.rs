//! One board per console page.
//!
//! A board pairs a locally held collection with the backend calls that page
//! makes. Status changes and reordering go through [`Optimistic`](crate::reconcile::Optimistic);
//! create, edit and delete wait for the backend before touching local state.
//! Analytics and settings hold nothing locally.

#[macro_use]
mod macros;

mod analytics_board;
mod banner_board;
mod menu_board;
mod order_board;
mod poller;
mod settings_board;
mod vendor_board;

use tracing::error;

use crate::error::BoardError;
use crate::notify::Notifier;

pub use analytics_board::AnalyticsBoard;
pub use banner_board::BannerBoard;
pub use menu_board::MenuBoard;
pub use order_board::OrderBoard;
pub use poller::{OrderPoller, PollerHandle};
pub use settings_board::SettingsBoard;
pub use vendor_board::VendorBoard;

/// Logs a failed action and raises it as an error notification.
fn report(notifier: &Notifier, action: &str, e: impl Into<BoardError>) -> BoardError {
    let e = e.into();
    error!(action, error = %e, "Action failed");
    notifier.error(e.to_string());
    e
}
