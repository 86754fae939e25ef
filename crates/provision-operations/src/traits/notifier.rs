use std::future::Future;

use crate::Result;
use crate::types::{Notification, Released};

/// Outbound messaging. Published notifications cannot be recalled.
pub trait Notifier {
    /// # Errors
    ///
    /// Returns an error if the message is rejected.
    fn publish(&self, notification: &Notification) -> impl Future<Output = Result<Released>>;
}
