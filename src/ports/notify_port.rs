//! Outbound notification port.

use crate::domain::error::NotifyError;

/// Pushes a finished report to an external channel.
///
/// Delivery failures are reported to the caller, which logs them; they never
/// change the computed score or the process exit status.
pub trait Notifier {
    fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError>;
}
