//! Integration event listeners.

use crate::types::InvocationKind;

/// Notified around every skill run started from chat.  Both methods
/// default to no-ops.
pub trait IntegrationListener: Send + Sync {
    fn will_execute(&self, _skill_id: &str, _via: InvocationKind) {}

    fn did_execute(&self, _skill_id: &str, _success: bool) {}
}
