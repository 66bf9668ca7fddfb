use std::sync::Arc;

use shelfgate_store::{LocalStorage, MemoryStorage, StoreResult};
use shelfgate_util_error::FmtCompact as _;
use tracing::{debug, warn};

const LOG_TARGET: &str = "shelfgate::bypass";

pub const PAYMENT_SUCCESS_KEY: &str = "paymentSuccess";
const PAYMENT_SUCCESS_VALUE: &str = "true";

/// One-shot permission to skip the entitlement check, set right after a
/// successful payment
///
/// Lives in session-scoped storage, so it never survives a restart.
#[derive(Debug, Clone)]
pub struct BypassFlag {
    storage: Arc<dyn LocalStorage>,
}

impl BypassFlag {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn ephemeral() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn set(&self) -> StoreResult<()> {
        debug!(target: LOG_TARGET, "Payment success recorded");
        self.storage
            .set_item(PAYMENT_SUCCESS_KEY, PAYMENT_SUCCESS_VALUE)
    }

    /// Was the flag set? Clears it in any case.
    pub fn peek_and_consume(&self) -> bool {
        match self.storage.take_item(PAYMENT_SUCCESS_KEY) {
            Ok(value) => value.as_deref() == Some(PAYMENT_SUCCESS_VALUE),
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to consume bypass flag, treating as unset");
                false
            }
        }
    }
}
