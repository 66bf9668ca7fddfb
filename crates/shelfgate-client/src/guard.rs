//! Per-navigation access decision

use std::sync::atomic::{AtomicU64, Ordering};

use shelfgate_core::route::{RouteMatch, RouteRequirement};
use shelfgate_core::{DEFAULT_TITLE, Verdict};
use shelfgate_store::SessionStore;
use shelfgate_util_error::FmtCompact as _;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::bypass::BypassFlag;
use crate::resolver::EntitlementResolver;

const LOG_TARGET: &str = "shelfgate::guard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    Evaluating { seq: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Decided(Verdict),
    /// A newer navigation started before this one was decided; its verdict
    /// must not be applied
    Superseded,
}

impl GuardOutcome {
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            GuardOutcome::Decided(verdict) => Some(verdict),
            GuardOutcome::Superseded => None,
        }
    }
}

pub struct NavigationGuard {
    store: SessionStore,
    bypass: BypassFlag,
    resolver: EntitlementResolver,

    /// Sequence number of the most recently started navigation
    latest_seq: AtomicU64,

    state_tx: watch::Sender<GuardState>,
    title_tx: watch::Sender<String>,
}

impl NavigationGuard {
    pub fn new(store: SessionStore, bypass: BypassFlag, resolver: EntitlementResolver) -> Self {
        Self {
            store,
            bypass,
            resolver,
            latest_seq: AtomicU64::new(0),
            state_tx: watch::Sender::new(GuardState::Idle),
            title_tx: watch::Sender::new(DEFAULT_TITLE.to_owned()),
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<GuardState> {
        self.state_tx.subscribe()
    }

    pub fn subscribe_title(&self) -> watch::Receiver<String> {
        self.title_tx.subscribe()
    }

    pub fn title(&self) -> String {
        self.title_tx.borrow().clone()
    }

    /// Decide whether navigating to `target` may proceed
    ///
    /// Only the most recently started navigation gets a verdict. Older ones
    /// still run to completion (so the cached entitlement gets updated), but
    /// yield [`GuardOutcome::Superseded`].
    #[instrument(target = "shelfgate::guard", skip_all, fields(path = %target.path, seq = tracing::field::Empty))]
    pub async fn navigate(&self, target: &RouteMatch) -> GuardOutcome {
        let title = target
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_owned());

        // `latest_seq` only changes inside the `state_tx` lock, so the
        // published state and title always belong to the latest navigation
        let mut seq = 0;
        self.state_tx.send_modify(|state| {
            seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
            *state = GuardState::Evaluating { seq };
            self.title_tx.send_replace(title);
        });
        tracing::Span::current().record("seq", seq);

        let verdict = self.evaluate(target).await;

        let is_latest = self.state_tx.send_if_modified(|state| {
            if self.latest_seq.load(Ordering::SeqCst) != seq {
                return false;
            }
            *state = GuardState::Idle;
            true
        });
        if !is_latest {
            debug!(target: LOG_TARGET, ?verdict, "Navigation superseded, discarding verdict");
            return GuardOutcome::Superseded;
        }

        info!(target: LOG_TARGET, ?verdict, "Navigation decided");
        GuardOutcome::Decided(verdict)
    }

    async fn evaluate(&self, target: &RouteMatch) -> Verdict {
        let session = self.store.get();
        let RouteRequirement {
            requires_auth,
            requires_premium,
        } = target.requirement;

        if requires_auth && !session.is_logged_in {
            debug!(target: LOG_TARGET, "Login required");
            return Verdict::RedirectLogin;
        }

        if !requires_premium {
            return Verdict::Allow;
        }

        if session.is_logged_in && self.bypass.peek_and_consume() {
            info!(target: LOG_TARGET, "Payment just succeeded, skipping entitlement check once");
            return Verdict::Allow;
        }

        let Some(member_id) = session.member_id() else {
            warn!(
                target: LOG_TARGET,
                id = ?session.id,
                "Session has no valid member id, clearing it"
            );
            if let Err(err) = self.store.clear() {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to clear invalid session");
            }
            return Verdict::RedirectLogin;
        };

        if self.resolver.resolve_member(member_id).await {
            Verdict::Allow
        } else {
            Verdict::RedirectSubscription
        }
    }
}
