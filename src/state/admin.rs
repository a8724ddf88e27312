//! Admin console: dashboard snapshot, pending action requests, agent triggers.
//!
//! The passphrase gate is a presentation convenience only. The backend
//! routes it fronts are reachable by anyone who can call the transport
//! layer, so nothing here is an authorization boundary.
//!
//! Requests are addressed by their position in the last fetched list. That
//! position is only meaningful until the next fetch, so every mutation is
//! followed by a full refresh, and [`AdminConsole::decide_by_id`] re-resolves
//! a durable id to a fresh position before mutating.

#[cfg(test)]
#[path = "admin_test.rs"]
mod admin_test;

use std::sync::Arc;

use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use super::{BusyGuard, Notifier};
use crate::net::types::{AdminRequest, DashboardStats, RequestStatus, StatusAck, TriggerAck};
use crate::net::{ApiError, Backend};

/// Agents the console offers to force-start.
pub const KNOWN_AGENTS: [&str; 4] = ["AUDITOR", "COURTROOM", "MEDICAL", "GENESIS"];

pub const ACCESS_DENIED_ALERT: &str = "Access Denied";

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("access denied")]
    AccessDenied,
    #[error("console is locked")]
    Locked,
    #[error("another admin action is in progress")]
    Busy,
    #[error("no request at position {index} (snapshot holds {len})")]
    UnknownIndex { index: usize, len: usize },
    #[error("no request with id `{0}`")]
    UnknownRequest(String),
    #[error("backend refused the update: {0}")]
    Refused(String),
    #[error("admin call failed: {0}")]
    Transport(#[from] ApiError),
}

/// State for the admin dashboard.
pub struct AdminConsole {
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    passphrase: String,
    locked: bool,
    stats: Option<DashboardStats>,
    requests: Vec<AdminRequest>,
    busy: bool,
}

impl AdminConsole {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, notifier: Arc<dyn Notifier>, passphrase: impl Into<String>) -> Self {
        Self {
            backend,
            notifier,
            passphrase: passphrase.into(),
            locked: true,
            stats: None,
            requests: Vec::new(),
            busy: false,
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn stats(&self) -> Option<&DashboardStats> {
        self.stats.as_ref()
    }

    #[must_use]
    pub fn requests(&self) -> &[AdminRequest] {
        &self.requests
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .count()
    }

    /// Open the gate if `passphrase` matches.
    ///
    /// # Errors
    ///
    /// [`AdminError::AccessDenied`] on mismatch, after raising an alert.
    pub fn unlock(&mut self, passphrase: &str) -> Result<(), AdminError> {
        if passphrase != self.passphrase {
            self.notifier.alert(ACCESS_DENIED_ALERT);
            return Err(AdminError::AccessDenied);
        }
        self.locked = false;
        info!("admin console unlocked");
        Ok(())
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Replace the snapshots with freshly fetched ones.
    ///
    /// Stats and requests are fetched concurrently and applied
    /// independently: a snapshot whose fetch fails keeps its prior value,
    /// and the other one is still replaced.
    ///
    /// # Errors
    ///
    /// [`AdminError::Locked`], [`AdminError::Busy`], or the first transport
    /// failure.
    pub async fn refresh(&mut self) -> Result<(), AdminError> {
        self.ready()?;
        let fetched = {
            let _busy = BusyGuard::hold(&mut self.busy);
            fetch_snapshots(self.backend.as_ref()).await
        };
        self.apply_snapshots(fetched)
    }

    fn apply_snapshots(&mut self, (stats, requests): Snapshots) -> Result<(), AdminError> {
        let mut first_error = None;
        match stats {
            Ok(stats) => self.stats = Some(stats),
            Err(error) => {
                warn!(%error, "dashboard stats refresh failed");
                first_error = Some(error);
            }
        }
        match requests {
            Ok(requests) => self.requests = requests,
            Err(error) => {
                warn!(%error, "admin requests refresh failed");
                first_error = first_error.or(Some(error));
            }
        }
        first_error.map_or(Ok(()), |error| Err(error.into()))
    }

    /// Set the status of the request at `index`, then refresh.
    ///
    /// The refresh runs whether or not the mutation succeeded. A failed or
    /// refused mutation raises an alert and its error is returned in
    /// preference to any refresh error.
    ///
    /// # Errors
    ///
    /// [`AdminError::UnknownIndex`] when `index` is outside the current
    /// snapshot (no call is made), [`AdminError::Refused`] when the backend
    /// acknowledges with an `error`, or the transport failure.
    pub async fn decide(&mut self, index: usize, status: RequestStatus) -> Result<(), AdminError> {
        self.ready()?;
        if index >= self.requests.len() {
            return Err(AdminError::UnknownIndex { index, len: self.requests.len() });
        }

        let (mutation, fetched) = {
            let _busy = BusyGuard::hold(&mut self.busy);
            let mutation = self.backend.set_request_status(index, status).await;
            (mutation, fetch_snapshots(self.backend.as_ref()).await)
        };
        let refresh = self.apply_snapshots(fetched);

        let error = match mutation {
            Ok(StatusAck { error: None, .. }) => {
                info!(index, %status, "request status updated");
                return refresh;
            }
            Ok(StatusAck { error: Some(reason), .. }) => {
                warn!(index, %reason, "status update refused");
                AdminError::Refused(reason)
            }
            Err(error) => {
                warn!(index, %error, "status update failed");
                error.into()
            }
        };
        self.notifier.alert(&format!("Failed to update request {index}: {error}"));
        Err(error)
    }

    /// Set the status of the request carrying `id`.
    ///
    /// Refreshes first so the id resolves against the backend's current
    /// ordering, then delegates to [`AdminConsole::decide`].
    ///
    /// # Errors
    ///
    /// [`AdminError::UnknownRequest`] when no fetched request has `id`.
    pub async fn decide_by_id(&mut self, id: &str, status: RequestStatus) -> Result<(), AdminError> {
        self.refresh().await?;
        let index = self
            .requests
            .iter()
            .position(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| AdminError::UnknownRequest(id.to_owned()))?;
        self.decide(index, status).await
    }

    /// Force-start `agent_name` with a manual-trigger payload.
    ///
    /// Progress is reported through alerts only; the acknowledgement is
    /// returned but not kept in any snapshot.
    ///
    /// # Errors
    ///
    /// [`AdminError::Locked`], [`AdminError::Busy`], or the transport failure.
    pub async fn force_trigger(&mut self, agent_name: &str) -> Result<TriggerAck, AdminError> {
        self.ready()?;
        let payload = json!({ "manual_trigger": true, "timestamp": now_rfc3339() });

        self.notifier.alert(&format!("Triggering {agent_name}..."));
        let result = {
            let _busy = BusyGuard::hold(&mut self.busy);
            self.backend.trigger_agent(agent_name, payload).await
        };

        match result {
            Ok(ack) => {
                self.notifier.alert(&format!("{agent_name} Triggered!"));
                Ok(ack)
            }
            Err(error) => {
                warn!(agent = agent_name, %error, "agent trigger failed");
                self.notifier.alert(&format!("Failed to trigger {agent_name}: {error}"));
                Err(error.into())
            }
        }
    }

    fn ready(&self) -> Result<(), AdminError> {
        if self.locked {
            return Err(AdminError::Locked);
        }
        if self.busy {
            return Err(AdminError::Busy);
        }
        Ok(())
    }
}

type Snapshots = (Result<DashboardStats, ApiError>, Result<Vec<AdminRequest>, ApiError>);

async fn fetch_snapshots(backend: &dyn Backend) -> Snapshots {
    tokio::join!(backend.fetch_dashboard_stats(), backend.fetch_admin_requests())
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
