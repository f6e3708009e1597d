//! Concurrent reachability probing of every configured daemon host.
//!
//! Each [`ReachabilityProber::refresh`] starts a new round: one thread per
//! host connects, asks the daemon for its info, disconnects, and sends the
//! outcome back over a channel. The prober is the only owner of the status
//! map and applies outcomes when the UI thread calls [`ReachabilityProber::poll`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc;

use crate::daemon::DaemonClient;
use crate::model::{HostRecord, ReachabilityStatus};
use crate::registry::HostRegistry;

struct ProbeUpdate {
    host_id: String,
    round: u64,
    status: ReachabilityStatus,
}

/// One applied probe outcome, handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProbeReport {
    pub(crate) host_id: String,
    pub(crate) endpoint: String,
    pub(crate) status: ReachabilityStatus,
    pub(crate) changed: bool,
}

pub(crate) struct ReachabilityProber {
    client: Arc<dyn DaemonClient>,
    statuses: HashMap<String, ReachabilityStatus>,
    applied_round: HashMap<String, u64>,
    endpoints: HashMap<String, String>,
    round: u64,
    in_flight: usize,
    tx: mpsc::Sender<ProbeUpdate>,
    rx: mpsc::Receiver<ProbeUpdate>,
}

impl ReachabilityProber {
    pub(crate) fn new(client: Arc<dyn DaemonClient>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            statuses: HashMap::new(),
            applied_round: HashMap::new(),
            endpoints: HashMap::new(),
            round: 0,
            in_flight: 0,
            tx,
            rx,
        }
    }

    /// Launches one probe per registered host and returns the new round
    /// number without waiting for any of them.
    pub(crate) fn refresh(&mut self, registry: &dyn HostRegistry) -> u64 {
        self.round += 1;
        let round = self.round;
        for host in registry.list_hosts() {
            self.endpoints
                .insert(host.host_id.clone(), host.endpoint());
            let client = Arc::clone(&self.client);
            let tx = self.tx.clone();
            self.in_flight += 1;
            std::thread::spawn(move || {
                let status = probe_one(client.as_ref(), &host);
                let _ = tx.send(ProbeUpdate {
                    host_id: host.host_id,
                    round,
                    status,
                });
            });
        }
        round
    }

    pub(crate) fn current_status(&self, host_id: &str) -> Option<&ReachabilityStatus> {
        self.statuses.get(host_id)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Applies every outcome that has arrived since the last call. Outcomes
    /// from a round older than one already applied for the same host are
    /// dropped and not reported.
    pub(crate) fn poll(&mut self) -> Vec<ProbeReport> {
        let mut reports = Vec::new();
        while let Ok(update) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if let Some(report) = self.apply(update) {
                reports.push(report);
            }
        }
        reports
    }

    pub(crate) fn forget(&mut self, host_id: &str) {
        self.statuses.remove(host_id);
        self.applied_round.remove(host_id);
        self.endpoints.remove(host_id);
    }

    fn apply(&mut self, update: ProbeUpdate) -> Option<ProbeReport> {
        // A forgotten host has no endpoint left; its late probes are ignored.
        let endpoint = self.endpoints.get(&update.host_id)?.clone();
        let newest = self.applied_round.get(&update.host_id).copied().unwrap_or(0);
        if update.round < newest {
            return None;
        }
        self.applied_round.insert(update.host_id.clone(), update.round);
        let previous = self.statuses.get(&update.host_id).cloned();
        match &update.status {
            ReachabilityStatus::Online(_) => {
                self.statuses
                    .insert(update.host_id.clone(), update.status.clone());
            }
            ReachabilityStatus::Offline => {
                self.statuses.remove(&update.host_id);
            }
        }
        let changed = previous.as_ref() != self.statuses.get(&update.host_id);
        Some(ProbeReport {
            host_id: update.host_id,
            endpoint,
            status: update.status,
            changed,
        })
    }
}

#[cfg(test)]
impl ReachabilityProber {
    pub(crate) fn round(&self) -> u64 {
        self.round
    }
}

/// Runs connect, info and disconnect for a single host. Every connection that
/// opens is disconnected exactly once, whatever the info request returns.
pub(crate) fn probe_one(client: &dyn DaemonClient, host: &HostRecord) -> ReachabilityStatus {
    let Ok(mut conn) = client.connect(host) else {
        return ReachabilityStatus::Offline;
    };
    let status = match conn.info() {
        Ok(info) => ReachabilityStatus::Online(info),
        Err(_) => ReachabilityStatus::Offline,
    };
    conn.disconnect();
    status
}
