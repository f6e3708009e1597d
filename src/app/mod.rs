use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::app::constants::STATUS_READY;
use crate::app::logging::prune_log_file;
use crate::daemon::{DaemonClient, TcpDaemonClient};
use crate::model::{
    ActiveSession, AppAction, HostEntry, Mode, NewHostState, Notice, PendingActivation, Screen,
    Settings,
};
use crate::prober::ReachabilityProber;
use crate::registry::{HostRegistry, StoredHostList};
use crate::storage::{config_path, load_or_init_store, log_path};

pub(crate) mod constants;
mod handlers;
mod hosts;
mod logging;

pub(crate) struct App {
    pub(crate) log_path: PathBuf,
    pub(crate) log_lines: VecDeque<String>,
    pub(crate) registry: Box<dyn HostRegistry>,
    pub(crate) client: Arc<dyn DaemonClient>,
    pub(crate) prober: ReachabilityProber,
    pub(crate) settings: Settings,
    pub(crate) hosts: Vec<HostEntry>,
    pub(crate) selected: usize,
    pub(crate) screen: Screen,
    pub(crate) mode: Mode,
    pub(crate) new_host: NewHostState,
    pub(crate) new_host_feedback: Option<String>,
    pub(crate) delete_id: Option<String>,
    pub(crate) notice: Option<Notice>,
    pub(crate) status: String,
    pub(crate) pending_action: Option<AppAction>,
    pub(crate) session: Option<ActiveSession>,
    pub(crate) activation: Option<PendingActivation>,
    pub(crate) last_refresh: Instant,
}

impl App {
    pub(crate) fn load_with_master() -> Result<Self> {
        let config_path = config_path()?;
        let store = load_or_init_store(&config_path)?;
        let log_path = log_path()?;
        prune_log_file(&log_path);
        let registry = StoredHostList::new(config_path, store);
        let settings = registry.settings();
        let client = Arc::new(TcpDaemonClient::new(Duration::from_secs(
            settings.probe_timeout_secs.max(1),
        )));
        let mut app = Self::new(Box::new(registry), client, settings, log_path);
        app.refresh_statuses();
        Ok(app)
    }

    pub(crate) fn new(
        registry: Box<dyn HostRegistry>,
        client: Arc<dyn DaemonClient>,
        settings: Settings,
        log_path: PathBuf,
    ) -> Self {
        let hosts = registry.list_hosts_display();
        let prober = ReachabilityProber::new(Arc::clone(&client));
        let mut app = Self {
            log_path,
            log_lines: VecDeque::new(),
            registry,
            client,
            prober,
            settings,
            hosts,
            selected: 0,
            screen: Screen::Hosts,
            mode: Mode::Normal,
            new_host: NewHostState::with_port(settings.default_port),
            new_host_feedback: None,
            delete_id: None,
            notice: None,
            status: STATUS_READY.to_string(),
            pending_action: None,
            session: None,
            activation: None,
            last_refresh: Instant::now(),
        };
        app.set_status(STATUS_READY);
        app
    }

    /// Called once per UI loop iteration: applies finished probes and starts
    /// the periodic refresh when the previous round has drained.
    pub(crate) fn tick(&mut self) {
        self.poll_activation();
        self.poll_probes();
        if self.screen != Screen::Hosts || self.prober.in_flight() > 0 {
            return;
        }
        let interval = Duration::from_secs(self.settings.refresh_interval_secs.max(1));
        if self.last_refresh.elapsed() >= interval {
            self.refresh_statuses();
        }
    }
}

#[cfg(test)]
impl App {
    pub(crate) fn for_test_with(
        client: Arc<crate::daemon::MockDaemonClient>,
        registry: crate::registry::HostList,
    ) -> Self {
        let log_path = crate::storage::temp_path("hostwatch-app-log", "log");
        Self::new(Box::new(registry), client, Settings::default(), log_path)
    }

    pub(crate) fn settle_probes(&mut self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.prober.in_flight() > 0 && Instant::now() < deadline {
            self.poll_probes();
            std::thread::sleep(Duration::from_millis(5));
        }
        self.poll_probes();
    }

    pub(crate) fn settle_activation(&mut self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.activation.is_some() && Instant::now() < deadline {
            self.poll_activation();
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}
