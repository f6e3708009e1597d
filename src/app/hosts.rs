use std::sync::{Arc, mpsc};
use std::time::{Instant, SystemTime};

use crate::app::App;
use crate::app::constants::{
    ACTIVATION_BUSY_MESSAGE, ADD_HOST_ERROR, HOST_NOT_ONLINE_MESSAGE, NO_HOST_SELECTED_MESSAGE,
    NOTICE_CONNECT_FAILED_TITLE, NOTICE_DELETE_FAILED_TITLE, STATUS_REFRESHING,
};
use crate::daemon::ConnectError;
use crate::model::{
    ActiveSession, AppAction, HostEntry, Mode, NewHostState, Notice, PendingActivation,
    ReachabilityStatus, Screen,
};

impl App {
    pub(crate) fn selected_host(&self) -> Option<&HostEntry> {
        self.hosts.get(self.selected)
    }

    pub(crate) fn status_of(&self, host_id: &str) -> Option<&ReachabilityStatus> {
        self.prober.current_status(host_id)
    }

    pub(crate) fn select_next(&mut self) {
        if !self.hosts.is_empty() {
            self.selected = (self.selected + 1) % self.hosts.len();
        }
    }

    pub(crate) fn select_previous(&mut self) {
        if !self.hosts.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.hosts.len() - 1);
        }
    }

    /// Rebuilds the display list from the registry, keeping the cursor on
    /// `keep` (or on the previously selected host) when it still exists.
    pub(crate) fn reload_hosts(&mut self, keep: Option<String>) {
        let keep = keep.or_else(|| self.selected_host().map(|host| host.host_id.clone()));
        self.hosts = self.registry.list_hosts_display();
        if let Some(index) = keep
            .and_then(|id| self.hosts.iter().position(|host| host.host_id == id))
        {
            self.selected = index;
        } else if self.selected >= self.hosts.len() {
            self.selected = self.hosts.len().saturating_sub(1);
        }
    }

    pub(crate) fn refresh_statuses(&mut self) {
        self.prober.refresh(self.registry.as_ref());
        self.last_refresh = Instant::now();
    }

    pub(crate) fn manual_refresh(&mut self) {
        self.refresh_statuses();
        self.set_status(STATUS_REFRESHING);
    }

    pub(crate) fn poll_probes(&mut self) -> bool {
        let reports = self.prober.poll();
        for report in &reports {
            self.log_probe_report(report);
        }
        !reports.is_empty()
    }

    pub(crate) fn open_add_host(&mut self) {
        self.mode = Mode::AddHost;
        self.new_host = NewHostState::with_port(self.settings.default_port);
        self.new_host_feedback = None;
        self.set_status("Fill in the host details and press Enter to add");
    }

    pub(crate) fn submit_new_host(&mut self) {
        let result = self.registry.add_host(
            &self.new_host.hostname,
            &self.new_host.port,
            &self.new_host.username,
            &self.new_host.password,
        );
        match result {
            Ok(host_id) => {
                self.mode = Mode::Normal;
                self.new_host_feedback = None;
                self.reload_hosts(Some(host_id));
                let label = self
                    .selected_host()
                    .map(HostEntry::label)
                    .unwrap_or_default();
                self.set_status(format!("Added host {label}"));
                self.refresh_statuses();
            }
            Err(err) => {
                self.new_host_feedback = Some(format!("{ADD_HOST_ERROR}: {err}"));
            }
        }
    }

    pub(crate) fn request_delete_selected(&mut self) {
        match self.selected_host() {
            Some(host) => {
                self.delete_id = Some(host.host_id.clone());
                self.mode = Mode::ConfirmDelete;
            }
            None => self.set_status(NO_HOST_SELECTED_MESSAGE),
        }
    }

    pub(crate) fn confirm_delete(&mut self) {
        self.mode = Mode::Normal;
        let Some(host_id) = self.delete_id.take() else {
            return;
        };
        let label = self
            .hosts
            .iter()
            .find(|host| host.host_id == host_id)
            .map(HostEntry::label)
            .unwrap_or_else(|| host_id.clone());
        match self.registry.remove_host(&host_id) {
            Ok(_) => {
                self.prober.forget(&host_id);
                self.reload_hosts(None);
                self.set_status(format!("Deleted host {label}"));
            }
            Err(err) => {
                self.log_line(&format!("{NOTICE_DELETE_FAILED_TITLE}: {err}"));
                self.notice = Some(Notice {
                    title: NOTICE_DELETE_FAILED_TITLE.to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    pub(crate) fn activate_selected(&mut self) -> bool {
        match self.selected_host().map(|host| host.host_id.clone()) {
            Some(host_id) => self.activate(&host_id),
            None => {
                self.set_status(NO_HOST_SELECTED_MESSAGE);
                false
            }
        }
    }

    /// Starts connecting to a host that is currently known to be online. The
    /// attempt runs on its own thread; [`App::poll_activation`] picks up the
    /// result and asks the screen loop to switch to the session view.
    pub(crate) fn activate(&mut self, host_id: &str) -> bool {
        if self.activation.is_some() {
            self.set_status(ACTIVATION_BUSY_MESSAGE);
            return false;
        }
        if !self
            .status_of(host_id)
            .is_some_and(ReachabilityStatus::is_online)
        {
            self.set_status(HOST_NOT_ONLINE_MESSAGE);
            return false;
        }
        let Some(host) = self.registry.find_host(host_id) else {
            self.set_status(NO_HOST_SELECTED_MESSAGE);
            return false;
        };
        let (tx, rx) = mpsc::channel();
        let client = Arc::clone(&self.client);
        let record = host.clone();
        std::thread::spawn(move || {
            let result = client.connect(&record).map(|mut connection| {
                let info = connection.info().ok();
                (connection, info)
            });
            if let Err(mpsc::SendError(Ok((connection, _)))) = tx.send(result) {
                connection.disconnect();
            }
        });
        self.set_status(format!("Connecting to {}", host.endpoint()));
        self.activation = Some(PendingActivation {
            host: host.display(),
            endpoint: host.endpoint(),
            rx,
        });
        true
    }

    /// Returns true once the pending connection attempt has finished.
    pub(crate) fn poll_activation(&mut self) -> bool {
        let Some(pending) = &self.activation else {
            return false;
        };
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return false,
            Err(mpsc::TryRecvError::Disconnected) => Err(ConnectError::Protocol(
                "connection attempt aborted".to_string(),
            )),
        };
        let Some(pending) = self.activation.take() else {
            return false;
        };
        match result {
            Ok((connection, info)) => {
                self.disconnect_session();
                self.session = Some(ActiveSession {
                    host: pending.host,
                    info,
                    connection,
                    connected_at: SystemTime::now(),
                });
                self.pending_action = Some(AppAction::OpenSession);
                self.set_status(format!("Connected to {}", pending.endpoint));
            }
            Err(err) => {
                self.log_line(&format!("Connect to {} failed: {err}", pending.endpoint));
                self.notice = Some(Notice {
                    title: NOTICE_CONNECT_FAILED_TITLE.to_string(),
                    message: err.to_string(),
                });
            }
        }
        true
    }

    pub(crate) fn disconnect_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let label = session.host.label();
        session.connection.disconnect();
        self.set_status(format!("Disconnected from {label}"));
    }

    pub(crate) fn leave_session(&mut self) {
        self.disconnect_session();
        self.screen = Screen::Hosts;
        self.refresh_statuses();
    }
}
