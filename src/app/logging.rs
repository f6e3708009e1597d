use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Datelike;

use crate::app::App;
use crate::app::constants::{
    LOG_MAX_ENTRIES, LOG_MAX_IN_MEMORY, LOG_PARSE_FORMAT, LOG_RETENTION_DAYS, LOG_SEPARATOR,
    LOG_TIMESTAMP_FORMAT,
};
use crate::model::ReachabilityStatus;
use crate::prober::ProbeReport;

impl App {
    pub(crate) fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.status = message.clone();
        self.log_line(&message);
    }

    pub(super) fn log_line(&mut self, message: &str) {
        let timestamp = chrono::Local::now().format(LOG_TIMESTAMP_FORMAT);
        let line = format!("{timestamp}{LOG_SEPARATOR}{message}");
        if let Some(parent) = self.log_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(mut file) = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
        {
            let _ = writeln!(file, "{line}");
        }
        self.log_lines.push_back(line);
        while self.log_lines.len() > LOG_MAX_IN_MEMORY {
            self.log_lines.pop_front();
        }
    }

    /// Logs reachability transitions only; repeated identical outcomes from
    /// the periodic refresh stay out of the log.
    pub(super) fn log_probe_report(&mut self, report: &ProbeReport) {
        if report.changed {
            self.log_line(&probe_report_message(report));
        }
    }
}

pub(crate) fn probe_report_message(report: &ProbeReport) -> String {
    match &report.status {
        ReachabilityStatus::Online(info) => {
            format!("{} is online (daemon {})", report.endpoint, info.version)
        }
        ReachabilityStatus::Offline => format!("{} is offline", report.endpoint),
    }
}

pub(crate) fn prune_log_file(path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let now = chrono::Local::now();
    let cutoff = now.naive_local() - chrono::Duration::days(LOG_RETENTION_DAYS);
    let current_year = now.year();
    let mut kept: Vec<&str> = content
        .lines()
        .filter(|line| {
            let Some((timestamp, _)) = line.split_once(LOG_SEPARATOR) else {
                return false;
            };
            chrono::NaiveDateTime::parse_from_str(
                &format!("{current_year}-{timestamp}"),
                LOG_PARSE_FORMAT,
            )
            .is_ok_and(|parsed| parsed >= cutoff)
        })
        .collect();
    if kept.len() > LOG_MAX_ENTRIES {
        kept = kept.split_off(kept.len() - LOG_MAX_ENTRIES);
    }
    if kept.is_empty() {
        let _ = fs::remove_file(path);
    } else {
        let _ = fs::write(path, kept.join("\n") + "\n");
    }
}
