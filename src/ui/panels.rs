use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use crate::app::App;
use crate::model::ReachabilityStatus;
use crate::ui::constants::{HELP_TEXT, LABEL_WIDTH, SESSION_HELP_TEXT};
use crate::ui::helpers::{list_state, status_badge, truncate_text};

pub(crate) fn draw_host_list(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let header_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let block = Block::default()
        .title(Line::from(Span::styled("Select Host", header_style)))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let items: Vec<ListItem> = if app.hosts.is_empty() {
        vec![ListItem::new("No hosts configured")]
    } else {
        app.hosts
            .iter()
            .map(|host| {
                let (label, color) = status_badge(app.status_of(&host.host_id));
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{} ", host.label())),
                    Span::styled(format!("[{label}]"), Style::default().fg(color)),
                ]))
            })
            .collect()
    };
    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(Span::styled(
            "> ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));
    let mut state = list_state(app.selected, app.hosts.len());
    frame.render_stateful_widget(list, inner, &mut state);
}

pub(crate) fn draw_host_details(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .title(Line::from(Span::styled(
            "Details",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(host) = app.selected_host() else {
        frame.render_widget(Paragraph::new("Nothing selected"), inner);
        return;
    };
    let value_width = (inner.width as usize).saturating_sub(LABEL_WIDTH + 2);
    let status = app.status_of(&host.host_id);
    let (label, color) = status_badge(status);
    let version = status
        .and_then(ReachabilityStatus::info)
        .map(|info| info.version.clone())
        .unwrap_or_else(|| "-".to_string());
    let user = if host.username.is_empty() {
        "-".to_string()
    } else {
        host.username.clone()
    };
    let lines = vec![
        detail_line("Host", &host.address, value_width),
        detail_line("Port", &host.port.to_string(), value_width),
        detail_line("User", &user, value_width),
        Line::from(vec![
            detail_label("Status"),
            Span::styled(label, Style::default().fg(color)),
        ]),
        detail_line("Version", &version, value_width),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

pub(crate) fn draw_logs(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .title(Line::from(Span::styled(
            "Log",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let visible = inner.height as usize;
    let skip = app.log_lines.len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .log_lines
        .iter()
        .skip(skip)
        .map(|line| Line::from(truncate_text(line, inner.width as usize)))
        .collect();
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().fg(Color::Gray)),
        inner,
    );
}

pub(crate) fn draw_footer(frame: &mut Frame<'_>, app: &App, area: Rect, help: &str) {
    let in_flight = app.prober.in_flight();
    let status = if in_flight > 0 {
        format!("{} ({in_flight} probing)", app.status)
    } else {
        app.status.clone()
    };
    let footer = Paragraph::new(vec![
        Line::from(Span::styled(help.to_string(), Style::default().fg(Color::Gray))),
        Line::from(Span::styled(status, Style::default().fg(Color::White))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    frame.render_widget(footer, area);
}

pub(crate) fn draw_hosts_footer(frame: &mut Frame<'_>, app: &App, area: Rect) {
    draw_footer(frame, app, area, HELP_TEXT);
}

pub(crate) fn draw_session(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)].as_ref())
        .split(area);
    let block = Block::default()
        .title(Line::from(Span::styled(
            "Connected",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )))
        .borders(Borders::ALL);
    let inner = block.inner(layout[0]);
    frame.render_widget(block, layout[0]);

    let value_width = (inner.width as usize).saturating_sub(LABEL_WIDTH + 2);
    let lines = match &app.session {
        Some(session) => {
            let connected_at: chrono::DateTime<chrono::Local> = session.connected_at.into();
            let version = session
                .info
                .as_ref()
                .map(|info| info.version.clone())
                .unwrap_or_else(|| "unknown".to_string());
            vec![
                detail_line("Host", &session.host.label(), value_width),
                detail_line("User", &session.host.username, value_width),
                detail_line("Version", &version, value_width),
                detail_line(
                    "Since",
                    &connected_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    value_width,
                ),
            ]
        }
        None => vec![Line::from("No active session")],
    };
    frame.render_widget(Paragraph::new(lines), inner);
    draw_footer(frame, app, layout[1], SESSION_HELP_TEXT);
}

fn detail_label(label: &str) -> Span<'static> {
    Span::styled(
        format!("{label:<LABEL_WIDTH$}: "),
        Style::default().add_modifier(Modifier::BOLD),
    )
}

fn detail_line(label: &str, value: &str, max_width: usize) -> Line<'static> {
    Line::from(vec![
        detail_label(label),
        Span::raw(truncate_text(value, max_width)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::{MockBehavior, MockDaemonClient};
    use crate::registry::{HostList, HostRegistry};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn render(app: &App, width: u16, height: u16, draw: fn(&mut Frame<'_>, &App, Rect)) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw(frame, app, frame.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn host_list_shows_online_and_offline_badges() {
        let client = Arc::new(MockDaemonClient::default());
        client.set_behavior("10.0.0.1", MockBehavior::Online("2.0.4".to_string()));
        let mut list = HostList::default();
        list.add_host("10.0.0.1", "58846", "", "").unwrap();
        list.add_host("10.0.0.2", "58846", "", "").unwrap();
        let mut app = App::for_test_with(client, list);
        app.refresh_statuses();
        app.settle_probes();

        let content = render(&app, 60, 6, draw_host_list);
        assert!(content.contains("Select Host"));
        assert!(content.contains("10.0.0.1:58846 [Online]"));
        assert!(content.contains("10.0.0.2:58846 [Offline]"));
    }

    #[test]
    fn details_show_daemon_version_for_online_host() {
        let client = Arc::new(MockDaemonClient::default());
        client.set_behavior("10.0.0.1", MockBehavior::Online("2.0.4".to_string()));
        let mut list = HostList::default();
        list.add_host("10.0.0.1", "58846", "alice", "pw").unwrap();
        let mut app = App::for_test_with(client, list);
        app.refresh_statuses();
        app.settle_probes();

        let content = render(&app, 50, 8, draw_host_details);
        assert!(content.contains("alice"));
        assert!(content.contains("2.0.4"));
        assert!(!content.contains("pw"));
    }

    #[test]
    fn hosts_footer_renders_help() {
        let client = Arc::new(MockDaemonClient::default());
        let app = App::for_test_with(client, HostList::default());
        let content = render(&app, 80, 2, draw_hosts_footer);
        assert!(content.contains("(a)dd"));
        assert!(content.contains("(r)efresh"));
    }
}
