use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::App;
use crate::model::Field;
use crate::ui::constants::{LABEL_WIDTH, MODAL_MIN_WIDTH, MODAL_WIDTH_PERCENT};
use crate::ui::helpers::{
    centered_rect_abs, centered_rect_by_height, draw_popup_frame, field_line, key_hint,
    modal_height,
};

pub(crate) fn draw_add_host_modal(frame: &mut Frame<'_>, app: &App) {
    let area_width = (frame.area().width.saturating_mul(MODAL_WIDTH_PERCENT) / 100)
        .min(frame.area().width.saturating_sub(2))
        .max(MODAL_MIN_WIDTH);
    let pad = 1u16;
    let content_width = area_width.saturating_sub(2 + pad * 2);
    let value_width = content_width.saturating_sub(2 + LABEL_WIDTH as u16 + 2) as usize;

    let form = &app.new_host;
    let fields = [
        ("Hostname", form.hostname.as_str(), Field::Hostname, false),
        ("Port", form.port.as_str(), Field::Port, false),
        ("Username", form.username.as_str(), Field::Username, false),
        ("Password", form.password.as_str(), Field::Password, true),
    ];
    let lines: Vec<Line> = fields
        .iter()
        .map(|(label, value, field, mask)| {
            field_line(
                label,
                value,
                form.active_field == *field,
                *mask,
                LABEL_WIDTH,
                value_width,
            )
        })
        .collect();

    let mut footer_lines = vec![Line::from(
        [
            key_hint("Tab", "next field, "),
            key_hint("Enter", "add, "),
            key_hint("Esc", "cancel"),
        ]
        .concat(),
    )];
    if let Some(feedback) = &app.new_host_feedback {
        footer_lines.push(Line::from(Span::styled(
            feedback.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let height = modal_height(lines.len(), footer_lines.len() + 1);
    let area = centered_rect_abs(area_width, height, frame.area());
    let inner = draw_popup_frame(frame, area, "Add Host", Style::default().fg(Color::Cyan));
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(footer_lines.len() as u16 + 1),
            ]
            .as_ref(),
        )
        .split(inner);
    let form_area = layout[0];
    frame.render_widget(Paragraph::new(lines), form_area);
    frame.render_widget(
        Paragraph::new(footer_lines)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::TOP)),
        layout[1],
    );
    render_form_cursor(frame, app, form_area);
}

fn render_form_cursor(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let form = &app.new_host;
    let Some(row) = Field::ALL
        .iter()
        .position(|field| *field == form.active_field)
    else {
        return;
    };
    if row >= area.height as usize {
        return;
    }
    let col = match form.active_field {
        Field::Hostname => form.hostname.chars().count(),
        Field::Port => form.port.chars().count(),
        Field::Username => form.username.chars().count(),
        Field::Password => form.password.chars().count(),
    };
    let cursor_x = area.x + 2 + LABEL_WIDTH as u16 + 2 + col as u16;
    if cursor_x < area.x + area.width {
        frame.set_cursor_position((cursor_x, area.y + row as u16));
    }
}

pub(crate) fn draw_confirm_delete_modal(frame: &mut Frame<'_>, app: &App) {
    let height = modal_height(1, 2);
    let area = centered_rect_by_height(50, height, frame.area());
    let inner = draw_popup_frame(frame, area, "Delete host?", Style::default().fg(Color::Yellow));

    let label = app
        .delete_id
        .as_deref()
        .and_then(|id| app.hosts.iter().find(|host| host.host_id == id))
        .map(|host| host.label())
        .unwrap_or_else(|| "Unknown".to_string());

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)].as_ref())
        .split(inner);
    frame.render_widget(
        Paragraph::new(format!("Delete {label}?")).wrap(Wrap { trim: true }),
        layout[0],
    );
    let footer = Paragraph::new(Line::from(
        [key_hint("Y", "to confirm, "), key_hint("N", "to cancel")].concat(),
    ))
    .style(Style::default().fg(Color::Gray))
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, layout[1]);
}

pub(crate) fn draw_notice_modal(frame: &mut Frame<'_>, app: &App) {
    let Some(notice) = &app.notice else {
        return;
    };
    let message_lines = notice.message.lines().count().max(1);
    let height = modal_height(message_lines + 2, 1);
    let area = centered_rect_by_height(50, height, frame.area());
    let inner = draw_popup_frame(frame, area, &notice.title, Style::default().fg(Color::Red));

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)].as_ref())
        .split(inner);
    frame.render_widget(
        Paragraph::new(notice.message.as_str()).wrap(Wrap { trim: true }),
        layout[0],
    );
    let footer = Paragraph::new(Line::from(
        [vec![Span::raw("Press ")], key_hint("Enter", "to close.")].concat(),
    ))
    .style(Style::default().fg(Color::Gray))
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::MockDaemonClient;
    use crate::model::{Mode, Notice};
    use crate::registry::HostList;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn render(app: &App, draw: fn(&mut Frame<'_>, &App)) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn add_host_modal_masks_password_and_shows_feedback() {
        let client = Arc::new(MockDaemonClient::default());
        let mut app = App::for_test_with(client, HostList::default());
        app.mode = Mode::AddHost;
        app.new_host.hostname = "seedbox".to_string();
        app.new_host.password = "hunter2".to_string();
        app.new_host_feedback = Some("Invalid port. Must be an integer".to_string());

        let content = render(&app, draw_add_host_modal);
        assert!(content.contains("Add Host"));
        assert!(content.contains("seedbox"));
        assert!(content.contains("*******"));
        assert!(!content.contains("hunter2"));
        assert!(content.contains("Invalid port"));
    }

    #[test]
    fn notice_modal_shows_title_and_message() {
        let client = Arc::new(MockDaemonClient::default());
        let mut app = App::for_test_with(client, HostList::default());
        app.notice = Some(Notice {
            title: "Failed to connect!".to_string(),
            message: "login rejected".to_string(),
        });
        let content = render(&app, draw_notice_modal);
        assert!(content.contains("Failed to connect!"));
        assert!(content.contains("login rejected"));
    }
}
