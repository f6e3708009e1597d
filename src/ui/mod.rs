use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::app::App;
use crate::model::{Mode, Screen};
use crate::ui::constants::{DETAILS_HEIGHT, FOOTER_HEIGHT, body_columns};
use crate::ui::modals::{draw_add_host_modal, draw_confirm_delete_modal, draw_notice_modal};
use crate::ui::panels::{
    draw_host_details, draw_host_list, draw_hosts_footer, draw_logs, draw_session,
};

pub(crate) mod constants;
mod helpers;
mod modals;
mod panels;

pub(crate) fn draw_ui(frame: &mut Frame<'_>, app: &App) {
    match app.screen {
        Screen::Hosts => draw_hosts_screen(frame, app, frame.area()),
        Screen::Session => draw_session(frame, app, frame.area()),
    }

    if app.screen == Screen::Hosts {
        match app.mode {
            Mode::AddHost => draw_add_host_modal(frame, app),
            Mode::ConfirmDelete => draw_confirm_delete_modal(frame, app),
            Mode::Normal => {}
        }
    }
    if app.notice.is_some() {
        draw_notice_modal(frame, app);
    }
}

fn draw_hosts_screen(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(FOOTER_HEIGHT)].as_ref())
        .split(area);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(body_columns().as_ref())
        .split(rows[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(DETAILS_HEIGHT), Constraint::Min(1)].as_ref())
        .split(body[1]);

    draw_host_list(frame, app, body[0]);
    draw_host_details(frame, app, right[0]);
    draw_logs(frame, app, right[1]);
    draw_hosts_footer(frame, app, rows[1]);
}
