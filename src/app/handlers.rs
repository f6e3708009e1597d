use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::app::constants::STATUS_CANCELLED;
use crate::model::{Field, Mode, Screen};

impl App {
    /// Returns `Ok(true)` when the user asked to quit.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.notice = None;
            }
            return Ok(false);
        }
        if self.screen == Screen::Session {
            return Ok(self.handle_session_key(key));
        }
        match self.mode {
            Mode::Normal => Ok(self.handle_normal_key(key)),
            Mode::AddHost => {
                self.handle_add_host_key(key);
                Ok(false)
            }
            Mode::ConfirmDelete => {
                self.handle_confirm_delete_key(key);
                Ok(false)
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('Q') => return true,
            KeyCode::Char('a') => self.open_add_host(),
            KeyCode::Char('D') | KeyCode::Delete => self.request_delete_selected(),
            KeyCode::Char('r') => self.manual_refresh(),
            KeyCode::Enter => {
                self.activate_selected();
            }
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.hosts.len().saturating_sub(1),
            _ => {}
        }
        false
    }

    fn handle_session_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('Q') => true,
            KeyCode::Char('d') | KeyCode::Esc => {
                self.leave_session();
                false
            }
            _ => false,
        }
    }

    fn handle_add_host_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.new_host_feedback = None;
                self.set_status(STATUS_CANCELLED);
            }
            KeyCode::Tab | KeyCode::Down => self.advance_field(true),
            KeyCode::BackTab | KeyCode::Up => self.advance_field(false),
            KeyCode::Enter => self.submit_new_host(),
            KeyCode::Backspace => {
                self.active_field_value().pop();
            }
            KeyCode::Char(ch) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.active_field_value().push(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_confirm_delete_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => self.confirm_delete(),
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.mode = Mode::Normal;
                self.delete_id = None;
                self.set_status(STATUS_CANCELLED);
            }
            _ => {}
        }
    }

    fn advance_field(&mut self, forward: bool) {
        let fields = Field::ALL;
        let pos = fields
            .iter()
            .position(|field| *field == self.new_host.active_field)
            .unwrap_or(0);
        let next = if forward {
            (pos + 1) % fields.len()
        } else if pos == 0 {
            fields.len() - 1
        } else {
            pos - 1
        };
        self.new_host.active_field = fields[next];
    }

    fn active_field_value(&mut self) -> &mut String {
        match self.new_host.active_field {
            Field::Hostname => &mut self.new_host.hostname,
            Field::Port => &mut self.new_host.port,
            Field::Username => &mut self.new_host.username,
            Field::Password => &mut self.new_host.password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::{MockBehavior, MockDaemonClient};
    use crate::model::AppAction;
    use crate::registry::{HostList, HostRegistry};
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch))).unwrap();
        }
    }

    #[test]
    fn add_host_form_walks_fields_and_submits() {
        let client = Arc::new(MockDaemonClient::default());
        let mut app = App::for_test_with(client, HostList::default());
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.mode, Mode::AddHost);

        type_text(&mut app, "10.0.0.5");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.new_host.active_field, Field::Port);
        for _ in 0..5 {
            app.handle_key(key(KeyCode::Backspace)).unwrap();
        }
        type_text(&mut app, "1234");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "alice");
        app.handle_key(key(KeyCode::BackTab)).unwrap();
        assert_eq!(app.new_host.active_field, Field::Port);
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.mode, Mode::Normal);
        let hosts = app.registry.list_hosts();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].address, "10.0.0.5");
        assert_eq!(hosts[0].port, 1234);
        assert_eq!(hosts[0].username, "alice");
        app.settle_probes();
    }

    #[test]
    fn escape_cancels_add_host() {
        let client = Arc::new(MockDaemonClient::default());
        let mut app = App::for_test_with(client, HostList::default());
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "host");
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.status, STATUS_CANCELLED);
        assert!(app.registry.list_hosts().is_empty());
    }

    #[test]
    fn delete_requires_confirmation() {
        let client = Arc::new(MockDaemonClient::default());
        let mut list = HostList::default();
        list.add_host("10.0.0.1", "58846", "u", "p").unwrap();
        let mut app = App::for_test_with(client, list);

        app.handle_key(key(KeyCode::Char('D'))).unwrap();
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.hosts.len(), 1);

        app.handle_key(key(KeyCode::Char('D'))).unwrap();
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert!(app.hosts.is_empty());
    }

    #[test]
    fn enter_on_online_host_then_quit_from_session() {
        let client = Arc::new(MockDaemonClient::default());
        client.set_behavior("10.0.0.1", MockBehavior::Online("2.0".to_string()));
        let mut list = HostList::default();
        list.add_host("10.0.0.1", "58846", "u", "p").unwrap();
        let mut app = App::for_test_with(client, list);
        app.refresh_statuses();
        app.settle_probes();

        app.handle_key(key(KeyCode::Enter)).unwrap();
        app.settle_activation();
        assert!(matches!(app.pending_action.take(), Some(AppAction::OpenSession)));
        app.screen = Screen::Session;
        assert!(!app.handle_key(key(KeyCode::Char('x'))).unwrap());
        assert!(app.handle_key(key(KeyCode::Char('Q'))).unwrap());
    }

    #[test]
    fn notice_swallows_keys_until_closed() {
        let client = Arc::new(MockDaemonClient::default());
        let mut app = App::for_test_with(client, HostList::default());
        app.notice = Some(crate::model::Notice {
            title: "t".to_string(),
            message: "m".to_string(),
        });
        assert!(!app.handle_key(key(KeyCode::Char('Q'))).unwrap());
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.notice.is_none());
        assert!(app.handle_key(key(KeyCode::Char('Q'))).unwrap());
    }

    #[test]
    fn lowercase_q_does_not_quit() {
        let client = Arc::new(MockDaemonClient::default());
        let mut app = App::for_test_with(client, HostList::default());
        assert!(!app.handle_key(key(KeyCode::Char('q'))).unwrap());
        app.screen = Screen::Session;
        assert!(!app.handle_key(key(KeyCode::Char('q'))).unwrap());
        assert!(app.handle_key(key(KeyCode::Char('Q'))).unwrap());
    }
}
