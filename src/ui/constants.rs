use ratatui::layout::Constraint;

pub(crate) const HELP_TEXT: &str = "(a)dd | (D)elete | (r)efresh | Enter connect | (Q)uit";
pub(crate) const SESSION_HELP_TEXT: &str = "(d)isconnect | (Q)uit";

pub(crate) const LABEL_WIDTH: usize = 9;

pub(crate) const FOOTER_HEIGHT: u16 = 2;
pub(crate) const DETAILS_HEIGHT: u16 = 8;

pub(crate) const BODY_COLUMN_PERCENTAGES: [u16; 2] = [45, 55];

pub(crate) const MODAL_WIDTH_PERCENT: u16 = 60;
pub(crate) const MODAL_MIN_WIDTH: u16 = 30;

pub(crate) const POPUP_MIN_WIDTH: u16 = 10;
pub(crate) const POPUP_MIN_HEIGHT: u16 = 5;

pub(crate) fn body_columns() -> [Constraint; 2] {
    BODY_COLUMN_PERCENTAGES.map(Constraint::Percentage)
}
