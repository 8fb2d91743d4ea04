use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{
    BaseStyle, Modal, ModalBehavior, ModalProps, ModalStyle, Padding, TextInput, TextInputProps,
    TextInputStyle, centered_rect,
};

use super::Component;
use crate::action::Action;

pub const PLACEHOLDER: &str = "City name, e.g. Paris";

pub struct AddCityOverlay {
    input: TextInput,
    modal: Modal,
    was_open: bool,
}

pub struct AddCityOverlayProps<'a> {
    pub query: &'a str,
    /// Name currently being validated
    pub pending: Option<&'a str>,
    pub error: Option<&'a str>,
    pub is_focused: bool,
    // Action constructors
    pub on_query_change: fn(String) -> Action,
    pub on_query_submit: fn(String) -> Action,
}

impl Default for AddCityOverlay {
    fn default() -> Self {
        Self {
            input: TextInput::new(),
            modal: Modal::new(),
            was_open: false,
        }
    }
}

impl AddCityOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the input each time the dialog opens
    pub fn set_open(&mut self, is_open: bool) {
        if is_open && !self.was_open {
            self.input = TextInput::new();
        }
        self.was_open = is_open;
    }

    /// Area the modal occupies inside `area`
    pub fn modal_area(area: Rect) -> Rect {
        centered_rect(60, 9, area)
    }

    fn status_line(props: &AddCityOverlayProps<'_>) -> Line<'static> {
        match (props.pending, props.error) {
            (Some(name), _) => Line::from(Span::styled(
                format!("Checking {name}…"),
                Style::default().fg(Color::Yellow),
            )),
            (None, Some(error)) => Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Rgb(200, 100, 100)),
            )),
            (None, None) => Line::from(vec![
                Span::styled("Enter", Style::default().fg(Color::Cyan)),
                Span::styled(" add  ", Style::default().fg(Color::DarkGray)),
                Span::styled("Esc", Style::default().fg(Color::Cyan)),
                Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
            ]),
        }
    }
}

impl Component<Action> for AddCityOverlay {
    type Props<'a> = AddCityOverlayProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }

        let EventKind::Key(key) = event else {
            return Vec::new();
        };

        match key.code {
            KeyCode::Esc => return vec![Action::CityAddClose],
            KeyCode::Enter => return vec![(props.on_query_submit)(props.query.to_string())],
            _ => {}
        }

        // All other keys go to the input
        let input_props = TextInputProps {
            value: props.query,
            placeholder: PLACEHOLDER,
            is_focused: true,
            style: TextInputStyle {
                base: BaseStyle {
                    border: None,
                    padding: Padding::new(1, 0, 1, 0),
                    bg: None,
                    fg: None,
                },
                placeholder_style: None,
                cursor_style: None,
            },
            on_change: props.on_query_change,
            on_submit: props.on_query_submit,
            on_cursor_move: Some(|_| Action::Render),
        };

        self.input
            .handle_event(event, input_props)
            .into_iter()
            .collect()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        if area.width < 20 || area.height < 7 {
            return;
        }

        let AddCityOverlay { input, modal, .. } = self;
        let status = Self::status_line(&props);
        let mut render_content = |frame: &mut Frame, content_area: Rect| {
            let chunks = Layout::vertical([
                Constraint::Length(1), // Title
                Constraint::Length(3), // Input
                Constraint::Length(1), // Status
            ])
            .split(content_area);

            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " Add a city",
                    Style::default().fg(Color::White),
                ))),
                chunks[0],
            );

            let input_props = TextInputProps {
                value: props.query,
                placeholder: PLACEHOLDER,
                is_focused: props.is_focused && props.pending.is_none(),
                style: TextInputStyle {
                    base: BaseStyle {
                        border: None,
                        padding: Padding::all(1),
                        bg: Some(Color::Rgb(50, 50, 60)),
                        fg: None,
                    },
                    placeholder_style: None,
                    cursor_style: None,
                },
                on_change: props.on_query_change,
                on_submit: props.on_query_submit,
                on_cursor_move: Some(|_| Action::Render),
            };
            input.render(frame, chunks[1], input_props);

            frame.render_widget(Paragraph::new(status.clone()), chunks[2]);
        };

        modal.render(
            frame,
            area,
            ModalProps {
                is_open: true,
                is_focused: props.is_focused,
                area: Self::modal_area(area),
                style: ModalStyle {
                    base: BaseStyle {
                        bg: Some(Color::Rgb(35, 35, 45)),
                        padding: Padding::xy(1, 0),
                        border: None,
                        fg: None,
                    },
                    ..Default::default()
                },
                behavior: ModalBehavior::default(),
                on_close: || Action::CityAddClose,
                render_content: &mut render_content,
            },
        );
    }
}
