use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Layout};
use ratatui::prelude::{Frame, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_dispatch::EventKind;
use tui_dispatch_components::{
    StatusBar, StatusBarHint, StatusBarProps, StatusBarSection, StatusBarStyle,
};

use super::{CityListPanel, CityListPanelProps, Component, WeatherPanel, WeatherPanelProps};
use crate::action::Action;
use crate::state::AppState;

pub const ERROR_ICON: &str = "\u{26a0}\u{fe0f}";

/// Width of the city column
const LIST_WIDTH: u16 = 26;

/// Props for WeatherWidget - read-only view of state
pub struct WeatherWidgetProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

/// The main widget: city list, weather for the selection, error banner
#[derive(Default)]
pub struct WeatherWidget {
    list: CityListPanel,
}

impl WeatherWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reorder intent moving the selected city one slot up (`-1`) or down (`1`)
    fn shift_selected(state: &AppState, delta: isize) -> Option<Action> {
        let selected = state.cities.get(state.selected)?;
        let target = state.selected.checked_add_signed(delta)?;
        let neighbour = state.cities.get(target)?;
        Some(Action::CityReorder {
            before: neighbour.id,
            after: selected.id,
        })
    }
}

impl Component<Action> for WeatherWidget {
    type Props<'a> = WeatherWidgetProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return None;
        }
        let state = props.state;

        match event {
            EventKind::Key(key) => match key.code {
                KeyCode::Up | KeyCode::Char('k') if state.selected > 0 => {
                    Some(Action::CitySelect(state.selected - 1))
                }
                KeyCode::Down | KeyCode::Char('j') if state.selected + 1 < state.cities.len() => {
                    Some(Action::CitySelect(state.selected + 1))
                }
                KeyCode::Char('K') => Self::shift_selected(state, -1),
                KeyCode::Char('J') => Self::shift_selected(state, 1),
                KeyCode::Char('a') | KeyCode::Char('/') => Some(Action::CityAddOpen),
                KeyCode::Char('d') | KeyCode::Delete => {
                    state.selected_city().map(|city| Action::CityRemove(city.id))
                }
                KeyCode::Char('r') | KeyCode::F(5) => Some(Action::WeatherFetch),
                KeyCode::Char('c') if state.error.is_some() => Some(Action::ErrorClear),
                KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
                _ => None,
            },
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: WeatherWidgetProps<'_>) {
        let state = props.state;
        let banner_height = u16::from(state.error.is_some() && !state.add_mode);
        let chunks = Layout::vertical([
            Constraint::Length(banner_height), // Error banner
            Constraint::Min(1),                // Main content
            Constraint::Length(1),             // Help bar
        ])
        .split(area);

        if let Some(error) = state.error.as_deref().filter(|_| banner_height > 0) {
            let banner = Line::from(vec![
                Span::raw(format!(" {ERROR_ICON} ")),
                Span::styled(error.to_string(), Style::default().fg(Color::Red).bold()),
                Span::styled("  (c to dismiss)", Style::default().fg(Color::DarkGray)),
            ]);
            frame.render_widget(Paragraph::new(banner), chunks[0]);
        }

        let columns =
            Layout::horizontal([Constraint::Length(LIST_WIDTH), Constraint::Min(1)]).split(chunks[1]);

        self.list.render(
            frame,
            columns[0],
            CityListPanelProps {
                cities: &state.cities,
                selected: state.selected,
                is_focused: props.is_focused,
                on_select: Action::CitySelect,
            },
        );

        let mut panel = WeatherPanel;
        panel.render(frame, columns[1], WeatherPanelProps { state });

        let mut status_bar = StatusBar::new();
        <StatusBar as Component<Action>>::render(
            &mut status_bar,
            frame,
            chunks[2],
            StatusBarProps {
                left: StatusBarSection::empty(),
                center: StatusBarSection::hints(&[
                    StatusBarHint::new("↑↓", "select"),
                    StatusBarHint::new("J/K", "move"),
                    StatusBarHint::new("a", "add"),
                    StatusBarHint::new("d", "remove"),
                    StatusBarHint::new("r", "refresh"),
                    StatusBarHint::new("q", "quit"),
                ]),
                right: StatusBarSection::empty(),
                style: StatusBarStyle::default(),
                is_focused: false,
            },
        );
    }
}
