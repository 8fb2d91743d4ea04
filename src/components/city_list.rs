use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tui_dispatch_components::{
    BaseStyle, Padding, ScrollbarStyle, SelectList, SelectListBehavior, SelectListProps,
    SelectListStyle, SelectionStyle,
};

use super::Component;
use crate::action::Action;
use crate::city::CityList;

/// Left column: tracked cities in display order
pub struct CityListPanel {
    list: SelectList,
}

pub struct CityListPanelProps<'a> {
    pub cities: &'a CityList,
    pub selected: usize,
    pub is_focused: bool,
    pub on_select: fn(usize) -> Action,
}

impl Default for CityListPanel {
    fn default() -> Self {
        Self {
            list: SelectList::new(),
        }
    }
}

impl CityListPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(cities: &CityList) -> Vec<Line<'static>> {
        cities
            .as_slice()
            .iter()
            .enumerate()
            .map(|(index, city)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>2}. ", index + 1),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(city.name.clone()),
                ])
            })
            .collect()
    }
}

impl Component<Action> for CityListPanel {
    type Props<'a> = CityListPanelProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([
            Constraint::Length(1), // Title
            Constraint::Min(1),    // List
        ])
        .split(area);

        let count_style = if props.cities.is_full() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title = Line::from(vec![
            Span::styled(" Cities ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("{}/{}", props.cities.len(), props.cities.capacity()),
                count_style,
            ),
        ]);
        frame.render_widget(Paragraph::new(title), chunks[0]);

        let items = Self::items(props.cities);
        let list_props = SelectListProps {
            items: &items,
            count: items.len(),
            selected: props.selected.min(items.len().saturating_sub(1)),
            is_focused: props.is_focused,
            style: SelectListStyle {
                base: BaseStyle {
                    border: None,
                    padding: Padding::xy(1, 0),
                    bg: None,
                    fg: None,
                },
                selection: SelectionStyle::default(),
                scrollbar: ScrollbarStyle::default(),
            },
            behavior: SelectListBehavior {
                show_scrollbar: true,
                wrap_navigation: false,
            },
            on_select: props.on_select,
            render_item: &|item| item.clone(),
        };
        self.list.render(frame, chunks[1], list_props);
    }
}
