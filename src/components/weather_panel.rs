use artbox::{Alignment as ArtAlignment, Renderer, integrations::ratatui::ArtBox};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

use tui_dispatch::DataResource;

use super::city_header::{HEADER_OVERHEAD, font_stack, temperature_fill};
use super::{CityHeader, CityHeaderProps, Component, ERROR_ICON};
use crate::action::Action;
use crate::forecast::{WeatherForecast, WeatherSummary};
use crate::state::AppState;

pub struct WeatherPanel;

pub struct WeatherPanelProps<'a> {
    pub state: &'a AppState,
}

/// terminus is 6 rows tall
const HEADER_CAP: u16 = 6 + HEADER_OVERHEAD;
const TEMP_CAP: u16 = 6;
const DETAIL_ROWS: u16 = 3;

// ============================================================================
// Component
// ============================================================================

impl Component<Action> for WeatherPanel {
    type Props<'a> = WeatherPanelProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let state = props.state;
        match WeatherView::from_state(state) {
            WeatherView::NoCity => render_no_city(frame, area, state.cities_loading),
            WeatherView::Error(name, error) => render_error(frame, area, name, error),
            WeatherView::Ready(weather) => {
                render_ready(frame, area, weather, state.is_refreshing);
            }
            WeatherView::Loading(name) => render_placeholder(frame, area, name),
            WeatherView::Empty(name) => render_placeholder_hint(frame, area, name),
        }
    }
}

fn make_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::vertical([
        Constraint::Max(HEADER_CAP),
        Constraint::Length(1), // blank
        Constraint::Length(1), // condition glyph
        Constraint::Max(TEMP_CAP),
        Constraint::Length(1), // description / message
        Constraint::Length(1), // blank
        Constraint::Length(DETAIL_ROWS),
    ])
    .flex(Flex::Center)
    .split(area)
}

fn render_header(
    frame: &mut Frame,
    area: Rect,
    name: &str,
    subtitle: Option<String>,
    temperature: Option<f64>,
) {
    let mut header = CityHeader;
    header.render(
        frame,
        area,
        CityHeaderProps {
            name,
            subtitle,
            temperature,
        },
    );
}

fn render_ready(frame: &mut Frame, area: Rect, weather: &WeatherForecast, refreshing: bool) {
    let chunks = make_layout(area);
    let summary = WeatherSummary::from(weather);

    let mut subtitle = format!("{:.2}°N, {:.2}°E", weather.coord.lat, weather.coord.lon);
    if let Some(country) = weather.sys.country.as_deref().filter(|c| !c.is_empty()) {
        subtitle = format!("{country} · {subtitle}");
    }
    if refreshing {
        subtitle.push_str(" · refreshing…");
    }
    render_header(
        frame,
        chunks[0],
        &weather.name,
        Some(subtitle),
        Some(weather.main.temp),
    );

    frame.render_widget(
        Paragraph::new(Line::from(summary.icon).centered()),
        chunks[2],
    );

    let renderer = Renderer::new(font_stack())
        .with_plain_fallback()
        .with_alignment(ArtAlignment::Center)
        .with_fill(temperature_fill(Some(weather.main.temp)));
    frame.render_widget(ArtBox::new(&renderer, &summary.temperature), chunks[3]);

    let desc = Line::from(vec![Span::styled(
        summary.description.clone(),
        Style::default().fg(Color::Gray),
    )])
    .centered();
    frame.render_widget(Paragraph::new(desc), chunks[4]);

    frame.render_widget(Paragraph::new(detail_lines(&summary)), chunks[6]);
}

fn detail_lines(summary: &WeatherSummary) -> Vec<Line<'static>> {
    let pair = |label: &'static str, value: &str| {
        vec![
            Span::styled(label, Style::default().fg(Color::DarkGray)),
            Span::raw(" "),
            Span::styled(value.to_string(), Style::default().fg(Color::White)),
        ]
    };
    let row = |left: Vec<Span<'static>>, right: Vec<Span<'static>>| {
        let mut spans = left;
        spans.push(Span::raw("   "));
        spans.extend(right);
        Line::from(spans).centered()
    };

    vec![
        row(
            pair("Feels like", &summary.feels_like),
            pair("Wind", &summary.wind),
        ),
        row(
            pair("Clouds", &summary.clouds),
            pair("Pressure", &summary.pressure),
        ),
        row(
            pair("Humidity", &summary.humidity),
            pair("Visibility", &summary.visibility),
        ),
    ]
}

fn render_placeholder(frame: &mut Frame, area: Rect, name: &str) {
    let chunks = make_layout(area);
    render_header(frame, chunks[0], name, None, None);

    let msg = Line::from(vec![Span::styled(
        "Loading...",
        Style::default().fg(Color::DarkGray),
    )])
    .centered();
    frame.render_widget(Paragraph::new(msg), chunks[4]);
}

fn render_placeholder_hint(frame: &mut Frame, area: Rect, name: &str) {
    let chunks = make_layout(area);
    render_header(frame, chunks[0], name, None, None);
    frame.render_widget(
        Paragraph::new(key_hint("r", " to fetch weather")),
        chunks[4],
    );
}

fn render_no_city(frame: &mut Frame, area: Rect, loading: bool) {
    let chunks = Layout::vertical([Constraint::Length(1)])
        .flex(Flex::Center)
        .split(area);
    let line = if loading {
        Line::from(Span::styled(
            "Finding your city...",
            Style::default().fg(Color::DarkGray),
        ))
        .centered()
    } else {
        key_hint("a", " to add a city")
    };
    frame.render_widget(Paragraph::new(line), chunks[0]);
}

fn render_error(frame: &mut Frame, area: Rect, name: &str, error: &str) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // icon
        Constraint::Length(1), // city
        Constraint::Length(1), // message
        Constraint::Length(1), // blank
        Constraint::Length(1), // hint
    ])
    .flex(Flex::Center)
    .split(area);

    frame.render_widget(
        Paragraph::new(Line::from(ERROR_ICON).centered()),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(
            Line::from(vec![Span::styled(
                format!("No weather for {name}"),
                Style::default().fg(Color::Red).bold(),
            )])
            .centered(),
        ),
        chunks[1],
    );
    frame.render_widget(
        Paragraph::new(
            Line::from(vec![Span::styled(
                error.to_string(),
                Style::default().fg(Color::Rgb(200, 100, 100)),
            )])
            .centered(),
        ),
        chunks[2],
    );
    frame.render_widget(Paragraph::new(key_hint("r", " to retry")), chunks[4]);
}

fn key_hint(key: &'static str, rest: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled("Press ", Style::default().fg(Color::DarkGray)),
        Span::styled(key, Style::default().fg(Color::Cyan).bold()),
        Span::styled(rest, Style::default().fg(Color::DarkGray)),
    ])
    .centered()
}

// ============================================================================
// Helpers
// ============================================================================

enum WeatherView<'a> {
    NoCity,
    Error(&'a str, &'a str),
    Ready(&'a WeatherForecast),
    Loading(&'a str),
    Empty(&'a str),
}

impl<'a> WeatherView<'a> {
    fn from_state(state: &'a AppState) -> Self {
        let Some(city) = state.selected_city() else {
            return WeatherView::NoCity;
        };
        match &state.weather {
            DataResource::Failed(error) => WeatherView::Error(&city.name, error),
            DataResource::Loaded(weather) => WeatherView::Ready(weather),
            DataResource::Loading => WeatherView::Loading(&city.name),
            DataResource::Empty => WeatherView::Empty(&city.name),
        }
    }
}
