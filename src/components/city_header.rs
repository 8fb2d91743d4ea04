use artbox::{
    Alignment as ArtAlignment, Color as ArtColor, Fill, LinearGradient, Renderer, fonts,
    integrations::ratatui::ArtBox,
};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::Component;
use crate::action::Action;

pub struct CityHeader;

pub struct CityHeaderProps<'a> {
    pub name: &'a str,
    /// Dimmed line under the name (coordinates, country)
    pub subtitle: Option<String>,
    pub temperature: Option<f64>,
}

/// Overhead inside the header area: 1 spacer + 1 subtitle line.
/// The FIGlet city name gets `area.height - HEADER_OVERHEAD`.
pub const HEADER_OVERHEAD: u16 = 2;

pub fn font_stack() -> Vec<artbox::Font> {
    fonts::stack(&["terminus", "miniwi"])
}

/// Gradient endpoints by temperature band; gray when nothing is loaded
fn gradient_colors(temp: Option<f64>) -> (ArtColor, ArtColor) {
    match temp {
        Some(t) if t < 0.0 => (ArtColor::rgb(150, 200, 255), ArtColor::rgb(200, 230, 255)),
        Some(t) if t < 15.0 => (ArtColor::rgb(100, 180, 255), ArtColor::rgb(150, 220, 200)),
        Some(t) if t < 25.0 => (ArtColor::rgb(100, 200, 150), ArtColor::rgb(255, 220, 100)),
        Some(t) if t < 35.0 => (ArtColor::rgb(255, 180, 80), ArtColor::rgb(255, 120, 80)),
        Some(_) => (ArtColor::rgb(255, 100, 80), ArtColor::rgb(255, 60, 60)),
        None => (ArtColor::rgb(180, 180, 180), ArtColor::rgb(220, 220, 220)),
    }
}

pub fn temperature_fill(temp: Option<f64>) -> Fill {
    let (start, end) = gradient_colors(temp);
    Fill::Linear(LinearGradient::horizontal(start, end))
}

impl Component<Action> for CityHeader {
    type Props<'a> = CityHeaderProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([
            Constraint::Fill(1),   // FIGlet city name
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Subtitle
        ])
        .split(area);

        let renderer = Renderer::new(font_stack())
            .with_plain_fallback()
            .with_alignment(ArtAlignment::Center)
            .with_fill(temperature_fill(props.temperature));
        frame.render_widget(ArtBox::new(&renderer, props.name), chunks[0]);

        if let Some(subtitle) = props.subtitle {
            let line = Line::from(vec![Span::styled(
                subtitle,
                Style::default().fg(Color::DarkGray),
            )])
            .centered();
            frame.render_widget(Paragraph::new(line), chunks[2]);
        }
    }
}
