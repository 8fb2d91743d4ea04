//! Weather widget - tracked cities with current weather

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Frame, Terminal, backend::CrosstermBackend, layout::Rect};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventContext, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, RenderContext, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};
use weather_widget::action::Action;
use weather_widget::city::{IdStrategy, MAX_CITIES};
use weather_widget::components::{
    AddCityOverlay, AddCityOverlayProps, Component, WeatherWidget, WeatherWidgetProps,
};
use weather_widget::config::{
    self, Config, ConfigError, DEFAULT_BASE_URL, DEFAULT_CITY, DEFAULT_TIMEOUT_SECS,
};
use weather_widget::effect::{Effect, task};
use weather_widget::logging;
use weather_widget::manager::{CityManager, ManagerError};
use weather_widget::reducer::reducer;
use weather_widget::services::Services;
use weather_widget::state::AppState;

/// Track up to ten cities and show the current weather for one of them
#[derive(Parser, Debug)]
#[command(name = "weather-widget")]
#[command(about = "A terminal weather widget with a persistent list of cities")]
struct Args {
    /// OpenWeatherMap API key (falls back to OWM_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Weather provider base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// City used when the current position is unknown
    #[arg(long, default_value = DEFAULT_CITY)]
    default_city: String,

    /// Maximum number of tracked cities
    #[arg(long, default_value_t = MAX_CITIES as u64, value_parser = clap::value_parser!(u64).range(1..))]
    max_cities: u64,

    /// How ids are assigned to added cities
    #[arg(long, value_enum, default_value_t = IdStrategy::Positional)]
    ids: IdStrategy,

    /// Request timeout in seconds (0 disables)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Directory holding storage.json and the log file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Current latitude (requires --lon)
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Current longitude (requires --lat)
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Look up the current position by IP address
    #[arg(long)]
    locate: bool,

    /// Log file for the terminal widget
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Weather refresh interval in seconds (minimum 1)
    #[arg(long, default_value = "600", value_parser = clap::value_parser!(u64).range(1..))]
    refresh_interval: u64,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the city list without the terminal UI
    #[command(subcommand)]
    Cities(CitiesCommand),
}

#[derive(Subcommand, Debug)]
enum CitiesCommand {
    /// Print the tracked cities
    List,
    /// Validate and add a city
    Add { name: String },
    /// Remove the city with this id
    Remove { id: u32 },
    /// Move city `after` to the position of city `before`
    Move { before: u32, after: u32 },
}

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum WidgetComponentId {
    Widget,
    AddCity,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum WidgetContext {
    Main,
    AddCity,
}

impl EventRoutingState<WidgetComponentId, WidgetContext> for AppState {
    fn focused(&self) -> Option<WidgetComponentId> {
        if self.add_mode {
            Some(WidgetComponentId::AddCity)
        } else {
            Some(WidgetComponentId::Widget)
        }
    }

    fn modal(&self) -> Option<WidgetComponentId> {
        if self.add_mode {
            Some(WidgetComponentId::AddCity)
        } else {
            None
        }
    }

    fn binding_context(&self, id: WidgetComponentId) -> WidgetContext {
        match id {
            WidgetComponentId::Widget => WidgetContext::Main,
            WidgetComponentId::AddCity => WidgetContext::AddCity,
        }
    }

    fn default_context(&self) -> WidgetContext {
        WidgetContext::Main
    }
}

fn build_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = Config::new(args.api_key.clone(), args.data_dir.as_deref())?;
    config.base_url = args.base_url.trim_end_matches('/').to_string();
    config.default_city = args.default_city.clone();
    config.max_cities = usize::try_from(args.max_cities).unwrap_or(usize::MAX);
    config.id_strategy = args.ids;
    config.timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    config.locate = config::locate_mode(args.lat, args.lon, args.locate)?;
    config.log_file = args.log_file.clone();
    Ok(config)
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();

    let (config, services) = match build_config(&args).and_then(|config| {
        let services = config.services()?;
        Ok((config, services))
    }) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match args.command {
        Some(Command::Cities(command)) => run_cities(command, &config, services).await,
        None => run_widget(args.debug, &config, services, args.refresh_interval).await,
    }
}

// ============================================================================
// Headless
// ============================================================================

async fn run_cities(command: CitiesCommand, config: &Config, services: Services) -> io::Result<()> {
    logging::init_stderr()?;

    let mut manager = CityManager::new(config.city_list(), services);
    let token = manager.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    if let Err(e) = apply(&mut manager, command).await {
        eprintln!("Error: {e}");
        std::process::exit(130);
    }

    for city in manager.cities() {
        println!("{:>3}  {:<24} sort {}", city.id, city.name, city.sort);
    }
    if let Some(error) = manager.error() {
        eprintln!("{error}");
        std::process::exit(1);
    }
    Ok(())
}

async fn apply(manager: &mut CityManager, command: CitiesCommand) -> Result<(), ManagerError> {
    manager.bootstrap().await?;
    match command {
        CitiesCommand::List => Ok(()),
        CitiesCommand::Add { name } => manager.add_city(&name).await,
        CitiesCommand::Remove { id } => manager.remove_city(id).await,
        CitiesCommand::Move { before, after } => manager.reorder(before, after).await,
    }
}

// ============================================================================
// Terminal widget
// ============================================================================

async fn run_widget(
    debug_args: DebugCliArgs,
    config: &Config,
    services: Services,
    refresh_interval: u64,
) -> io::Result<()> {
    logging::init_file(&config.log_path())?;
    tracing::info!(
        storage = %config.storage_path().display(),
        max_cities = config.max_cities,
        "starting weather widget"
    );

    let debug = DebugSession::new(debug_args);

    // Export JSON schemas if requested
    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    let cities = config.city_list();
    let state = debug
        .load_state_or_else_async(move || async move {
            Ok::<AppState, io::Error>(AppState::new(cities))
        })
        .await
        .map_err(debug_error)?;

    let replay_actions = debug.load_replay_items().map_err(debug_error)?;

    let (middleware, action_recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    // ===== Terminal setup =====
    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(
        &mut terminal,
        &debug,
        store,
        services,
        refresh_interval,
        replay_actions,
    )
    .await;

    // ===== Cleanup =====
    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug
        .save_actions(action_recorder.as_ref())
        .map_err(debug_error)?;

    Ok(())
}

struct WidgetUi {
    widget: WeatherWidget,
    add_city: AddCityOverlay,
}

impl WidgetUi {
    fn new() -> Self {
        Self {
            widget: WeatherWidget::new(),
            add_city: AddCityOverlay::new(),
        }
    }

    fn overlay_props<'a>(state: &'a AppState, is_focused: bool) -> AddCityOverlayProps<'a> {
        AddCityOverlayProps {
            query: &state.add_query,
            pending: state.pending_add.as_deref(),
            error: state.error.as_deref(),
            is_focused,
            on_query_change: Action::CityAddQueryChange,
            on_query_submit: Action::CityAddSubmit,
        }
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        render_ctx: RenderContext,
        event_ctx: &mut EventContext<WidgetComponentId>,
    ) {
        event_ctx.set_component_area(WidgetComponentId::Widget, area);

        let props = WeatherWidgetProps {
            state,
            is_focused: render_ctx.is_focused() && !state.add_mode,
        };
        self.widget.render(frame, area, props);

        self.add_city.set_open(state.add_mode);
        if state.add_mode {
            event_ctx.set_component_area(
                WidgetComponentId::AddCity,
                AddCityOverlay::modal_area(area),
            );
            let props = Self::overlay_props(state, render_ctx.is_focused());
            self.add_city.render(frame, area, props);
        } else {
            event_ctx
                .component_areas
                .remove(&WidgetComponentId::AddCity);
        }
    }

    fn handle_widget_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = WeatherWidgetProps {
            state,
            is_focused: true,
        };
        let actions: Vec<_> = self
            .widget
            .handle_event(event, props)
            .into_iter()
            .collect();
        if actions.is_empty() {
            HandlerResponse::ignored()
        } else {
            HandlerResponse {
                actions,
                consumed: true,
                needs_render: false,
            }
        }
    }

    fn handle_add_city_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        self.add_city.set_open(state.add_mode);
        let props = Self::overlay_props(state, true);
        let actions: Vec<_> = self
            .add_city
            .handle_event(event, props)
            .into_iter()
            .collect();
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    services: Services,
    refresh_interval: u64,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(WidgetUi::new()));
    let mut bus: EventBus<AppState, Action, WidgetComponentId, WidgetContext> = EventBus::new();
    let keybindings: Keybindings<WidgetContext> = Keybindings::new();

    let ui_widget = Rc::clone(&ui);
    bus.register(WidgetComponentId::Widget, move |event, state| {
        ui_widget
            .borrow_mut()
            .handle_widget_event(&event.kind, state)
    });

    let ui_add_city = Rc::clone(&ui);
    bus.register(WidgetComponentId::AddCity, move |event, state| {
        ui_add_city
            .borrow_mut()
            .handle_add_city_event(&event.kind, state)
    });

    // Re-render on terminal resize (no action needed, just redraw)
    bus.register_global(|event, _state| match event.kind {
        EventKind::Resize(_, _) => HandlerResponse::ignored().with_render(),
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::CitiesBootstrap),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }

                runtime.subscriptions().interval(
                    "refresh",
                    Duration::from_secs(refresh_interval),
                    || Action::WeatherFetch,
                );
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, &services),
        )
        .await
}

/// Handle effects by spawning keyed tasks; a new task replaces one with the same key
fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, services: &Services) {
    match effect {
        Effect::Bootstrap => {
            let services = services.clone();
            ctx.tasks()
                .spawn(task::BOOTSTRAP, async move { services.bootstrap().await });
        }
        Effect::ValidateCity { name } => {
            let services = services.clone();
            ctx.tasks().spawn(task::VALIDATE, async move {
                services.validate_city(name).await
            });
        }
        Effect::CancelValidation => {
            ctx.tasks().cancel(&TaskKey::new(task::VALIDATE));
        }
        Effect::SaveCities { cities } => {
            let services = services.clone();
            ctx.tasks()
                .spawn(task::SAVE, async move { services.save_cities(cities).await });
        }
        Effect::FetchWeather { city } => {
            let services = services.clone();
            ctx.tasks()
                .spawn(task::WEATHER, async move { services.fetch_weather(city).await });
        }
    }
}
