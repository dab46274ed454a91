mod config;
mod cursor;
mod field;
mod graphics;
mod host;
mod input;
mod math;
mod particle;
mod renderer;
mod state;
mod surface;
mod terminal;
mod widget;

use anyhow::Context;
use clap::Parser;
use config::{AppConfig, Args};
use crossterm::event;
use cursor::{PointerCursor, Spring};
use graphics::Color;
use host::{Host, ListenerKind};
use input::Propagation;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use renderer::Renderer;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use surface::DeviceClass;
use terminal::{
    listener_kind, map_event, Action, Compositor, LayerFade, Presenter, TerminalHost,
    TerminalSession,
};
use widget::BackgroundField;

/// Page color behind the field layer
const BACKDROP: Color = Color::BLACK;
/// How long the field takes to fade in
const FADE_IN: Duration = Duration::from_secs(1);
/// Poll interval while nothing is scheduled
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Main function
fn main() -> anyhow::Result<()> {
    let config = Args::parse().validate()?;
    init_logging(config.log_file.as_deref())?;

    let size = terminal_size()?;
    let mut host = TerminalHost::new(size, &config);
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut field = BackgroundField::new(config.driver, Renderer::default(), rng);

    let stdout = io::stdout();
    let mut session =
        TerminalSession::enter(stdout.lock()).context("failed to set up the terminal")?;

    field.mount(&mut host);
    let result = run(&mut session, &mut host, &mut field, &config);
    field.unmount(&mut host);
    drop(session);

    info!("exited with {} listeners left", host.listener_count());
    result
}

/// Logs go to a file, if any: the terminal belongs to the animation
fn init_logging(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn terminal_size() -> anyhow::Result<(u16, u16)> {
    match termsize::get() {
        Some(size) => Ok((size.cols, size.rows)),
        None => crossterm::terminal::size().context("failed to query the terminal size"),
    }
}

fn run<W: Write>(
    session: &mut TerminalSession<W>,
    host: &mut TerminalHost,
    field: &mut BackgroundField,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let (cols, rows) = host.size();
    let mut presenter = Presenter::new(cols, rows);
    let fade = if config.reduced_motion {
        Duration::ZERO
    } else {
        FADE_IN
    };
    let mut compositor = Compositor::new(
        LayerFade::new(Instant::now(), fade, config.opacity),
        BACKDROP,
    );
    let mut cursor = config.cursor.then(|| PointerCursor::new(Spring::default()));
    let mut debug = config.debug;
    let mut redraw = true;
    let mut last_tick = Instant::now();

    loop {
        let now = Instant::now();
        let overlay_busy = compositor.is_fading(now)
            || cursor.as_ref().is_some_and(|c| c.is_animating());
        let wake = match host.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now),
            None => IDLE_POLL,
        };
        let timeout = if overlay_busy {
            wake.min(host.refresh_interval())
        } else {
            wake
        };

        let mut quit = false;
        if event::poll(timeout)? {
            loop {
                let ev = event::read()?;
                for action in map_event(&ev, host) {
                    match action {
                        Action::Quit => quit = true,
                        Action::Input(input) => {
                            if host.is_listening(listener_kind(&input)) {
                                match field.handle_input(input) {
                                    Propagation::PreventDefault => {
                                        debug!("{:?} consumed by the field", input)
                                    }
                                    Propagation::Continue => {}
                                }
                            }
                            if let Some(cursor) = cursor.as_mut() {
                                cursor.handle(&input);
                            }
                        }
                        Action::Resize(cols, rows) => {
                            host.set_size(cols, rows);
                            presenter.resize(cols, rows);
                            if host.is_listening(ListenerKind::Resize) {
                                field.resize(host);
                            }
                            redraw = true;
                        }
                        Action::ToggleReducedMotion => {
                            let reduced = host.toggle_reduced_motion();
                            if host.is_listening(ListenerKind::ReducedMotionChange) {
                                field.set_reduced_motion(host, reduced);
                            }
                            redraw = true;
                        }
                        Action::Reseed => {
                            field.reseed();
                            redraw = true;
                        }
                        Action::ToggleDebug => {
                            debug = !debug;
                            redraw = true;
                        }
                    }
                }
                if quit || !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }
        if quit {
            return Ok(());
        }

        let now = Instant::now();
        if let Some(id) = host.take_due_frame(now) {
            field.on_frame(host, id);
        }

        let dt = now.duration_since(last_tick).as_secs_f64();
        last_tick = now;
        let cursor_moving = match cursor.as_mut() {
            Some(cursor) if host.prefers_reduced_motion() => {
                let moving = cursor.is_animating();
                cursor.settle();
                moving
            }
            Some(cursor) => {
                let moving = cursor.is_animating();
                cursor.advance(dt);
                moving
            }
            None => false,
        };

        let painted = field.take_dirty();
        if !(painted || redraw || cursor_moving || compositor.is_fading(now)) {
            continue;
        }
        redraw = false;

        let Some(viewport) = host.viewport() else {
            continue;
        };
        let layer = field.surface().map(|s| s.buffer());
        let output = compositor.compose(layer, viewport, now);
        if let Some(cursor) = cursor.as_ref() {
            if field.context().device_class == DeviceClass::Desktop {
                cursor.draw(output);
            }
        }
        presenter.draw_buffer(output, BACKDROP);
        if debug {
            draw_debug(&mut presenter, field, host);
        }
        presenter.flush(session.out())?;
    }
}

/// Debug overlay: version, frame rate and simulation state
fn draw_debug(presenter: &mut Presenter, field: &BackgroundField, host: &TerminalHost) {
    let ctx = field.context();
    let interaction = ctx.interaction();
    let pointer = match interaction.pointer {
        Some([x, y]) => format!("({:.0}, {:.0})", x, y),
        None => "none".to_string(),
    };
    let particles = if ctx.field.is_empty() {
        "waiting for a viewport".to_string()
    } else {
        ctx.field.len().to_string()
    };
    let lines = [
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        format!(
            "FPS: {:.1}  particles: {}  lit: {}  mode: {:?}  class: {:?}",
            field.fps(),
            particles,
            ctx.field.particles().iter().filter(|p| p.is_highlighted()).count(),
            field.mode(),
            ctx.device_class
        ),
        format!(
            "Viewport: {:.0}x{:.0} @{:.3}  pointer: {}  pressing: {}",
            ctx.viewport.width,
            ctx.viewport.height,
            ctx.viewport.device_pixel_ratio,
            pointer,
            interaction.active
        ),
        format!(
            "q quit  m reduced motion ({})  r reseed  d debug",
            if host.prefers_reduced_motion() { "on" } else { "off" }
        ),
    ];
    for (row, line) in lines.iter().enumerate() {
        presenter.draw_text(1, row as u16, line, Color::WHITE, Color::BLACK);
    }
}
