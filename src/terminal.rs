use crate::config::AppConfig;
use crate::graphics::{Color, PixelBuffer};
use crate::host::{FrameDelay, FrameId, Host, ListenerId, ListenerKind, ListenerOptions};
use crate::input::InputEvent;
use crate::math::Point;
use crate::surface::Viewport;
use crossterm::{
    cursor,
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
    },
    execute, queue,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, DisableLineWrap, EnableLineWrap, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use log::warn;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// The terminal acting as the page that hosts the field: it owns the frame
/// schedule, the listener registry and the reduced-motion preference.
#[derive(Debug)]
pub struct TerminalHost {
    size: (u16, u16),
    cell_size: (f64, f64),
    device_pixel_ratio: f64,
    reduced_motion: bool,
    refresh_interval: Duration,
    listeners: BTreeMap<ListenerId, (ListenerKind, ListenerOptions)>,
    pending: Option<(FrameId, Instant)>,
    next_id: u64,
}

impl TerminalHost {
    pub fn new(size: (u16, u16), config: &AppConfig) -> Self {
        TerminalHost {
            size,
            cell_size: config.cell_size,
            device_pixel_ratio: config.device_pixel_ratio(),
            reduced_motion: config.reduced_motion,
            refresh_interval: config.refresh_interval,
            listeners: BTreeMap::new(),
            pending: None,
            next_id: 0,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Flips the reduced-motion preference and returns the new value
    pub fn toggle_reduced_motion(&mut self) -> bool {
        self.reduced_motion = !self.reduced_motion;
        self.reduced_motion
    }

    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.listeners.values().any(|(k, _)| *k == kind)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, deadline)| deadline)
    }

    /// Hands out the pending frame once its deadline has passed
    pub fn take_due_frame(&mut self, now: Instant) -> Option<FrameId> {
        match self.pending {
            Some((id, deadline)) if deadline <= now => {
                self.pending = None;
                Some(id)
            }
            _ => None,
        }
    }

    /// Center of a terminal cell in logical coordinates
    pub fn cell_to_logical(&self, column: u16, row: u16) -> Point {
        [
            (column as f64 + 0.5) * self.cell_size.0,
            (row as f64 + 0.5) * self.cell_size.1,
        ]
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Host for TerminalHost {
    fn viewport(&self) -> Option<Viewport> {
        let (cols, rows) = self.size;
        if cols == 0 || rows == 0 {
            return None;
        }
        Some(Viewport::new(
            cols as f64 * self.cell_size.0,
            rows as f64 * self.cell_size.1,
            self.device_pixel_ratio,
        ))
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn add_listener(&mut self, kind: ListenerKind, options: ListenerOptions) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.insert(id, (kind, options));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn request_frame(&mut self, delay: FrameDelay) -> FrameId {
        let wait = match delay {
            FrameDelay::NextRefresh => self.refresh_interval,
            FrameDelay::After(d) => d.max(self.refresh_interval),
        };
        let id = FrameId(self.next_id());
        if let Some((previous, _)) = self.pending.replace((id, Instant::now() + wait)) {
            warn!("frame {:?} replaced by {:?} before it ran", previous, id);
        }
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if matches!(self.pending, Some((pending, _)) if pending == id) {
            self.pending = None;
        }
    }
}

/// What a terminal event means to the application
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Input(InputEvent),
    Resize(u16, u16),
    ToggleReducedMotion,
    Reseed,
    ToggleDebug,
    Quit,
}

/// Translates a crossterm event into zero or more actions
pub fn map_event(event: &Event, host: &TerminalHost) -> Vec<Action> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                vec![Action::Quit]
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => vec![Action::Quit],
            KeyCode::Char('m') | KeyCode::Char('M') => vec![Action::ToggleReducedMotion],
            KeyCode::Char('r') | KeyCode::Char('R') => vec![Action::Reseed],
            KeyCode::Char('d') | KeyCode::Char('D') => vec![Action::ToggleDebug],
            _ => Vec::new(),
        },
        Event::Mouse(mouse) => {
            let at = host.cell_to_logical(mouse.column, mouse.row);
            match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    vec![Action::Input(InputEvent::PointerMove(at))]
                }
                MouseEventKind::Down(MouseButton::Left) => vec![
                    Action::Input(InputEvent::PointerMove(at)),
                    Action::Input(InputEvent::PointerDown),
                ],
                MouseEventKind::Up(MouseButton::Left) => {
                    vec![Action::Input(InputEvent::PointerUp)]
                }
                _ => Vec::new(),
            }
        }
        Event::FocusLost => vec![Action::Input(InputEvent::PointerLeave)],
        Event::Resize(cols, rows) => vec![Action::Resize(*cols, *rows)],
        _ => Vec::new(),
    }
}

/// The listener kind an input event is delivered through
pub fn listener_kind(event: &InputEvent) -> ListenerKind {
    match event {
        InputEvent::PointerMove(_) => ListenerKind::PointerMove,
        InputEvent::PointerDown => ListenerKind::PointerDown,
        InputEvent::PointerUp => ListenerKind::PointerUp,
        InputEvent::PointerLeave => ListenerKind::PointerLeave,
        InputEvent::TouchStart(_) => ListenerKind::TouchStart,
        InputEvent::TouchMove(_) => ListenerKind::TouchMove,
        InputEvent::TouchEnd => ListenerKind::TouchEnd,
    }
}

/// Layer opacity ramp applied while the field first appears
#[derive(Debug, Clone, Copy)]
pub struct LayerFade {
    started: Instant,
    duration: Duration,
    target: f64,
}

impl LayerFade {
    pub fn new(started: Instant, duration: Duration, target: f64) -> Self {
        LayerFade {
            started,
            duration,
            target,
        }
    }

    pub fn opacity(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return self.target;
        }
        let t = now.saturating_duration_since(self.started).as_secs_f64()
            / self.duration.as_secs_f64();
        self.target * t.clamp(0.0, 1.0)
    }

    pub fn is_running(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) < self.duration
    }
}

/// Flattens the field layer onto the terminal backdrop
#[derive(Debug)]
pub struct Compositor {
    fade: LayerFade,
    backdrop: Color,
    output: PixelBuffer,
}

impl Compositor {
    pub fn new(fade: LayerFade, backdrop: Color) -> Self {
        Compositor {
            fade,
            backdrop,
            output: PixelBuffer::new(0, 0, 1.0),
        }
    }

    pub fn is_fading(&self, now: Instant) -> bool {
        self.fade.is_running(now)
    }

    /// Backdrop plus the faded layer, sized for `viewport`; overlays draw on the result
    pub fn compose(
        &mut self,
        layer: Option<&PixelBuffer>,
        viewport: Viewport,
        now: Instant,
    ) -> &mut PixelBuffer {
        let (width, height) = viewport.physical_size();
        self.output.resize(width, height, viewport.scale());
        self.output.fill(self.backdrop);
        if let Some(layer) = layer {
            self.output.composite(layer, self.fade.opacity(now));
        }
        &mut self.output
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    fg: (u8, u8, u8),
    bg: (u8, u8, u8),
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        fg: (255, 255, 255),
        bg: (0, 0, 0),
    };
}

fn term_color((r, g, b): (u8, u8, u8)) -> TermColor {
    TermColor::Rgb { r, g, b }
}

/// Double-buffered cell grid that only writes cells that changed
#[derive(Debug)]
pub struct Presenter {
    cols: u16,
    rows: u16,
    prev: Vec<Cell>,
    next: Vec<Cell>,
    /// Forces a full redraw on the next flush
    invalidated: bool,
}

impl Presenter {
    pub fn new(cols: u16, rows: u16) -> Self {
        let n = cols as usize * rows as usize;
        Presenter {
            cols,
            rows,
            prev: vec![Cell::BLANK; n],
            next: vec![Cell::BLANK; n],
            invalidated: true,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        if self.cols == cols && self.rows == rows {
            return;
        }
        *self = Presenter::new(cols, rows);
    }

    fn idx(&self, col: u16, row: u16) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    /// Maps the buffer onto upper-half-block cells: two vertical pixels per cell,
    /// each averaged over the physical pixels it covers
    pub fn draw_buffer(&mut self, buffer: &PixelBuffer, backdrop: Color) {
        let (cols, rows) = (self.cols as usize, self.rows as usize);
        if cols == 0 || rows == 0 {
            return;
        }
        let (w, h) = (buffer.width(), buffer.height());
        let span = |i: usize, parts: usize, total: usize| {
            let start = i * total / parts;
            let end = ((i + 1) * total / parts).max(start + 1);
            (start, end)
        };
        for row in 0..rows {
            for col in 0..cols {
                let (x0, x1) = span(col, cols, w);
                let (top0, top1) = span(row * 2, rows * 2, h);
                let (bot0, bot1) = span(row * 2 + 1, rows * 2, h);
                let top = average(buffer, x0, x1, top0, top1, backdrop);
                let bottom = average(buffer, x0, x1, bot0, bot1, backdrop);
                let i = self.idx(col as u16, row as u16);
                self.next[i] = Cell {
                    ch: '▀',
                    fg: top,
                    bg: bottom,
                };
            }
        }
    }

    /// Writes text cells starting at `(col, row)`, clipped to the grid
    pub fn draw_text(&mut self, col: u16, row: u16, text: &str, fg: Color, bg: Color) {
        if row >= self.rows {
            return;
        }
        for (offset, ch) in text.chars().enumerate() {
            let x = col as usize + offset;
            if x >= self.cols as usize {
                break;
            }
            let i = self.idx(x as u16, row);
            self.next[i] = Cell {
                ch,
                fg: (fg.r, fg.g, fg.b),
                bg: (bg.r, bg.g, bg.b),
            };
        }
    }

    pub fn flush<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let mut last_fg: Option<(u8, u8, u8)> = None;
        let mut last_bg: Option<(u8, u8, u8)> = None;

        queue!(out, BeginSynchronizedUpdate)?;
        for row in 0..self.rows {
            for col in 0..self.cols {
                let i = self.idx(col, row);
                let cell = self.next[i];
                if !self.invalidated && self.prev[i] == cell {
                    continue;
                }
                queue!(out, cursor::MoveTo(col, row))?;
                if last_bg != Some(cell.bg) {
                    queue!(out, SetBackgroundColor(term_color(cell.bg)))?;
                    last_bg = Some(cell.bg);
                }
                if last_fg != Some(cell.fg) {
                    queue!(out, SetForegroundColor(term_color(cell.fg)))?;
                    last_fg = Some(cell.fg);
                }
                queue!(out, Print(cell.ch))?;
            }
        }
        queue!(out, ResetColor, EndSynchronizedUpdate)?;
        out.flush()?;

        std::mem::swap(&mut self.prev, &mut self.next);
        self.invalidated = false;
        Ok(())
    }

    #[cfg(test)]
    fn cell(&self, col: u16, row: u16) -> Cell {
        self.next[self.idx(col, row)]
    }
}

/// Mean color of the pixel rectangle, each pixel flattened onto `backdrop` first
fn average(
    buffer: &PixelBuffer,
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
    backdrop: Color,
) -> (u8, u8, u8) {
    let (mut r, mut g, mut b, mut n) = (0u32, 0u32, 0u32, 0u32);
    for y in y0..y1 {
        for x in x0..x1 {
            let c = buffer.pixel(x, y).over(backdrop);
            r += c.r as u32;
            g += c.g as u32;
            b += c.b as u32;
            n += 1;
        }
    }
    if n == 0 {
        return (backdrop.r, backdrop.g, backdrop.b);
    }
    ((r / n) as u8, (g / n) as u8, (b / n) as u8)
}

/// Raw-mode alternate-screen session; restores the terminal when dropped
pub struct TerminalSession<W: Write> {
    out: W,
}

impl<W: Write> TerminalSession<W> {
    pub fn enter(mut out: W) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let entered = execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange,
            DisableLineWrap,
            cursor::Hide
        );
        let session = TerminalSession { out };
        // On failure the drop below undoes whatever part of the setup took effect
        entered?;
        Ok(session)
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }
}

impl<W: Write> Drop for TerminalSession<W> {
    fn drop(&mut self) {
        let restored = execute!(
            self.out,
            ResetColor,
            DisableFocusChange,
            DisableMouseCapture,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let raw = terminal::disable_raw_mode();
        if let Err(e) = restored.and(raw) {
            warn!("failed to restore terminal: {}", e);
        }
    }
}
