// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Renders the depth and RGB front buffers side by side using Unicode
//! half-block characters, with a status bar, the console log and the command
//! line below them.

use std::io::{self, stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use tracing::{debug, info, warn};

use crate::app::{ConsoleApp, FrameStatus, Key};
use crate::constants::IDLE_POLL_INTERVAL;
use crate::errors::{AppError, AppResult};
use crate::frames::{FrameLayout, StreamKind};

/// Run the terminal console until the user quits
pub fn run(app: &mut ConsoleApp) -> AppResult<()> {
    enable_raw_mode().map_err(terminal_error)?;
    let mut terminal = restore_on_error(enter_terminal, restore_terminal)?;

    let result = run_app(&mut terminal, app);

    app.shutdown();

    disable_raw_mode().map_err(terminal_error)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(terminal_error)?;
    terminal.show_cursor().map_err(terminal_error)?;

    result
}

fn terminal_error(e: impl std::fmt::Display) -> AppError {
    AppError::Terminal(e.to_string())
}

fn enter_terminal() -> AppResult<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(terminal_error)?;
    Terminal::new(CrosstermBackend::new(stdout)).map_err(terminal_error)
}

/// Best-effort undo of raw mode and the alternate screen
fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        warn!(error = %e, "Failed to disable raw mode");
    }
    if let Err(e) = execute!(stdout(), LeaveAlternateScreen) {
        warn!(error = %e, "Failed to leave alternate screen");
    }
}

/// Run `setup`, calling `restore` before a setup error is returned
fn restore_on_error<T>(
    setup: impl FnOnce() -> AppResult<T>,
    restore: impl FnOnce(),
) -> AppResult<T> {
    setup().inspect_err(|_| restore())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ConsoleApp,
) -> AppResult<()> {
    info!(driver = app.driver_name(), "Terminal console started");

    loop {
        let status = app.refresh_frames();
        if status == FrameStatus::Closed {
            debug!("Frame exchange closed, leaving terminal loop");
            break;
        }

        terminal
            .draw(|f| draw_console(f.area(), f.buffer_mut(), app))
            .map_err(terminal_error)?;

        // Frame waits already pace the loop while streams run
        let mut wait = match status {
            FrameStatus::Idle => IDLE_POLL_INTERVAL,
            _ => Duration::ZERO,
        };
        while event::poll(wait).map_err(terminal_error)? {
            if let Event::Key(key) = event::read().map_err(terminal_error)?
                && let Some(key) = map_key(key)
            {
                app.handle_key(key);
            }
            wait = Duration::ZERO;
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

/// Translate a crossterm key press into a console key
///
/// Ctrl+C quits like Escape.
fn map_key(key: KeyEvent) -> Option<Key> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Escape),
        KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => None,
        KeyCode::Char(ch) => Some(Key::Char(ch)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Esc => Some(Key::Escape),
        _ => None,
    }
}

/// Screen areas, top to bottom: frames, status bar, console log, input line
struct ScreenLayout {
    depth: Rect,
    color: Rect,
    status: Rect,
    console: Rect,
    input: Rect,
}

impl ScreenLayout {
    fn split(area: Rect, console_rows: u16) -> Self {
        let console_rows = console_rows.min(area.height.saturating_sub(2) / 2);
        let frames_height = area.height.saturating_sub(console_rows + 2);
        let half = area.width / 2;
        let row = |offset: u16, height: u16| Rect {
            x: area.x,
            y: area.y + offset,
            width: area.width,
            height,
        };

        Self {
            depth: Rect {
                x: area.x,
                y: area.y,
                width: half,
                height: frames_height,
            },
            color: Rect {
                x: area.x + half,
                y: area.y,
                width: area.width - half,
                height: frames_height,
            },
            status: row(frames_height, 1u16.min(area.height)),
            console: row(frames_height + 1, console_rows),
            input: row(
                area.height.saturating_sub(1),
                1u16.min(area.height.saturating_sub(frames_height + 1)),
            ),
        }
    }
}

fn draw_console(area: Rect, buf: &mut Buffer, app: &ConsoleApp) {
    let lines = app.console().snapshot();
    let layout = ScreenLayout::split(area, lines.len().min(u16::MAX as usize) as u16);
    let enabled = app.enabled_streams();

    for (stream, rect) in [
        (StreamKind::Depth, layout.depth),
        (StreamKind::Color, layout.color),
    ] {
        FrameWidget {
            stream,
            rgb: app.front(stream),
            layout: app.layout(stream),
            active: enabled.contains(stream),
        }
        .render(rect, buf);
    }

    let device = app.device();
    let on_off = |stream| if enabled.contains(stream) { "on" } else { "off" };
    let led = device
        .led
        .map(|mode| mode.to_string())
        .unwrap_or_else(|| "-".to_string());
    let message = format!(
        " {} | {} | DEPTH {} | RGB {} | LED {} | Angle {}",
        app.driver_name(),
        if device.open { "open" } else { "closed" },
        on_off(StreamKind::Depth),
        on_off(StreamKind::Color),
        led,
        device.angle
    );
    StatusBar { message: &message }.render(layout.status, buf);

    let visible = layout.console.height as usize;
    let first = lines.len().saturating_sub(visible);
    for (row, line) in lines[first..].iter().enumerate() {
        let y = layout.console.y + row as u16;
        buf.set_string(
            layout.console.x,
            y,
            clip(line, layout.console.width),
            Style::default(),
        );
    }

    if layout.input.height > 0 {
        let prompt = format!("> {}", app.command_text());
        buf.set_string(
            layout.input.x,
            layout.input.y,
            clip(&prompt, layout.input.width),
            Style::default().fg(Color::Yellow),
        );
    }
}

/// Longest prefix of `text` that fits in `width` cells
fn clip(text: &str, width: u16) -> &str {
    match text.char_indices().nth(width as usize) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Widget that renders one RGB24 front buffer using half-block characters
struct FrameWidget<'a> {
    stream: StreamKind,
    rgb: &'a [u8],
    layout: FrameLayout,
    active: bool,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        if !self.active || self.layout.width == 0 || self.layout.height == 0 {
            let msg = format!("{} feed off", self.stream);
            let msg = clip(&msg, area.width);
            let x = area.x + (area.width.saturating_sub(msg.chars().count() as u16)) / 2;
            let y = area.y + area.height / 2;
            buf.set_string(x, y, msg, Style::default());
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = self.layout.width as f64 / self.layout.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height as f64) * 2.0;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = self.layout.width as f64 / display_width as f64;
        let y_scale = self.layout.height as f64 / (display_height as f64 * 2.0);

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as usize;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as usize;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as usize;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(self.rgb, self.layout, src_x, src_y_top));
                    cell.set_bg(sample_pixel(self.rgb, self.layout, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(rgb: &[u8], layout: FrameLayout, x: usize, y: usize) -> Color {
    let x = x.min(layout.width - 1);
    let y = y.min(layout.height - 1);
    let idx = y * layout.stride() + x * layout.bytes_per_pixel;
    match rgb.get(idx..idx + 3) {
        Some(&[r, g, b]) => Color::Rgb(r, g, b),
        _ => Color::Black,
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_string(
            area.x,
            area.y,
            clip(self.message, area.width),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
