//! Player — the terminal run driver.
//!
//! Runs a program against a level and animates the run from its event stream.
//! The player does not interpret puzzle rules; it only mirrors what the engine
//! reports, and may ask the run to stop between commands.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use crossterm::{cursor, event, execute, queue, style, terminal};
use tracing::debug;

use crate::config::{Config, KeyBindings, matches_binding};
use crate::engine::{CancelToken, Level, Program, Run};
use crate::menubar::print_menu_item;
use crate::renderer::{Board, Renderer};
use crate::types::{Cell, Color, EventSink, Outcome, RunEvent, Style};

/// Rows reserved above the board for the menu bar.
const CANVAS_OFFSET: u16 = 1;

pub struct Player {
    level: Level,
    program: Program,
    config: Config,
    fullscreen: bool,
}

impl Player {
    pub fn new(level: Level, program: Program, config: Config) -> Self {
        Self {
            level,
            program,
            config,
            fullscreen: false,
        }
    }

    /// Play the program in the terminal.
    ///
    /// Sets up the terminal, enters the event loop, and restores the terminal
    /// on exit (even on error).
    pub fn play(&mut self) -> Result<()> {
        self.check_terminal_size()?;

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut stdout);

        // Always restore terminal state.
        let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();

        result
    }

    /// Play inside a terminal session someone else already set up.
    pub fn play_within(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        self.check_terminal_size()?;
        execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
        self.run_loop(stdout)
    }

    fn check_terminal_size(&self) -> Result<()> {
        let (term_w, term_h) = terminal::size()?;
        let need_w = self.level.cells().width() as u16;
        let need_h = self.level.cells().height() as u16;
        // +3: menu bar, event line, status line
        if term_w < need_w || term_h < need_h + 3 {
            bail!(
                "Terminal too small: need {}x{}, have {}x{}",
                need_w,
                need_h + 3,
                term_w,
                term_h,
            );
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        let mut run = Run::new(&self.level);
        self.render_menubar(stdout)?;
        let mut board = self.execute(&mut run, stdout)?;

        loop {
            match event::read()? {
                event::Event::Key(key) => {
                    let keys = &self.config.key_bindings;
                    if matches_binding(&keys.quit, &key) || matches_binding(&keys.cancel, &key) {
                        break;
                    } else if matches_binding(&keys.replay, &key) {
                        run.restore();
                        board = self.execute(&mut run, stdout)?;
                    } else if key.code == event::KeyCode::F(11) {
                        self.fullscreen = !self.fullscreen;
                        if self.fullscreen {
                            stdout.write_all(b"\x1b[10;1t")?;
                        } else {
                            stdout.write_all(b"\x1b[10;0t")?;
                        }
                        stdout.flush()?;
                    }
                }
                event::Event::Resize(_, _) => {
                    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
                    self.render_menubar(stdout)?;
                    render_board(stdout, &board)?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Run the program once, animating each event. Returns the final board.
    fn execute(&self, run: &mut Run, stdout: &mut io::Stdout) -> Result<Board> {
        let board = Board::new(run.state());
        render_board(stdout, &board)?;
        self.render_status(stdout, "Running...  [Esc] stop")?;

        let mut sink = AnimatedSink {
            stdout: &mut *stdout,
            board,
            event_row: self.event_row(),
            delay: self.config.player.step_delay(),
            cancel: run.cancel_token(),
            keys: &self.config.key_bindings,
            error: None,
        };
        let result = run.execute(&self.program, &mut sink);
        let AnimatedSink { board, error, .. } = sink;
        if let Some(e) = error {
            return Err(e);
        }

        let status = match result {
            Ok(Outcome::Success) => "Solved!  [r] replay  [q] quit".to_string(),
            Ok(outcome) => format!("{outcome}  [r] replay  [q] quit"),
            Err(e) => format!("Program error: {e}  [q] quit"),
        };
        debug!(%status, "run complete");
        self.render_status(stdout, &status)?;
        Ok(board)
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn event_row(&self) -> u16 {
        self.level.cells().height() as u16 + CANVAS_OFFSET
    }

    fn render_menubar(&self, stdout: &mut io::Stdout) -> Result<()> {
        let keys = &self.config.key_bindings;
        let items = [
            format!("[{}] stop", keys.stop),
            format!("[{}] replay", keys.replay),
            format!("[{}] quit", keys.quit),
            "[F11] full".to_string(),
        ];

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::Print(" "),
        )?;
        if let Some(name) = &self.level.name {
            queue!(stdout, style::Print(format!("{name}  ")))?;
        }
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                queue!(stdout, style::Print("  "))?;
            }
            print_menu_item(stdout, item)?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn render_status(&self, stdout: &mut io::Stdout, status: &str) -> Result<()> {
        let status_y = self.event_row() + 1;
        let (_, term_h) = terminal::size()?;
        if status_y >= term_h {
            return Ok(()); // No room for status bar.
        }

        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Bold);

        queue!(
            stdout,
            cursor::MoveTo(0, status_y),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(style::StyledContent::new(cs, format!(" {status}"))),
        )?;
        stdout.flush()?;
        Ok(())
    }
}

/// Event sink that redraws the board after every event and waits out the
/// step delay, watching the keyboard for a stop request.
struct AnimatedSink<'a> {
    stdout: &'a mut io::Stdout,
    board: Board,
    event_row: u16,
    delay: Duration,
    cancel: CancelToken,
    keys: &'a KeyBindings,
    error: Option<anyhow::Error>,
}

impl AnimatedSink<'_> {
    fn show(&mut self, event: &RunEvent) -> Result<()> {
        render_board(self.stdout, &self.board)?;

        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Dim);
        queue!(
            self.stdout,
            cursor::MoveTo(0, self.event_row),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(style::StyledContent::new(cs, format!(" {event}"))),
        )?;
        self.stdout.flush()?;

        let deadline = Instant::now() + self.delay;
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            if !event::poll(left)? {
                break;
            }
            if let event::Event::Key(key) = event::read()? {
                if is_stop_request(self.keys, &key) {
                    self.cancel.cancel();
                }
            }
        }
        Ok(())
    }
}

/// Keys that stop a run mid-animation: the stop binding, or quit.
fn is_stop_request(keys: &KeyBindings, key: &event::KeyEvent) -> bool {
    matches_binding(&keys.stop, key) || matches_binding(&keys.quit, key)
}

impl EventSink for AnimatedSink<'_> {
    fn emit(&mut self, event: &RunEvent) {
        if self.error.is_some() {
            return;
        }
        self.board.apply(event);
        if let Err(e) = self.show(event) {
            // Stop the run; the error is reported once it unwinds.
            self.cancel.cancel();
            self.error = Some(e);
        }
    }
}

fn render_board(stdout: &mut io::Stdout, board: &Board) -> Result<()> {
    let grid = Renderer::rasterize(board);
    for (y, row) in grid.iter().enumerate() {
        queue!(stdout, cursor::MoveTo(0, y as u16 + CANVAS_OFFSET))?;
        for cell in row {
            queue!(stdout, style::PrintStyledContent(styled(cell)))?;
        }
    }
    stdout.flush()?;
    Ok(())
}

fn styled(cell: &Cell) -> style::StyledContent<char> {
    style::StyledContent::new(to_content_style(&cell.style), cell.ch)
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if let Some(bg) = s.bg {
        cs.background_color = Some(to_ct_color(bg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: Color) -> style::Color {
    match c {
        Color::Red => style::Color::Red,
        Color::Green => style::Color::Green,
        Color::Yellow => style::Color::Yellow,
        Color::Blue => style::Color::Blue,
        Color::Magenta => style::Color::Magenta,
        Color::Cyan => style::Color::Cyan,
        Color::White => style::Color::White,
        Color::Rgb { r, g, b } => style::Color::Rgb { r, g, b },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn configured_quit_key_stops_a_run() {
        let mut keys = KeyBindings::default();
        keys.quit = "x".into();
        assert!(is_stop_request(&keys, &key(KeyCode::Char('x'))));
        assert!(is_stop_request(&keys, &key(KeyCode::Esc)));
        assert!(!is_stop_request(&keys, &key(KeyCode::Char('q'))));
    }
}
