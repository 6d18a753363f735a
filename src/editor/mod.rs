//! Program editor: build a command list for a level, then run it in place.

mod input;
mod menubar;
mod panel;
mod preview;
pub mod state;
mod ui;

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::{cursor, event, execute, queue, style, terminal};
use tracing::info;

use crate::config::matches_binding;
use crate::player::Player;
use input::Action;
use state::EditorState;
use ui::Layout;

pub struct Editor {
    state: EditorState,
    fullscreen: bool,
}

impl Editor {
    pub fn open(level_path: &str, program_path: &str) -> Result<Self> {
        let state = EditorState::open(level_path, program_path)?;
        Ok(Editor {
            state,
            fullscreen: false,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();

        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.main_loop(&mut stdout);

        let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();

        result
    }

    fn main_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        self.full_redraw(stdout)?;

        loop {
            let event = event::read()?;
            let action = input::handle_event(&mut self.state, event);

            match action {
                Action::Continue => {}
                Action::Redraw => self.full_redraw(stdout)?,
                Action::Run => {
                    self.run_program(stdout)?;
                    self.full_redraw(stdout)?;
                }
                Action::ToggleFullscreen => {
                    self.fullscreen = !self.fullscreen;
                    if self.fullscreen {
                        stdout.write_all(b"\x1b[10;1t")?;
                    } else {
                        stdout.write_all(b"\x1b[10;0t")?;
                    }
                    stdout.flush()?;
                    self.full_redraw(stdout)?;
                }
                Action::Quit => {
                    if !self.state.dirty {
                        break;
                    }
                    let keys = &self.state.config.key_bindings;
                    self.state.status_message = Some(format!(
                        "Unsaved changes! {} again to quit, {} to save",
                        keys.quit, keys.save
                    ));
                    self.full_redraw(stdout)?;
                    if let event::Event::Key(k) = event::read()? {
                        let keys = &self.state.config.key_bindings;
                        if matches_binding(&keys.quit, &k) {
                            break;
                        }
                        if matches_binding(&keys.save, &k) {
                            match self.state.save() {
                                Ok(()) => {
                                    self.full_redraw(stdout)?;
                                    thread::sleep(Duration::from_secs(2));
                                }
                                Err(e) => {
                                    self.state.status_message = Some(format!("Save failed: {e}"));
                                }
                            }
                        }
                    }
                    self.state.status_message = None;
                    self.full_redraw(stdout)?;
                }
            }
        }

        Ok(())
    }

    /// Hand the terminal to the player until the user leaves the run.
    fn run_program(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        if let Err(e) = self.state.program.check() {
            self.state.status_message = Some(format!("Cannot run: {e}"));
            return Ok(());
        }
        info!(commands = self.state.program.len(), "running program from editor");
        let mut player = Player::new(
            self.state.level.clone(),
            self.state.program.clone(),
            self.state.config.clone(),
        );
        if let Err(e) = player.play_within(stdout) {
            self.state.status_message = Some(format!("Run failed: {e:#}"));
        }
        Ok(())
    }

    fn full_redraw(&self, stdout: &mut io::Stdout) -> Result<()> {
        let (term_w, term_h) = terminal::size()?;
        let layout = Layout::compute(term_w, term_h, &self.state.mode);

        execute!(stdout, terminal::Clear(terminal::ClearType::All))?;

        menubar::render_menubar(stdout, &layout, &self.state)?;
        preview::render_board(stdout, &layout, &self.state)?;
        panel::render_program_panel(stdout, &layout, &self.state)?;
        self.render_status(stdout, &layout)?;

        stdout.flush()?;
        Ok(())
    }

    fn render_status(&self, stdout: &mut io::Stdout, layout: &Layout) -> Result<()> {
        let text = match &self.state.status_message {
            Some(message) => message.clone(),
            None => {
                let marker = if self.state.dirty { " [modified]" } else { "" };
                format!(
                    "{}{marker}  ·  {}",
                    self.state.program_path.display(),
                    self.state.budget_summary()
                )
            }
        };
        let text: String = text.chars().take(layout.term_width as usize).collect();
        queue!(
            stdout,
            cursor::MoveTo(0, layout.status_y),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::SetAttribute(style::Attribute::Dim),
            style::Print(format!(" {text}")),
            style::SetAttribute(style::Attribute::Reset),
        )?;
        Ok(())
    }
}
