use crossterm::event::{Event, KeyCode, KeyEvent};

use super::state::{ConfirmAction, EditorState, Mode};
use crate::config::matches_binding;
use crate::engine::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Continue,
    Redraw,
    Run,
    Quit,
    ToggleFullscreen,
}

pub fn handle_event(state: &mut EditorState, event: Event) -> Action {
    match event {
        Event::Key(key) => handle_key(state, key),
        Event::Resize(_, _) => Action::Redraw,
        _ => Action::Continue,
    }
}

fn handle_key(state: &mut EditorState, key: KeyEvent) -> Action {
    if key.code == KeyCode::F(11) {
        return Action::ToggleFullscreen;
    }

    match &state.mode {
        Mode::Normal => handle_normal(state, key),
        Mode::RepeatCount { .. } => handle_repeat_count(state, key),
        Mode::Confirm { .. } => handle_confirm(state, key),
    }
}

fn handle_normal(state: &mut EditorState, key: KeyEvent) -> Action {
    let bindings = &state.config.key_bindings;

    if matches_binding(&bindings.quit, &key) {
        return Action::Quit;
    }
    if matches_binding(&bindings.run, &key) {
        return Action::Run;
    }
    if matches_binding(&bindings.move_up, &key) {
        state.move_cursor(-1);
        return Action::Redraw;
    }
    if matches_binding(&bindings.move_down, &key) {
        state.move_cursor(1);
        return Action::Redraw;
    }
    if matches_binding(&bindings.save, &key) {
        if let Err(e) = state.save() {
            state.status_message = Some(format!("Save failed: {e}"));
        }
        return Action::Redraw;
    }
    if matches_binding(&bindings.delete, &key) {
        if state.delete_selected().is_some() {
            state.status_message = None;
        }
        return Action::Redraw;
    }
    if matches_binding(&bindings.clear, &key) {
        if !state.program.is_empty() {
            state.mode = Mode::Confirm {
                message: format!("Clear all {} commands?", state.program.len()),
                selected: 1,
                action: ConfirmAction::ClearProgram,
            };
        }
        return Action::Redraw;
    }
    if matches_binding(&bindings.insert_loop, &key) {
        state.mode = Mode::RepeatCount { buf: String::new() };
        state.status_message = None;
        return Action::Redraw;
    }

    let command = [
        (&bindings.insert_advance, Command::Advance),
        (&bindings.insert_turn_left, Command::TurnLeft),
        (&bindings.insert_turn_right, Command::TurnRight),
        (&bindings.insert_u_turn, Command::UTurn),
        (&bindings.insert_jump, Command::Jump),
        (&bindings.insert_loop_end, Command::LoopEnd),
    ]
    .into_iter()
    .find(|(binding, _)| matches_binding(binding, &key))
    .map(|(_, command)| command);

    match command {
        Some(command) => {
            state.insert(command);
            Action::Redraw
        }
        None => Action::Continue,
    }
}

fn handle_repeat_count(state: &mut EditorState, key: KeyEvent) -> Action {
    let confirm = matches_binding(&state.config.key_bindings.confirm, &key);
    let cancel = matches_binding(&state.config.key_bindings.cancel, &key);
    let Mode::RepeatCount { buf } = &mut state.mode else {
        return Action::Continue;
    };

    if cancel {
        state.mode = Mode::Normal;
        return Action::Redraw;
    }
    if confirm {
        match buf.parse::<u32>() {
            Ok(count) => {
                state.mode = Mode::Normal;
                state.insert_loop(count);
            }
            Err(_) => state.status_message = Some("Enter a repeat count".into()),
        }
        return Action::Redraw;
    }

    match key.code {
        KeyCode::Char(c) if c.is_ascii_digit() && buf.len() < 4 => buf.push(c),
        KeyCode::Backspace => {
            buf.pop();
        }
        _ => return Action::Continue,
    }
    Action::Redraw
}

fn handle_confirm(state: &mut EditorState, key: KeyEvent) -> Action {
    let (selected, action) = match &state.mode {
        Mode::Confirm {
            selected, action, ..
        } => (*selected, action.clone()),
        _ => return Action::Continue,
    };

    if matches_binding(&state.config.key_bindings.cancel, &key) {
        state.mode = Mode::Normal;
        return Action::Redraw;
    }

    match key.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            if let Mode::Confirm { selected: sel, .. } = &mut state.mode {
                *sel = 1 - selected;
            }
            Action::Redraw
        }
        KeyCode::Enter => {
            if selected == 0 {
                match action {
                    ConfirmAction::ClearProgram => {
                        state.clear();
                        state.status_message = Some("Program cleared".into());
                    }
                }
            }
            state.mode = Mode::Normal;
            Action::Redraw
        }
        _ => Action::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Program;
    use crate::engine::source::LevelSource;
    use crossterm::event::KeyModifiers;

    fn state() -> EditorState {
        let level = LevelSource::from_rows(&[">..o"]).build().unwrap();
        EditorState::new(level, Program::new(), "unused.json".into(), Config::default())
    }

    fn press(state: &mut EditorState, code: KeyCode) -> Action {
        handle_event(state, Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[test]
    fn letter_keys_insert_commands() {
        let mut s = state();
        press(&mut s, KeyCode::Char('f'));
        press(&mut s, KeyCode::Char('j'));
        press(&mut s, KeyCode::Char('u'));
        let commands: Vec<_> = s.program.commands().collect();
        assert_eq!(commands, vec![Command::Advance, Command::Jump, Command::UTurn]);
    }

    #[test]
    fn loop_key_prompts_for_a_count() {
        let mut s = state();
        press(&mut s, KeyCode::Char('['));
        assert_eq!(s.mode, Mode::RepeatCount { buf: String::new() });
        press(&mut s, KeyCode::Char('1'));
        press(&mut s, KeyCode::Char('2'));
        press(&mut s, KeyCode::Backspace);
        press(&mut s, KeyCode::Char('3'));
        press(&mut s, KeyCode::Enter);
        assert_eq!(s.mode, Mode::Normal);
        let commands: Vec<_> = s.program.commands().collect();
        assert_eq!(commands, vec![Command::LoopStart(13), Command::LoopEnd]);
    }

    #[test]
    fn clear_needs_confirmation() {
        let mut s = state();
        press(&mut s, KeyCode::Char('f'));
        let ctrl_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        handle_event(&mut s, Event::Key(ctrl_x));
        assert!(matches!(s.mode, Mode::Confirm { selected: 1, .. }));

        // Enter on "No" keeps the program.
        press(&mut s, KeyCode::Enter);
        assert_eq!(s.program.len(), 1);

        handle_event(&mut s, Event::Key(ctrl_x));
        press(&mut s, KeyCode::Tab);
        press(&mut s, KeyCode::Enter);
        assert!(s.program.is_empty());
        assert_eq!(s.mode, Mode::Normal);
    }

    #[test]
    fn run_and_quit_are_reported() {
        let mut s = state();
        assert_eq!(press(&mut s, KeyCode::F(5)), Action::Run);
        assert_eq!(press(&mut s, KeyCode::Char('q')), Action::Quit);
    }
}
