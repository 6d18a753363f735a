use std::io;

use crossterm::{cursor, queue, style, terminal};

use crate::menubar::print_menu_item;

use super::state::{EditorState, Mode};
use super::ui::Layout;

fn mode_items(state: &EditorState) -> Vec<String> {
    let keys = &state.config.key_bindings;
    match &state.mode {
        Mode::Normal => vec![
            format!("[{}] advance", keys.insert_advance),
            format!("[{}][{}] turn", keys.insert_turn_left, keys.insert_turn_right),
            format!("[{}] u-turn", keys.insert_u_turn),
            format!("[{}] jump", keys.insert_jump),
            format!("[{}][{}] loop", keys.insert_loop, keys.insert_loop_end),
            format!("[{}] del", keys.delete),
            format!("[{}] clear", keys.clear),
            format!("[{}] run", keys.run),
            format!("[{}] save", keys.save),
            format!("[{}] quit", keys.quit),
            "[F11] full".into(),
        ],
        Mode::RepeatCount { .. } => vec![
            "[0-9] count".into(),
            "[Backspace] fix".into(),
            format!("[{}] add loop", keys.confirm),
            format!("[{}] cancel", keys.cancel),
        ],
        Mode::Confirm { .. } => vec![
            "[↑][↓] select".into(),
            "[Enter] confirm".into(),
            format!("[{}] cancel", keys.cancel),
        ],
    }
}

pub fn render_menubar(
    stdout: &mut io::Stdout,
    layout: &Layout,
    state: &EditorState,
) -> anyhow::Result<()> {
    let items = mode_items(state);

    let mut line: u16 = 0;
    let mut x: u16 = 1; // leading space

    queue!(
        stdout,
        cursor::MoveTo(0, 0),
        terminal::Clear(terminal::ClearType::CurrentLine),
        style::Print(" "),
    )?;

    for (i, item) in items.iter().enumerate() {
        let item_w = item.chars().count() as u16;

        if i > 0 {
            if x + 2 + item_w > layout.term_width {
                if line + 1 < layout.menu_h {
                    line += 1;
                    x = 1;
                    queue!(
                        stdout,
                        cursor::MoveTo(0, line),
                        terminal::Clear(terminal::ClearType::CurrentLine),
                        style::Print(" "),
                    )?;
                } else {
                    break;
                }
            } else {
                queue!(stdout, style::Print("  "))?;
                x += 2;
            }
        }

        if x + item_w > layout.term_width {
            break;
        }

        print_menu_item(stdout, item)?;
        x += item_w;
    }

    for l in line + 1..layout.menu_h {
        queue!(
            stdout,
            cursor::MoveTo(0, l),
            terminal::Clear(terminal::ClearType::CurrentLine),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Program;
    use crate::engine::source::LevelSource;

    #[test]
    fn hints_follow_configured_bindings() {
        let mut config = Config::default();
        config.key_bindings.insert_jump = "J".into();
        let level = LevelSource::from_rows(&[">."]).build().unwrap();
        let state = EditorState::new(level, Program::new(), "unused.json".into(), config);
        assert!(mode_items(&state).contains(&"[J] jump".to_string()));
    }
}
