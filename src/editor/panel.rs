use std::io;

use crossterm::{cursor, queue, style};

use crate::engine::Command;
use crate::engine::program::Step;

use super::state::{EditorState, Mode};
use super::ui::Layout;

/// Indented listing of the program, one entry per command.
pub fn program_lines(steps: &[Step]) -> Vec<String> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            // Closers line up with their opener.
            let depth = match step.command {
                Command::LoopEnd => step.depth.saturating_sub(1),
                _ => step.depth,
            };
            let indent = "  ".repeat(depth);
            format!("{:>3} {indent}{}", i + 1, step.command.label())
        })
        .collect()
}

/// First visible row so that `cursor` stays on screen.
fn scroll_offset(cursor: usize, visible: usize) -> usize {
    if visible == 0 {
        return 0;
    }
    cursor.saturating_sub(visible - 1)
}

pub fn render_program_panel(
    stdout: &mut io::Stdout,
    layout: &Layout,
    state: &EditorState,
) -> anyhow::Result<()> {
    let px = layout.panel_x;
    let pw = layout.panel_width;
    let top = layout.menu_h;
    let height = layout.panel_height();
    if pw < 4 || height < 3 {
        return Ok(());
    }
    let max_width = (pw - 3) as usize;

    let title = match &state.mode {
        Mode::Confirm { .. } => "Confirm",
        Mode::RepeatCount { .. } => "Repeat",
        Mode::Normal => "Program",
    };
    for y in 0..height {
        queue!(stdout, cursor::MoveTo(px, top + y), style::Print("\u{2502}"))?;
    }
    queue!(
        stdout,
        cursor::MoveTo(px + 2, top),
        style::SetAttribute(style::Attribute::Bold),
        style::Print(title),
        style::SetAttribute(style::Attribute::Reset),
    )?;
    queue!(stdout, cursor::MoveTo(px, top + 1), style::Print("\u{253c}"))?;
    for _ in 1..pw {
        queue!(stdout, style::Print("\u{2500}"))?;
    }

    let body_y = top + 2;
    let rows = (height - 2) as usize;

    match &state.mode {
        Mode::Confirm {
            message, selected, ..
        } => {
            let msg: String = message.chars().take(max_width).collect();
            queue!(
                stdout,
                cursor::MoveTo(px + 2, body_y),
                style::SetAttribute(style::Attribute::Dim),
                style::Print(msg),
                style::SetAttribute(style::Attribute::Reset),
            )?;
            for (i, label) in ["Yes", "No"].iter().enumerate().take(rows.saturating_sub(1)) {
                print_row(stdout, px + 2, body_y + 1 + i as u16, label, max_width, i == *selected)?;
            }
        }
        Mode::RepeatCount { buf } => {
            let text = format!("Repeat {buf}\u{2588} times");
            print_row(stdout, px + 2, body_y, &text, max_width, false)?;
        }
        Mode::Normal => {
            if state.program.is_empty() {
                queue!(
                    stdout,
                    cursor::MoveTo(px + 2, body_y),
                    style::SetAttribute(style::Attribute::Dim),
                    style::Print("(empty)"),
                    style::SetAttribute(style::Attribute::Reset),
                )?;
                return Ok(());
            }
            let lines = program_lines(state.program.steps());
            let first = scroll_offset(state.cursor, rows);
            for (row, (i, line)) in lines.iter().enumerate().skip(first).take(rows).enumerate() {
                print_row(stdout, px + 2, body_y + row as u16, line, max_width, i == state.cursor)?;
            }
        }
    }
    Ok(())
}

fn print_row(
    stdout: &mut io::Stdout,
    x: u16,
    y: u16,
    text: &str,
    max_width: usize,
    selected: bool,
) -> anyhow::Result<()> {
    let text: String = text.chars().take(max_width).collect();
    queue!(stdout, cursor::MoveTo(x, y))?;
    if selected {
        queue!(
            stdout,
            style::SetAttribute(style::Attribute::Reverse),
            style::Print(format!("{:<width$}", text, width = max_width)),
            style::SetAttribute(style::Attribute::Reset),
        )?;
    } else {
        queue!(stdout, style::Print(format!("{:<width$}", text, width = max_width)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Program;

    #[test]
    fn listing_indents_loop_bodies() {
        let program = Program::from(vec![
            Command::LoopStart(2),
            Command::Advance,
            Command::LoopEnd,
            Command::Jump,
        ]);
        assert_eq!(
            program_lines(program.steps()),
            vec![
                "  1 Repeat 2x",
                "  2   Advance",
                "  3 End repeat",
                "  4 Jump",
            ]
        );
    }

    #[test]
    fn scrolling_keeps_cursor_on_last_row() {
        assert_eq!(scroll_offset(3, 10), 0);
        assert_eq!(scroll_offset(12, 10), 3);
        assert_eq!(scroll_offset(5, 0), 0);
    }
}
