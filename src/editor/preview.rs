//! Static board preview: the level as the program will first see it.

use std::io;

use crossterm::{cursor, queue, style};

use crate::engine::RunState;
use crate::player::to_content_style;
use crate::renderer::{Board, Renderer};

use super::state::EditorState;
use super::ui::Layout;

pub fn render_board(
    stdout: &mut io::Stdout,
    layout: &Layout,
    state: &EditorState,
) -> anyhow::Result<()> {
    let board = Board::new(&RunState::new(&state.level));
    let grid = Renderer::rasterize(&board);

    for (y, row) in grid.iter().enumerate().take(layout.board_height as usize) {
        queue!(stdout, cursor::MoveTo(layout.board_x, layout.board_y + y as u16))?;
        for cell in row.iter().take(layout.board_width as usize) {
            queue!(
                stdout,
                style::PrintStyledContent(style::StyledContent::new(
                    to_content_style(&cell.style),
                    cell.ch,
                )),
            )?;
        }
    }

    let info_y = layout.board_y + grid.len() as u16 + 1;
    if info_y < layout.board_y + layout.board_height {
        let name = state.level.name.as_deref().unwrap_or("untitled level");
        queue!(
            stdout,
            cursor::MoveTo(layout.board_x, info_y),
            style::SetAttribute(style::Attribute::Dim),
            style::Print(format!("{name}  ·  {} dots", state.level.coin_count())),
            style::SetAttribute(style::Attribute::Reset),
        )?;
    }
    Ok(())
}
