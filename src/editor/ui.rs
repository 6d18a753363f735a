use super::state::Mode;

/// Width (in columns) of the program panel on the right.
pub const PROGRAM_PANEL_WIDTH: u16 = 28;

pub struct Layout {
    pub board_x: u16,
    pub board_y: u16,
    pub board_width: u16,
    pub board_height: u16,
    pub panel_x: u16,
    pub panel_width: u16,
    pub status_y: u16,
    pub term_width: u16,
    pub menu_h: u16,
}

impl Layout {
    pub fn compute(term_width: u16, term_height: u16, mode: &Mode) -> Self {
        // The repeat-count prompt lists digits and needs a second hint line.
        let menu_h: u16 = match mode {
            Mode::RepeatCount { .. } => 2,
            _ => 1,
        };
        let status_h: u16 = 1;
        let panel_width = PROGRAM_PANEL_WIDTH.min(term_width);
        let board_width = term_width.saturating_sub(panel_width);
        Layout {
            board_x: 1,
            board_y: menu_h + 1,
            board_width: board_width.saturating_sub(1),
            board_height: term_height.saturating_sub(menu_h + status_h + 1),
            panel_x: board_width,
            panel_width,
            status_y: term_height.saturating_sub(status_h),
            term_width,
            menu_h,
        }
    }

    pub fn panel_height(&self) -> u16 {
        self.status_y.saturating_sub(self.menu_h)
    }
}
