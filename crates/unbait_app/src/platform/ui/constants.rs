// Terminal cell metrics mapped to page pixels.
pub const CHAR_WIDTH: i32 = 8;
pub const LINE_HEIGHT: i32 = 18;
pub const POPUP_PADDING: i32 = 10;
pub const WRAP_COLUMNS: usize = 48;
pub const SPINNER: &str = "~";

pub const BOLD_ON: &str = "\x1b[1m";
pub const BOLD_OFF: &str = "\x1b[0m";
