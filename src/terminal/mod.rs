pub mod cell;
pub mod color;
pub mod cursor;
pub mod dual;
pub mod engine;
pub mod grid;
pub mod modes;
pub mod scrollback;

pub use cell::{AttrFlags, Attributes, Cell, CellFlags, Protection, UnderlineStyle};
pub use color::Color;
pub use cursor::{CursorShape, CursorState};
pub use dual::DualScreen;
pub use engine::{RpcHandler, RpcRequest, TerminalEngine};
pub use grid::{Line, ScreenBuffer};
pub use modes::TerminalModes;
pub use scrollback::{ScrollbackLine, ScrollbackStore, ViewportRow};
