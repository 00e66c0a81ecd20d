//! Text rendering of view frames.

pub mod terminal;
