pub mod cards;
pub mod footer;
pub mod header;
pub mod log_overlay;
pub mod render;
pub mod spinner;
