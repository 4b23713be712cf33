pub mod dispatch;
pub mod play;
pub mod render;
