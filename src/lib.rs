pub mod app;
pub mod config;
pub mod cover;
pub mod duration;
pub mod export;
pub mod song;
pub mod state;
pub mod theme;
pub mod widgets;
