pub mod animation;
pub mod app;
pub mod cache;
pub mod capability;
pub mod compositor;
pub mod config;
pub mod controller;
pub mod frame_clock;
pub mod particle;
pub mod projector;
pub mod render;
pub mod starfield;
pub mod surface;
pub mod terminal;
