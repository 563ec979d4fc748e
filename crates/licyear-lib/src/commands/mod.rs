pub mod app;
pub mod refresh;
