pub mod algorithm;
pub mod app;
pub mod config;
pub mod io;
