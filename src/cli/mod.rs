pub mod app;
pub mod capture;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod fixture;
pub mod label;
pub mod output;
pub mod replay;
pub mod runtime;

pub use app::run;
