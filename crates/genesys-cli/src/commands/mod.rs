pub mod config;
pub mod models;
pub mod regs;
pub mod run;
pub mod session;
