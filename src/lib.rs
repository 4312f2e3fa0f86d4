pub mod assemble;
pub mod config;
pub mod error;
pub mod events;
pub mod mask;
pub mod pdf;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod validate;
