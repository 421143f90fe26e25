pub mod build;
pub mod dev;
pub mod render;
pub mod serve;
