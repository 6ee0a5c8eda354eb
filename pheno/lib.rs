#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod annotate;
pub mod classify;
pub mod config;
pub mod io;
pub mod pipeline;
pub mod translate;
pub mod types;
