//! Platform glue: window creation and configuration.

pub mod window;
