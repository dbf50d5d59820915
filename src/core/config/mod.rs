pub mod data;
pub mod defaults;
pub mod io;
pub mod printing;


pub use data::{Config, ModelEntry};
pub use io::ConfigError;
