//! Model listing functionality
//!
//! Prints the models a visitor can pick in the sidebar.

use crate::core::config::Config;
use crate::core::models::ModelRegistry;

pub fn print_models(registry: &ModelRegistry, config: &Config) {
    let source = if config.models.is_empty() {
        "built-in"
    } else {
        "configured"
    };
    println!("Available models ({source}):");
    let default_name = &registry.default_model().name;
    for entry in registry.entries() {
        let marker = if &entry.name == default_name { "*" } else { " " };
        println!("{marker} {}  ->  {}", entry.name, entry.id);
    }
    println!();
    println!("* default for new sessions");
}
