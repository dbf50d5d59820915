use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  bind: {}", self.bind());
        println!("  hub-url: {}", self.hub_url());
        println!("  inference-url: {}", self.inference_url());
        println!("  max-tokens: {}", self.max_tokens());
        println!("  log-level: {}", self.log_level());
        println!(
            "  session-idle-secs: {}",
            self.session_idle_timeout().as_secs()
        );
        println!("  system-prompt: {}", self.system_prompt());
        match &self.default_model {
            Some(model) => println!("  default-model: {model}"),
            None => println!("  default-model: (first listed)"),
        }
        if self.models.is_empty() {
            println!("  models: (built-in list)");
        } else {
            println!("  models:");
            for entry in &self.models {
                println!("    {}: {}", entry.name, entry.id);
            }
        }
    }
}
