use std::path::Path;

use super::Overrides;

pub fn run(config_path: Option<&Path>) {
    let config = super::effective_config_or_exit(config_path, Overrides::default());
    match config.to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing configuration: {e}");
            std::process::exit(1);
        }
    }
}
