//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        // Effective settings: file values merged over defaults.
        ConfigAction::Show => {
            let rendered = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Could not render settings as TOML: {}", e))?;
            print!("{}", rendered);
        }

        ConfigAction::Edit => {
            let path = Settings::default_config_path();

            if !path.exists() {
                settings.save()?;
                Output::info(&format!("Wrote default settings to {}", path.display()));
            }

            let editor = std::env::var("VISUAL")
                .or_else(|_| std::env::var("EDITOR"))
                .unwrap_or_else(|_| "vi".to_string());

            let status = std::process::Command::new(&editor).arg(&path).status();

            match status {
                Ok(s) if s.success() => {
                    // Reload so validation problems surface now, not on the
                    // next command.
                    match Settings::load_from(Some(&path)) {
                        Ok(_) => Output::success("Configuration updated."),
                        Err(e) => {
                            Output::warning(&format!("Saved file does not validate: {}", e))
                        }
                    }
                }
                Ok(_) => {
                    Output::warning(&format!("{} exited with an error; file left as-is", editor));
                }
                Err(e) => {
                    Output::error(&format!("Could not launch {}: {}", editor, e));
                    Output::info(&format!("Edit the file directly: {}", path.display()));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }
    }

    Ok(())
}
