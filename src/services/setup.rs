use crate::core::config::Config;
use anyhow::{bail, Result};
use inquire::validator::Validation;
use inquire::Text;
use log::warn;

/// Config fields the engine cannot run without, by their YAML path.
pub fn missing_fields(config: &Config) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if config.project.user_email.trim().is_empty() {
        missing.push("project.user_email");
    }
    if config.project.project_id.trim().is_empty() {
        missing.push("project.project_id");
    }
    missing
}

/// Prompts for whatever identity fields are missing and saves the result.
/// In unattended mode a missing field is an error instead.
pub fn run_setup(config: &mut Config) -> Result<()> {
    let missing = missing_fields(config);

    if !missing.is_empty() {
        if config.unattended {
            bail!("Missing required config: {}", missing.join(", "));
        }

        if config.project.user_email.trim().is_empty() {
            config.project.user_email = Text::new("User email:")
                .with_validator(|input: &str| {
                    if input.contains('@') {
                        Ok(Validation::Valid)
                    } else {
                        Ok(Validation::Invalid("Please enter an email address".into()))
                    }
                })
                .prompt()?
                .trim()
                .to_string();
        }

        if config.project.project_id.trim().is_empty() {
            config.project.project_id = Text::new("Project ID:")
                .with_validator(|input: &str| {
                    if input.trim().is_empty() {
                        Ok(Validation::Invalid("Project ID cannot be empty".into()))
                    } else {
                        Ok(Validation::Valid)
                    }
                })
                .prompt()?
                .trim()
                .to_string();
        }

        config.save()?;
        println!("Configuration saved.");
    }

    if config.project.scenes.is_empty() {
        warn!("No scenes configured for project {}", config.project.project_id);
    }

    Ok(())
}
