use clap::Subcommand;
use serde_json::json;

use crate::auth::password::{check_strength, generate_secure_password, DEFAULT_GENERATED_LENGTH};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum PasswordCommands {
    #[command(about = "Score a password and list what it is missing")]
    Check {
        #[arg(help = "Password to check")]
        password: String,
    },

    #[command(about = "Generate a random password")]
    Generate {
        #[arg(long, default_value_t = DEFAULT_GENERATED_LENGTH, help = "Password length")]
        length: usize,
    },
}

pub fn handle(cmd: PasswordCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PasswordCommands::Check { password } => {
            let result = check_strength(&password);
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Text => {
                    let verdict = if result.is_strong { "strong" } else { "weak" };
                    println!("Strength: {}/5 ({})", result.strength, verdict);
                    for hint in &result.feedback {
                        println!("  - {}", hint);
                    }
                }
            }
            Ok(())
        }
        PasswordCommands::Generate { length } => {
            if length < 8 {
                anyhow::bail!("Generated passwords must be at least 8 characters");
            }
            let password = generate_secure_password(length);
            match output_format {
                OutputFormat::Json => output_success(output_format, "Password generated", Some(json!({ "password": password }))),
                OutputFormat::Text => {
                    println!("{}", password);
                    Ok(())
                }
            }
        }
    }
}
