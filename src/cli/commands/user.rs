use clap::Subcommand;
use serde_json::json;

use crate::auth::password::{generate_secure_password, DEFAULT_GENERATED_LENGTH};
use crate::auth::Role;
use crate::cli::utils::{database_pool, output_empty_collection, output_success, print_table};
use crate::cli::OutputFormat;
use crate::filter::FilterData;
use crate::services::user::{NewUser, UserService};

fn parse_role(value: &str) -> Result<Role, String> {
    Role::parse(value).ok_or_else(|| format!("unknown role '{}' (administrator, hr_manager, employee)", value))
}

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a portal account")]
    Create {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Display name (defaults to the username)")]
        display_name: Option<String>,
        #[arg(long, value_parser = parse_role, default_value = "employee", help = "administrator, hr_manager or employee")]
        role: Role,
        #[arg(long, help = "Password (generated when omitted)")]
        password: Option<String>,
        #[arg(long, help = "Require a password change at first login")]
        force_reset: bool,
    },

    #[command(about = "Set a new password and require a change at next login")]
    ResetPassword {
        #[arg(help = "Username or email")]
        login: String,
        #[arg(long, help = "New password (generated when omitted)")]
        password: Option<String>,
    },

    #[command(about = "List accounts")]
    List {
        #[arg(long, value_parser = parse_role, help = "Only this role")]
        role: Option<Role>,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let users = UserService::with_pool(database_pool().await?);

    match cmd {
        UserCommands::Create { username, email, display_name, role, password, force_reset } => {
            let created = users
                .create(NewUser {
                    username: Some(username),
                    email: Some(email),
                    display_name,
                    role: Some(role),
                    password,
                    force_password_reset: force_reset,
                })
                .await?;

            output_success(
                output_format,
                &format!("User '{}' created as {}", created.user.username, created.user.role),
                Some(json!({ "user": created.user, "generated_password": created.generated_password })),
            )?;
            if let (OutputFormat::Text, Some(password)) = (output_format, &created.generated_password) {
                println!("Generated password: {}", password);
            }
            Ok(())
        }
        UserCommands::ResetPassword { login, password } => {
            let generated = password.is_none();
            let password = password.unwrap_or_else(|| generate_secure_password(DEFAULT_GENERATED_LENGTH));
            let user = users.reset_password(&login, &password).await?;

            output_success(
                output_format,
                &format!("Password reset for '{}'; a change is required at next login", user.username),
                Some(json!({ "username": user.username, "password": generated.then_some(&password) })),
            )?;
            if generated && matches!(output_format, OutputFormat::Text) {
                println!("New password: {}", password);
            }
            Ok(())
        }
        UserCommands::List { role } => {
            let filter = FilterData {
                where_clause: role.map(|r| json!({ "role": r })),
                ..Default::default()
            };
            let list = users.list(filter).await?;
            if list.is_empty() {
                return output_empty_collection(output_format, "users", "No users found");
            }

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "users": list }))?),
                OutputFormat::Text => {
                    let rows: Vec<Vec<String>> = list
                        .iter()
                        .map(|u| {
                            vec![
                                u.username.clone(),
                                u.email.clone(),
                                u.role.to_string(),
                                if u.is_active { "yes" } else { "no" }.to_string(),
                                u.last_login_at.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default(),
                            ]
                        })
                        .collect();
                    print_table(&["USERNAME", "EMAIL", "ROLE", "ACTIVE", "LAST LOGIN"], &rows);
                }
            }
            Ok(())
        }
    }
}
