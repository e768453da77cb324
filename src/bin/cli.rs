use clap::{Parser, Subcommand};
use recipe_api::{
    config::AppConfig,
    db,
    models::User,
    services::{CreateUserRequest, UserService},
    AppState,
};

#[derive(Parser)]
#[command(name = "recipe-api-cli")]
#[command(about = "CLI tool for managing recipe API users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// Display name
        #[arg(short, long, default_value = "")]
        name: String,
    },

    /// Create a staff superuser
    CreateSuperuser {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Delete a user along with their recipes, tags and ingredients
    Delete {
        /// Email address of the user to delete
        #[arg(short, long)]
        email: String,
    },

    /// Deactivate a user and revoke their API token
    Deactivate {
        /// Email address of the user
        #[arg(short, long)]
        email: String,
    },

    /// Reactivate a previously deactivated user
    Activate {
        /// Email address of the user
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password for a user
    SetPassword {
        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

/// Uses the flag value when given, otherwise prompts twice and compares.
fn resolve_password(given: Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(pw) = given {
        return Ok(pw);
    }

    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

async fn find_or_exit(user_service: &UserService, email: &str) -> User {
    match user_service.find_user_by_email(email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            eprintln!("❌ User '{}' not found", email);
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("❌ Failed to find user: {}", err);
            std::process::exit(1);
        }
    }
}

fn print_created(user: &User) {
    println!("  ID: {}", user.id);
    println!("  Email: {}", user.email);
    println!("  Staff: {}", user.is_staff);
    println!("  Superuser: {}", user.is_superuser);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    // Initialize services
    let state = AppState::new(pool, config);
    let user_service = state.user_service.as_ref();

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                email,
                password,
                name,
            } => {
                let password = resolve_password(password, "Password")?;
                let request = CreateUserRequest {
                    email,
                    password,
                    name,
                };

                match user_service.create_user(request).await {
                    Ok(user) => {
                        println!("✅ User created successfully!");
                        print_created(&user);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to create user: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            UserCommands::CreateSuperuser { email, password } => {
                let password = resolve_password(password, "Password")?;
                let request = CreateUserRequest {
                    email,
                    password,
                    name: String::new(),
                };

                match user_service.create_superuser(request).await {
                    Ok(user) => {
                        println!("✅ Superuser created successfully!");
                        print_created(&user);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to create superuser: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            UserCommands::List { limit, offset } => {
                match user_service.list_users(Some(limit), Some(offset)).await {
                    Ok(users) => {
                        if users.is_empty() {
                            println!("No users found.");
                        } else {
                            println!(
                                "{:<5} {:<40} {:<8} {:<8} {:<20}",
                                "ID", "Email", "Active", "Staff", "Created"
                            );
                            println!("{}", "-".repeat(85));
                            for user in users {
                                println!(
                                    "{:<5} {:<40} {:<8} {:<8} {:<20}",
                                    user.id,
                                    user.email,
                                    if user.is_active { "Yes" } else { "No" },
                                    if user.is_staff { "Yes" } else { "No" },
                                    user.created_at.as_deref().unwrap_or("N/A")
                                );
                            }
                        }
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to list users: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            UserCommands::Delete { email } => {
                let user = find_or_exit(user_service, &email).await;
                // Recipe rows go with the user, so collect their images first
                let images = state.recipe_service.image_paths(user.id).await?;
                match user_service.delete_user(user.id).await {
                    Ok(()) => {
                        let removed = state.recipe_service.remove_images(&images).await;
                        println!("✅ User '{}' deleted successfully!", user.email);
                        println!("  Removed {} of {} recipe images", removed, images.len());
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to delete user: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            UserCommands::Deactivate { email } => {
                let user = find_or_exit(user_service, &email).await;
                match state.auth_service.deactivate(user.id).await {
                    Ok(()) => {
                        println!("✅ User '{}' deactivated and token revoked", user.email);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to deactivate user: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            UserCommands::Activate { email } => {
                let user = find_or_exit(user_service, &email).await;
                match user_service.set_active(user.id, true).await {
                    Ok(()) => {
                        println!("✅ User '{}' activated", user.email);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to activate user: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            UserCommands::SetPassword { email, password } => {
                let user = find_or_exit(user_service, &email).await;
                let new_password = resolve_password(password, "New password")?;

                match user_service.set_password(user.id, &new_password).await {
                    Ok(()) => {
                        println!("✅ Password updated successfully for '{}'!", user.email);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to update password: {}", err);
                        std::process::exit(1);
                    }
                }
            }
        },
    }

    Ok(())
}
