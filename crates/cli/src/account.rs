use anyhow::{Context, Result};
use clap::Subcommand;
use dialoguer::Password;

use studyhall_core::profile::Registration;
use studyhall_core::validate::password_strength;
use studyhall_sync::IdentityProvider;

use crate::app::App;

#[derive(Subcommand)]
pub enum AccountAction {
    /// Register a new account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        admission_no: String,
        /// Branch code (CSE, IT, ECE, ...)
        #[arg(long)]
        branch: String,
        /// Semester 1-8
        #[arg(long)]
        semester: u8,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Keep the current anonymous identity's uid
        #[arg(long)]
        upgrade: bool,
    },

    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out of the current session
    Logout,

    /// Show the signed-in profile
    Whoami,
}

pub async fn run(action: AccountAction) -> Result<()> {
    let app = App::load().await?;
    match action {
        AccountAction::Register {
            name,
            email,
            admission_no,
            branch,
            semester,
            password,
            upgrade,
        } => {
            let password = password_or_prompt(password, true)?;
            let registration = Registration {
                name,
                email,
                password,
                admission_no,
                branch,
                semester,
            };
            let identity = if upgrade {
                app.session.upgrade(&registration).await
            } else {
                app.session.register(&registration).await
            }
            .map_err(|e| anyhow::anyhow!("registration failed: {e}"))?;
            println!(
                "Registered {} ({})",
                identity.display_name,
                crate::app::short_id(&identity.uid)
            );
            Ok(())
        }
        AccountAction::Login { email, password } => {
            let password = password_or_prompt(password, false)?;
            let identity = app
                .session
                .sign_in(&email, &password)
                .await
                .map_err(|e| anyhow::anyhow!("login failed: {e}"))?;
            println!("Signed in as {}", identity.display_name);
            Ok(())
        }
        AccountAction::Logout => {
            app.session
                .sign_out()
                .await
                .map_err(|e| anyhow::anyhow!("logout failed: {e}"))?;
            println!("Signed out.");
            Ok(())
        }
        AccountAction::Whoami => {
            let identity = app.identity()?;
            if !identity.registered {
                println!("Not signed in (anonymous session).");
                return Ok(());
            }
            let profile = app
                .session
                .provider()
                .profile(&identity.uid)
                .await
                .map_err(|e| anyhow::anyhow!("loading profile: {e}"))?
                .context("profile missing for signed-in user")?;
            println!("{} <{}>", profile.name, profile.email);
            println!(
                "  {} / semester {} / {}",
                profile.branch,
                profile.semester,
                profile.role.as_str()
            );
            println!("  admission no: {}", profile.admission_no);
            println!(
                "  member since {}, {} logins",
                profile.created_at.format("%Y-%m-%d"),
                profile.login_count
            );
            Ok(())
        }
    }
}

fn password_or_prompt(given: Option<String>, advise: bool) -> Result<String> {
    let password = match given {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("reading password")?,
    };
    if advise && password_strength(&password) < 3 {
        eprintln!("note: weak password (use 8+ chars with mixed case, digits, symbols)");
    }
    Ok(password)
}
