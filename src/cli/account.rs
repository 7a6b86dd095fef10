use clap::Parser;
use error_stack::{Result, ResultExt};

use super::{build_app, user_error, CommandError};

#[derive(Debug, Parser)]
pub struct RegisterCommand {
    #[clap(long, env = "QUILL_EMAIL")]
    pub email: String,
    #[clap(long, env = "QUILL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl RegisterCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        let app = build_app()?;

        let verdict = app
            .verifier()
            .change_context(CommandError)?
            .verify(&self.email)
            .await;
        if !verdict.is_valid {
            return Err(user_error(
                verdict
                    .error
                    .unwrap_or_else(|| "email address rejected".to_string()),
            ));
        }

        let outcome = app
            .sign_up(&self.email, &self.password)
            .await
            .change_context(CommandError)?;

        if outcome.needs_confirmation() {
            println!("Registered. Check {} for a confirmation link.", self.email);
        } else {
            println!("Registered and signed in as {}.", self.email);
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct LoginCommand {
    #[clap(long, env = "QUILL_EMAIL")]
    pub email: String,
    #[clap(long, env = "QUILL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl LoginCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        let app = build_app()?;
        let session = app
            .sign_in(&self.email, &self.password)
            .await
            .change_context(CommandError)?;

        println!("Signed in as {} ({}).", self.email, session.user.id);
        println!("access token:  {}", session.access_token);
        println!("refresh token: {}", session.refresh_token);
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct WhoamiCommand {
    #[clap(long, env = "QUILL_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,
}

impl WhoamiCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        let app = build_app()?;
        app.backend.set_access_token(Some(self.access_token));

        let user = app.current_user().await.change_context(CommandError)?;
        println!(
            "{} ({})",
            user.email.as_deref().unwrap_or("no email on record"),
            user.id
        );
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct LogoutCommand {
    #[clap(long, env = "QUILL_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,
}

impl LogoutCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        let app = build_app()?;
        app.backend.set_access_token(Some(self.access_token));
        app.sign_out().await.change_context(CommandError)?;
        println!("Signed out.");
        Ok(())
    }
}
