use clap::Parser;
use error_stack::{Report, Result, ResultExt};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use quill::{config, App};

mod account;
mod email;
mod posts;

#[derive(Debug, Error)]
#[error("Failed to run command")]
pub struct CommandError;

/// Command line client for a quill blog.
#[derive(Debug, Parser)]
#[command(about = "Client utilities for a quill blog", version, author)]
pub struct Cli {
    #[clap(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(Debug, Parser)]
pub enum Subcommand {
    /// Print the public feed, newest first
    Feed(posts::FeedCommand),
    /// Publish a new post
    Publish(posts::PublishCommand),
    /// List your own posts
    MyPosts(posts::MyPostsCommand),
    /// Show a single post
    Show(posts::ShowCommand),
    /// Delete one of your posts
    Delete(posts::DeleteCommand),
    /// Register a new account
    Register(account::RegisterCommand),
    /// Sign in and print the session
    Login(account::LoginCommand),
    /// Show the account an access token belongs to
    Whoami(account::WhoamiCommand),
    /// Invalidate a session
    Logout(account::LogoutCommand),
    /// Run the email quality checks against an address
    CheckEmail(email::CheckEmailCommand),
}

impl Cli {
    pub fn run(self) -> Result<(), CommandError> {
        init_telemetry();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .change_context(CommandError)
            .attach_printable("could not build tokio runtime")?;

        runtime.block_on(async move {
            match self.subcommand {
                Subcommand::Feed(args) => args.run().await,
                Subcommand::Publish(args) => args.run().await,
                Subcommand::MyPosts(args) => args.run().await,
                Subcommand::Show(args) => args.run().await,
                Subcommand::Delete(args) => args.run().await,
                Subcommand::Register(args) => args.run().await,
                Subcommand::Login(args) => args.run().await,
                Subcommand::Whoami(args) => args.run().await,
                Subcommand::Logout(args) => args.run().await,
                Subcommand::CheckEmail(args) => args.run().await,
            }
        })
    }
}

fn init_telemetry() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .init();
}

pub(crate) fn build_app() -> Result<App, CommandError> {
    let config = config::Client::load().change_context(CommandError)?;
    App::new(config).change_context(CommandError)
}

/// A failure whose message is already meant for the user's eyes.
pub(crate) fn user_error(message: impl Into<String>) -> Report<CommandError> {
    Report::new(CommandError).attach_printable(message.into())
}
