use clap::Parser;
use error_stack::{Result, ResultExt};

use quill::posts::manage::Lookup;
use quill::types::{NewPost, Post};

use super::{build_app, user_error, CommandError};

#[derive(Debug, Parser)]
pub struct FeedCommand;

impl FeedCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        let app = build_app()?;
        let entries = app.feed().refresh().await.map_err(user_error)?;

        if entries.is_empty() {
            println!("No posts yet.");
            return Ok(());
        }

        for entry in &entries {
            print_post(entry.post());
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct PublishCommand {
    pub title: String,
    pub content: String,
    #[clap(long, env = "QUILL_EMAIL")]
    pub email: String,
    #[clap(long, env = "QUILL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl PublishCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        let app = build_app()?;
        app.sign_in(&self.email, &self.password)
            .await
            .change_context(CommandError)?;

        let composer = app.composer();
        match composer.create(NewPost::new(self.title, self.content)).await {
            Some(post) => {
                println!("Published.");
                print_post(&post);
                Ok(())
            }
            None => Err(user_error(
                composer
                    .last_error()
                    .unwrap_or_else(|| "post creation failed".to_string()),
            )),
        }
    }
}

#[derive(Debug, Parser)]
pub struct MyPostsCommand {
    #[clap(long, env = "QUILL_EMAIL")]
    pub email: String,
    #[clap(long, env = "QUILL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl MyPostsCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        let app = build_app()?;
        app.sign_in(&self.email, &self.password)
            .await
            .change_context(CommandError)?;

        let posts = app.manager().list_mine().await.map_err(user_error)?;
        if posts.is_empty() {
            println!("You have not published anything yet.");
            return Ok(());
        }

        for post in &posts {
            print_post(post);
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct ShowCommand {
    pub id: String,
}

impl ShowCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        let app = build_app()?;
        match app.manager().get(&self.id).await.map_err(user_error)? {
            Lookup::Found(post) => {
                print_post(&post);
                Ok(())
            }
            Lookup::NotFound => Err(user_error(format!("post {} does not exist", self.id))),
        }
    }
}

#[derive(Debug, Parser)]
pub struct DeleteCommand {
    pub id: String,
    #[clap(long, env = "QUILL_EMAIL")]
    pub email: String,
    #[clap(long, env = "QUILL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl DeleteCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        let app = build_app()?;
        app.sign_in(&self.email, &self.password)
            .await
            .change_context(CommandError)?;

        app.manager().delete(&self.id).await.map_err(user_error)?;
        println!("Deleted {}.", self.id);
        Ok(())
    }
}

fn print_post(post: &Post) {
    println!("{}: {}", post.id, post.title);
    println!("  by {} at {}", post.author_id, post.created_at.to_rfc3339());
    println!("  {}", post.content);
}
