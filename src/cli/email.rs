use clap::Parser;
use error_stack::{Result, ResultExt};

use quill::email::Verifier;
use quill::config;

use super::CommandError;

#[derive(Debug, Parser)]
pub struct CheckEmailCommand {
    pub address: String,
}

impl CheckEmailCommand {
    pub async fn run(self) -> Result<(), CommandError> {
        // local heuristics work without any backend configured
        let config = config::Client::load()
            .map(|config| config.email)
            .unwrap_or_default();

        let verifier = Verifier::new(&config).change_context(CommandError)?;
        let verdict = verifier.verify(&self.address).await;

        if verdict.is_valid {
            println!("{} looks fine.", self.address);
        } else {
            println!(
                "{} rejected: {}",
                self.address,
                verdict.error.unwrap_or_else(|| "unknown reason".to_string())
            );
        }
        Ok(())
    }
}
