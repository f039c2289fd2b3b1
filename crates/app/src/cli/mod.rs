use clap::{Parser, Subcommand};
use storefront_app::{config::AppConfig, context::AppContext};

mod catalog;
mod orders;
mod quote;
mod settings;

#[derive(Debug, Parser)]
#[command(name = "storefront-app", about = "Storefront back-office CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// List, inspect and manage orders
    Orders(orders::OrdersCommand),
    /// Show or change delivery and pickup settings
    Settings(settings::SettingsCommand),
    /// Manage products and categories
    Catalog(catalog::CatalogCommand),
    /// Quote delivery and total for a subtotal
    Quote(quote::QuoteArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        if matches!(self.command, Commands::Migrate) {
            AppContext::migrate(&self.config)
                .await
                .map_err(|error| format!("{error}: {}", source_of(&error)))?;

            println!("migrations applied");

            return Ok(());
        }

        let ctx = AppContext::from_config(&self.config)
            .await
            .map_err(|error| format!("{error}: {}", source_of(&error)))?;

        match self.command {
            Commands::Migrate => Ok(()),
            Commands::Orders(command) => orders::run(&ctx, command).await,
            Commands::Settings(command) => settings::run(&ctx, command).await,
            Commands::Catalog(command) => catalog::run(&ctx, command).await,
            Commands::Quote(args) => quote::run(&ctx, args).await,
        }
    }
}

fn source_of(error: &dyn std::error::Error) -> String {
    error
        .source()
        .map_or_else(|| "no further detail".to_string(), ToString::to_string)
}
