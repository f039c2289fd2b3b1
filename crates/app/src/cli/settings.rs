use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use storefront::delivery::{DeliverySettings, PickupLocation};
use storefront_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct SettingsCommand {
    #[command(subcommand)]
    command: SettingsSubcommand,
}

#[derive(Debug, Subcommand)]
enum SettingsSubcommand {
    /// Show or replace delivery pricing
    Delivery(DeliveryArgs),
    /// Show or replace the pickup point
    Pickup(PickupArgs),
}

#[derive(Debug, Args)]
struct DeliveryArgs {
    /// Cost charged below the threshold
    #[arg(long, requires = "threshold")]
    base_cost: Option<Decimal>,

    /// Subtotal from which delivery is free
    #[arg(long, requires = "base_cost")]
    threshold: Option<Decimal>,
}

#[derive(Debug, Args)]
struct PickupArgs {
    #[arg(long, requires_all = ["longitude", "address"])]
    latitude: Option<f64>,

    #[arg(long, requires_all = ["latitude", "address"])]
    longitude: Option<f64>,

    #[arg(long, requires_all = ["latitude", "longitude"])]
    address: Option<String>,
}

pub(crate) async fn run(ctx: &AppContext, command: SettingsCommand) -> Result<(), String> {
    match command.command {
        SettingsSubcommand::Delivery(args) => delivery(ctx, args).await,
        SettingsSubcommand::Pickup(args) => pickup(ctx, args).await,
    }
}

async fn delivery(ctx: &AppContext, args: DeliveryArgs) -> Result<(), String> {
    if let (Some(base_cost), Some(free_delivery_threshold)) = (args.base_cost, args.threshold) {
        ctx.settings
            .update_delivery_settings(DeliverySettings {
                base_cost,
                free_delivery_threshold,
            })
            .await
            .map_err(|error| format!("failed to save delivery settings: {error}"))?;
    }

    let settings = ctx
        .settings
        .delivery_settings()
        .await
        .map_err(|error| format!("failed to load delivery settings: {error}"))?;

    match settings {
        Some(settings) => {
            println!("base_cost: {}", settings.base_cost);
            println!("free_delivery_threshold: {}", settings.free_delivery_threshold);
        }
        None => println!("delivery settings not configured; delivery is free"),
    }

    Ok(())
}

async fn pickup(ctx: &AppContext, args: PickupArgs) -> Result<(), String> {
    if let (Some(latitude), Some(longitude), Some(address)) =
        (args.latitude, args.longitude, args.address)
    {
        ctx.settings
            .update_pickup_location(PickupLocation {
                latitude,
                longitude,
                address,
            })
            .await
            .map_err(|error| format!("failed to save pickup location: {error}"))?;
    }

    let location = ctx
        .settings
        .pickup_location()
        .await
        .map_err(|error| format!("failed to load pickup location: {error}"))?;

    match location {
        Some(location) => {
            println!("address: {}", location.address);
            println!("latitude: {}", location.latitude);
            println!("longitude: {}", location.longitude);
        }
        None => println!("pickup location not configured"),
    }

    Ok(())
}
