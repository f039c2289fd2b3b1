use clap::Args;
use rust_decimal::Decimal;
use storefront::discounts::round_for_display;
use storefront_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct QuoteArgs {
    /// Cart subtotal to quote delivery for
    subtotal: Decimal,
}

pub(crate) async fn run(ctx: &AppContext, args: QuoteArgs) -> Result<(), String> {
    let quote = ctx.settings.quote_delivery(args.subtotal).await;

    println!("subtotal: {}", round_for_display(quote.subtotal));
    println!("delivery: {}", round_for_display(quote.delivery));
    println!("total: {}", round_for_display(quote.total));

    Ok(())
}
