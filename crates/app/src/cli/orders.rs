use clap::{Args, Subcommand};
use jiff::Timestamp;
use storefront::{
    orders::{Order, OrderStatus, OrderUuid},
    phone::format_phone_number,
};
use storefront_app::{
    context::AppContext,
    domain::orders::{OrdersBulkOutcome, data::OrderFilter},
};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List orders, newest first
    List(ListOrdersArgs),
    /// Show one order with its lines
    Show(ShowOrderArgs),
    /// Set the status of one or more orders
    SetStatus(SetStatusArgs),
    /// Permanently delete one or more orders
    Delete(DeleteOrdersArgs),
}

#[derive(Debug, Args)]
struct ListOrdersArgs {
    /// Only orders in this status
    #[arg(long)]
    status: Option<OrderStatus>,

    /// Match customer name, phone digits or order id
    #[arg(long)]
    search: Option<String>,
}

#[derive(Debug, Args)]
struct ShowOrderArgs {
    order_uuid: OrderUuid,
}

#[derive(Debug, Args)]
struct SetStatusArgs {
    status: OrderStatus,

    #[arg(required = true)]
    order_uuids: Vec<OrderUuid>,
}

#[derive(Debug, Args)]
struct DeleteOrdersArgs {
    #[arg(required = true)]
    order_uuids: Vec<OrderUuid>,
}

pub(crate) async fn run(ctx: &AppContext, command: OrdersCommand) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::List(args) => list(ctx, args).await,
        OrdersSubcommand::Show(args) => show(ctx, args).await,
        OrdersSubcommand::SetStatus(args) => {
            let outcome = ctx
                .orders
                .bulk_update_status(args.order_uuids, args.status, Timestamp::now())
                .await;

            report(&outcome, &format!("set to {}", args.status))
        }
        OrdersSubcommand::Delete(args) => {
            let outcome = ctx.orders.bulk_delete(args.order_uuids).await;

            report(&outcome, "deleted")
        }
    }
}

async fn list(ctx: &AppContext, args: ListOrdersArgs) -> Result<(), String> {
    let orders = ctx
        .orders
        .list_orders(OrderFilter {
            status: args.status,
            search: args.search,
        })
        .await
        .map_err(|error| format!("failed to list orders: {error}"))?;

    if orders.is_empty() {
        println!("no orders found");
        return Ok(());
    }

    for order in orders {
        println!(
            "{}  {:<9}  {:>10}  {}  {}",
            order.uuid,
            order.status,
            order.total,
            order.created_at,
            order.customer.name
        );
    }

    Ok(())
}

async fn show(ctx: &AppContext, args: ShowOrderArgs) -> Result<(), String> {
    let order = ctx
        .orders
        .get_order(args.order_uuid)
        .await
        .map_err(|error| format!("failed to load order: {error}"))?;

    print_order(ctx, &order);

    Ok(())
}

fn print_order(ctx: &AppContext, order: &Order) {
    let policy = ctx.phone_policy;

    println!("order_uuid: {}", order.uuid);
    println!("status: {}", order.status);
    println!("created_at: {}", order.created_at);
    println!("last_status_change: {}", order.last_status_change);
    println!("customer: {}", order.customer.name);
    println!(
        "phone: {}",
        format_phone_number(policy, &order.customer.phone, policy.country_code())
    );

    if let Some(comment) = order.comment.as_deref() {
        println!("comment: {comment}");
    }

    for line in &order.items {
        let variant = [line.selected_size.as_deref(), line.selected_color.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("/");

        println!(
            "  {} x {}{} @ {} = {}",
            line.quantity,
            line.name,
            if variant.is_empty() {
                String::new()
            } else {
                format!(" ({variant})")
            },
            line.price,
            line.line_total()
        );
    }

    println!("total: {}", order.total);
}

fn report(outcome: &OrdersBulkOutcome, action: &str) -> Result<(), String> {
    for order in &outcome.succeeded {
        println!("{order}: {action}");
    }

    for (order, error) in &outcome.failed {
        println!("{order}: failed ({error})");
    }

    if outcome.is_complete() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} orders failed",
            outcome.failed.len(),
            outcome.failed.len() + outcome.succeeded.len()
        ))
    }
}
