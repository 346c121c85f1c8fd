//! Cart commands.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use shop_commerce::cart::{Cart, CollectingNotifier, UpdateProductAmount};
use shop_commerce::{CartError, Currency, Price, ProductId};

use super::{AddArgs, RemoveArgs, ShowArgs, UpdateArgs};
use crate::context::Context;
use crate::output::Output;

/// A cart as printed by the CLI.
#[derive(Debug, Serialize)]
struct CartView {
    lines: Vec<LineView>,
    total_amount: i64,
    total: Option<Price>,
    currency: Currency,
}

#[derive(Debug, Serialize)]
struct LineView {
    id: ProductId,
    title: String,
    price: Price,
    amount: i64,
    subtotal: Option<Price>,
}

impl CartView {
    fn new(cart: &Cart, currency: Currency) -> Self {
        Self {
            lines: cart
                .iter()
                .map(|line| LineView {
                    id: line.id(),
                    title: line.product.name.clone(),
                    price: line.product.price,
                    amount: line.amount,
                    subtotal: line.subtotal(),
                })
                .collect(),
            total_amount: cart.total_amount(),
            total: cart.subtotal(),
            currency,
        }
    }
}

/// Print the cart.
pub async fn show(args: ShowArgs, ctx: &Context) -> Result<()> {
    let (store, _) = ctx.open_store()?;
    let cart = store.cart();

    if args.count {
        if ctx.output.is_json() {
            ctx.output
                .json(&serde_json::json!({ "total_amount": cart.total_amount() }));
        } else {
            println!("{}", cart.total_amount());
        }
        return Ok(());
    }

    print_cart(&cart, ctx);
    Ok(())
}

/// Add one unit of a product.
pub async fn add(args: AddArgs, ctx: &Context) -> Result<()> {
    let (store, notices) = ctx.open_store()?;

    let spinner = ctx.output.spinner(&format!("Adding product {}...", args.product_id));
    let result = store.add_product(args.product_id).await;
    spinner.finish_and_clear();

    finish(result, &notices, ctx)
}

/// Remove a product.
pub async fn remove(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let (store, notices) = ctx.open_store()?;
    let result = store.remove_product(args.product_id);
    finish(result, &notices, ctx)
}

/// Set the amount of a product already in the cart.
pub async fn update(args: UpdateArgs, ctx: &Context) -> Result<()> {
    let (store, notices) = ctx.open_store()?;

    let spinner = ctx
        .output
        .spinner(&format!("Checking stock for product {}...", args.product_id));
    let result = store
        .update_product_amount(UpdateProductAmount::new(args.product_id, args.amount))
        .await;
    spinner.finish_and_clear();

    finish(result, &notices, ctx)
}

fn finish(result: Result<Cart, CartError>, notices: &Arc<CollectingNotifier>, ctx: &Context) -> Result<()> {
    for notice in notices.drain() {
        ctx.output.notice(&notice);
    }

    match result {
        Ok(cart) => {
            print_cart(&cart, ctx);
            Ok(())
        }
        Err(err) => {
            let message = err.user_message();
            Err(anyhow::Error::new(err).context(message))
        }
    }
}

fn print_cart(cart: &Cart, ctx: &Context) {
    let view = CartView::new(cart, ctx.config.cart.currency);

    if ctx.output.is_json() {
        ctx.output.json(&view);
        return;
    }

    render(&view, &ctx.output);
}

fn render(view: &CartView, output: &Output) {
    output.header("Cart");

    if view.lines.is_empty() {
        output.info("Your cart is empty");
        return;
    }

    let widths = [6, 32, 12, 6, 12];
    output.table_row(&["ID", "PRODUCT", "PRICE", "QTY", "SUBTOTAL"], &widths);
    for line in &view.lines {
        let id = line.id.to_string();
        let price = line.price.display(view.currency);
        let amount = line.amount.to_string();
        let subtotal = format_price(line.subtotal, view.currency);
        output.table_row(&[&id, &line.title, &price, &amount, &subtotal], &widths);
    }

    println!();
    output.kv("Items", &view.total_amount.to_string());
    output.kv("Total", &format_price(view.total, view.currency));
}

fn format_price(price: Option<Price>, currency: Currency) -> String {
    price
        .map(|p| p.display(currency))
        .unwrap_or_else(|| "overflow".to_string())
}
