//! Order notification emails for the store owner.
//!
//! Renders a new-order summary with plan labels, a maps link for the address
//! and two WhatsApp deep links the owner taps to message the customer.

use askama::Template;
use thiserror::Error;

use agfood_core::{Phone, format_rupees};

use crate::models::{OrderLine, OrderWithCustomer};

/// Errors that can occur while preparing an order notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The customer lacks fields the notification needs.
    #[error("customer information incomplete: missing {}", .0.join(", "))]
    IncompleteCustomer(Vec<&'static str>),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered email ready to hand to the mailer.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// One row of the item table.
struct LineView {
    product_name: String,
    plan_label: &'static str,
    quantity: u32,
    unit_price: String,
    line_total: String,
}

/// HTML template for the new-order email.
#[derive(Template)]
#[template(path = "email/order_notification.html")]
struct OrderNotificationHtml<'a> {
    business_name: &'a str,
    order_id: i32,
    customer_name: &'a str,
    phone: &'a str,
    email: Option<&'a str>,
    address: &'a str,
    maps_link: &'a str,
    delivery_point: &'static str,
    delivery_charge: &'a str,
    lines: &'a [LineView],
    total: &'a str,
    payment_status: &'static str,
    confirm_link: &'a str,
    ready_link: &'a str,
}

/// Plain text template for the new-order email.
#[derive(Template)]
#[template(path = "email/order_notification.txt")]
struct OrderNotificationText<'a> {
    business_name: &'a str,
    order_id: i32,
    customer_name: &'a str,
    phone: &'a str,
    email: Option<&'a str>,
    address: &'a str,
    maps_link: &'a str,
    delivery_point: &'static str,
    delivery_charge: &'a str,
    lines: &'a [LineView],
    total: &'a str,
    payment_status: &'static str,
    confirm_link: &'a str,
    ready_link: &'a str,
}

/// Subject line of the owner notification.
#[must_use]
pub fn subject_for(customer_name: &str) -> String {
    format!("New Order Received from {customer_name}")
}

/// Google Maps search link for a free-text address.
#[must_use]
pub fn maps_link(address: &str) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={}",
        urlencoding::encode(address)
    )
}

/// WhatsApp deep link opening a chat with `phone` and a pre-filled message.
#[must_use]
pub fn whatsapp_link(phone: &Phone, message: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        phone.international(),
        urlencoding::encode(message)
    )
}

fn item_summary(lines: &[OrderLine]) -> String {
    lines
        .iter()
        .map(|line| {
            format!(
                "\u{2022} {} ({}) - Qty: {} - {}",
                line.display_name(),
                line.order_type.label(),
                line.quantity,
                format_rupees(line.price)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Message sent when the owner accepts the order.
fn confirm_message(name: &str, business_name: &str, lines: &[OrderLine], total: i32) -> String {
    format!(
        "Hello {name},\n\nYour order has been confirmed by {business_name}!\n\nItems:\n{}\nTotal: {}",
        item_summary(lines),
        format_rupees(total)
    )
}

/// Message sent when the order is out for delivery.
fn ready_message(name: &str, business_name: &str, lines: &[OrderLine], total: i32) -> String {
    format!(
        "Hello {name},\n\nWe are ready to deliver your order from {business_name}!\n\nItems:\n{}\nTotal: {}",
        item_summary(lines),
        format_rupees(total)
    )
}

fn rupees_i64(amount: i64) -> String {
    format!("\u{20b9}{amount}")
}

/// Render the owner notification for an order.
///
/// # Errors
///
/// Returns `NotificationError::IncompleteCustomer` naming the missing fields
/// when the customer has no name, phone or address.
/// Returns `NotificationError::Template` if rendering fails.
pub fn render_order_notification(
    entry: &OrderWithCustomer,
    business_name: &str,
) -> Result<RenderedEmail, NotificationError> {
    let OrderWithCustomer { order, customer } = entry;

    let missing = customer.missing_contact_fields();
    if !missing.is_empty() {
        return Err(NotificationError::IncompleteCustomer(missing));
    }

    // Checked non-empty above
    let address = customer.address.as_deref().unwrap_or_default();

    let lines: Vec<LineView> = order
        .products
        .iter()
        .map(|line| LineView {
            product_name: line.display_name(),
            plan_label: line.order_type.label(),
            quantity: line.quantity,
            unit_price: format_rupees(line.price),
            line_total: rupees_i64(line.line_total()),
        })
        .collect();

    let maps = maps_link(address);
    let confirm = whatsapp_link(
        &customer.phone,
        &confirm_message(&customer.name, business_name, &order.products, order.total_price),
    );
    let ready = whatsapp_link(
        &customer.phone,
        &ready_message(&customer.name, business_name, &order.products, order.total_price),
    );
    let delivery_charge = format_rupees(order.delivery_charge);
    let total = format_rupees(order.total_price);
    let email = customer.email.as_ref().map(|e| e.as_str());

    let html = OrderNotificationHtml {
        business_name,
        order_id: order.id.as_i32(),
        customer_name: &customer.name,
        phone: customer.phone.as_str(),
        email,
        address,
        maps_link: &maps,
        delivery_point: order.delivery_point.label(),
        delivery_charge: &delivery_charge,
        lines: &lines,
        total: &total,
        payment_status: order.payment_status.as_str(),
        confirm_link: &confirm,
        ready_link: &ready,
    }
    .render()?;

    let text = OrderNotificationText {
        business_name,
        order_id: order.id.as_i32(),
        customer_name: &customer.name,
        phone: customer.phone.as_str(),
        email,
        address,
        maps_link: &maps,
        delivery_point: order.delivery_point.label(),
        delivery_charge: &delivery_charge,
        lines: &lines,
        total: &total,
        payment_status: order.payment_status.as_str(),
        confirm_link: &confirm,
        ready_link: &ready,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: subject_for(&customer.name),
        text,
        html,
    })
}
