//! Basic introduction to faultline reports.
//!
//! This example demonstrates the fundamental concepts:
//! 1. Making a type renderable by implementing `Exception`
//! 2. Declaring fields with `describe()`
//! 3. Wrapping causes with `BasicException`
//! 4. Reporting several independent failures with `AggregateException`

use std::borrow::Cow;

use faultline::prelude::*;

/// A domain error with a couple of fields worth logging.
struct PaymentDeclined {
    order_id: u64,
    reason: Option<&'static str>,
}

impl Exception for PaymentDeclined {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed("The card issuer declined the payment.")
    }

    // Every field listed here shows up under `Properties:`. `HResult` is
    // rendered in hex automatically.
    fn describe(&self) -> Fields {
        Fields::new()
            .field("OrderId", |e: &Self| e.order_id)
            .field("Reason", |e: &Self| e.reason)
            .field("HResult", |_: &Self| -2_146_233_088_i32)
    }
}

/// Standard errors render too, with their `source()` chain as causes.
fn read_settings() -> std::io::Result<String> {
    std::fs::read_to_string("/nonexistent/settings.toml")
}

fn checkout(order_id: u64) -> BasicException {
    BasicException::new("Checkout could not be completed.")
        .with_origin("shop::checkout")
        .with_data("order", order_id.to_string())
        .with_data("attempt", "2")
        .with_inner(PaymentDeclined {
            order_id,
            reason: None,
        })
}

fn main() {
    println!("=== Basic Reports ===\n");

    // Example 1: A single error, with its fields
    println!("Example 1: One error");
    let declined = PaymentDeclined {
        order_id: 1042,
        reason: Some("insufficient funds"),
    };
    println!("{}\n", declined.report());

    // Example 2: A chain of causes, each one indented below the last
    println!("Example 2: Error chain");
    println!("{}\n", checkout(1042).report());

    // Example 3: Several failures at once
    println!("Example 3: Aggregate");
    let aggregate = AggregateException::with_message("Nightly sync failed.")
        .with_cause(checkout(7))
        .with_cause(BasicException::new("Warehouse API timed out.").with_result_code(0x5B4));
    println!("{}\n", aggregate.report());

    // Example 4: A standard library error
    println!("Example 4: std::io::Error");
    if let Err(error) = read_settings() {
        println!("{}", error.into_exception().report());
    }
}
