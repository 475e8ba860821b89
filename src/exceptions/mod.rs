//! Ready-made exception types.
//!
//! - [`BasicException`]: a message with an optional single cause and the
//!   usual optional parts.
//! - [`AggregateException`]: a list of independent causes.

mod aggregate;
mod basic;

pub use self::{
    aggregate::{AggregateException, share},
    basic::BasicException,
};
