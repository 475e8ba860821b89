#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    unsafe_code,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Deterministic, indented text reports for errors and their causes.
//!
//! ## Overview
//!
//! `faultline` turns an error, together with everything it wraps, into a
//! plain-text report meant to be written verbatim to a log:
//!
//! ```text
//! Type: app::SaveFailed
//! Message: could not save the order
//! Properties:
//!    OrderId: 1042
//!    HResult: 0x80004005
//! Source: billing
//! InnerException:
//!    Type: app::DiskFull
//!    Message: no space left on device
//!    Properties:
//!       Device: /dev/sda1
//! ```
//!
//! Formatting never fails because of a misbehaving error: a field that cannot
//! be read shows the failure's message instead of its value, and an optional
//! section that cannot be walked is cut short. With the `std` feature a
//! panicking accessor only costs its own line or section, which shows the
//! panic's message instead. Without `std` such a panic unwinds out of the
//! formatter.
//!
//! ## Core Concepts
//!
//! - The [`Exception`] trait is what makes a type renderable. It exposes a
//!   message, the causes, and a few optional side channels.
//! - [`Exception::describe`] lists the fields shown under `Properties:`. It is
//!   called once per concrete type, and the result is cached in the
//!   [`Registry`].
//! - The [`Renderer`] walks an exception and its causes, looking up the cached
//!   [`RenderFunction`] of every cause's concrete type as it goes.
//! - A [`ValidationAdapter`] adds an `EntityValidationErrors:` section for a
//!   validation framework that is discovered at runtime by the
//!   [shapes](shape) it publishes.
//!
//! ## Quick Example
//!
//! ```
//! use std::borrow::Cow;
//!
//! use faultline::{Exception, exceptions::BasicException, fields::Fields};
//!
//! struct DiskFull {
//!     device: String,
//! }
//!
//! impl Exception for DiskFull {
//!     fn message(&self) -> Cow<'_, str> {
//!         Cow::Borrowed("no space left on device")
//!     }
//!
//!     fn describe(&self) -> Fields {
//!         Fields::new().field("Device", |e: &Self| e.device.clone())
//!     }
//! }
//!
//! let error = BasicException::new("could not save the order")
//!     .with_origin("billing")
//!     .with_inner(DiskFull {
//!         device: "/dev/sda1".into(),
//!     });
//!
//! let report = faultline::format_to_string(&error);
//! assert!(report.contains("\nSource: billing\nInnerException:\n"));
//! assert!(report.ends_with("   Properties:\n      Device: /dev/sda1"));
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): uses `std` locks and isolates panics raised by field
//!   accessors. Without it the crate is `no_std` + `alloc`.
//! - `backtrace`: [`BasicException::with_captured_stack_trace`].
//! - `compat-anyhow1`: rendering of [`anyhow::Error`] values.
//!
//! [`BasicException::with_captured_stack_trace`]: exceptions::BasicException
//! [`anyhow::Error`]: https://docs.rs/anyhow/1/anyhow/struct.Error.html

extern crate alloc;

#[cfg(all(feature = "std", not(doc)))]
extern crate std;

pub mod compat;
mod exception;
pub mod exceptions;
pub mod fields;
mod options;
pub mod prelude;
pub mod registry;
mod render;
pub mod shape;
mod sync;
pub mod validation;

pub use self::{
    exception::{Exception, ExceptionData},
    options::FormatOptions,
    registry::Registry,
    render::{
        ExceptionExt, ExceptionReport, RenderFunction, Renderer, format, format_to_string,
    },
    validation::ValidationAdapter,
};
