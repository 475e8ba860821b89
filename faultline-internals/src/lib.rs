#![no_std]
#![forbid(
    missing_docs,
    unsafe_code,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_docs_in_private_items,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`faultline`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased building blocks that the
//! [`faultline`] formatting engine is assembled from. Nothing in here knows
//! how a report is laid out; it only knows how to read values out of objects
//! whose concrete type has been forgotten.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`faultline`] crate, not this one.
//!
//! # Architecture
//!
//! The crate is organized around two kinds of erased access:
//!
//! - **[`field`]**: Per-type field accessors used when rendering the
//!   `Properties:` section of a report
//!   - [`RawField`]: A named accessor bound to one concrete error type
//!   - [`FieldValue`]: The value read from a field
//!   - [`FieldFormat`]: How that value is turned into text
//!   - [`FieldError`]: Why reading a field failed
//!
//! - **[`value`]**: Structural values used by shape-based introspection
//!   - [`Value`]: A dynamically typed value produced by a property getter
//!   - [`ObjectRef`]: A borrowed object whose type is only known at runtime
//!   - [`TypeRef`]: The declared type of a shape member
//!   - [`PropertyGetter`] and [`MethodInvoker`]: Erased member access
//!
//! # Erasure Strategy
//!
//! Every accessor is created from a closure over a concrete type `T` and then
//! stored behind a trait object that accepts `&dyn Any`. The typed closure is
//! only ever invoked after a successful [`Any::downcast_ref`], so a mismatched
//! target degrades into an error value instead of undefined behavior. No
//! `unsafe` code is needed for this.
//!
//! [`faultline`]: https://docs.rs/faultline/latest/faultline/
//! [`RawField`]: field::RawField
//! [`FieldValue`]: field::FieldValue
//! [`FieldFormat`]: field::FieldFormat
//! [`FieldError`]: field::FieldError
//! [`Value`]: value::Value
//! [`ObjectRef`]: value::ObjectRef
//! [`TypeRef`]: value::TypeRef
//! [`PropertyGetter`]: value::PropertyGetter
//! [`MethodInvoker`]: value::MethodInvoker
//! [`Any::downcast_ref`]: core::any::Any

extern crate alloc;

pub mod field;
pub mod value;

pub use field::{FieldError, FieldFormat, FieldValue, RawField};
pub use value::{ObjectRef, RuntimeType, ShapeError, TypeRef, Value};
