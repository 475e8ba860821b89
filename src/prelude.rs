//! Commonly used items for convenient importing.
//!
//! ```
//! use std::borrow::Cow;
//!
//! use faultline::prelude::*;
//!
//! struct Rejected;
//!
//! impl Exception for Rejected {
//!     fn message(&self) -> Cow<'_, str> {
//!         Cow::Borrowed("request rejected")
//!     }
//!
//!     fn describe(&self) -> Fields {
//!         Fields::new().field("Retryable", |_: &Self| false)
//!     }
//! }
//!
//! let error = BasicException::new("upload failed").with_inner(Rejected);
//! assert!(error.report().to_string().contains("      Retryable: False"));
//! ```

pub use crate::{
    Exception, ExceptionExt,
    compat::IntoException,
    exceptions::{AggregateException, BasicException},
    fields::Fields,
};
