//! Validation failures from a persistence layer.
//!
//! This example demonstrates:
//! 1. Publishing type shapes with `shape::register_type`
//! 2. How the `EntityValidationErrors:` section appears once every required
//!    shape is present
//! 3. That entities which passed validation are left out

use std::borrow::Cow;

use faultline::{
    Exception, ExceptionExt, ValidationAdapter,
    exceptions::BasicException,
    shape::{self, RuntimeType, TypeRef, TypeShape, Value},
    validation::{CONTEXT_TYPE, ENTRY_TYPE, ERROR_TYPE, EXCEPTION_TYPE, RESULT_TYPE},
};

struct Customer;

struct Address;

enum Tracked {
    Customer(Customer),
    Address(Address),
}

struct Entry {
    entity: Tracked,
}

struct PropertyError {
    property: &'static str,
    message: &'static str,
}

struct EntityResult {
    entry: Entry,
    errors: Vec<PropertyError>,
}

/// The error a save operation raises when entities are invalid.
struct ValidationFailed {
    results: Vec<EntityResult>,
}

impl Exception for ValidationFailed {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed("Validation failed for one or more entities. See 'EntityValidationErrors' for more details.")
    }

    fn type_name(&self) -> Cow<'static, str> {
        Cow::Borrowed("store::ValidationFailed")
    }
}

struct Store;

/// Publishes the shapes the formatter probes for. A real persistence layer
/// would do this once at startup.
fn publish_shapes() {
    shape::register_type(TypeShape::of::<ValidationFailed>(EXCEPTION_TYPE).property(
        "entity_validation_errors",
        TypeRef::enumerable_of(TypeRef::named(RESULT_TYPE)),
        |e: &ValidationFailed| Value::objects(&e.results),
    ));
    shape::register_type(
        TypeShape::of::<EntityResult>(RESULT_TYPE)
            .property("is_valid", TypeRef::Bool, |r: &EntityResult| {
                Value::Bool(r.errors.is_empty())
            })
            .property("entry", TypeRef::named(ENTRY_TYPE), |r: &EntityResult| {
                Value::object(&r.entry)
            })
            .property(
                "validation_errors",
                TypeRef::collection_of(TypeRef::named(ERROR_TYPE)),
                |r: &EntityResult| Value::objects(&r.errors),
            ),
    );
    shape::register_type(TypeShape::of::<Entry>(ENTRY_TYPE).property(
        "entity",
        TypeRef::Object,
        |e: &Entry| match &e.entity {
            Tracked::Customer(customer) => Value::object(customer),
            Tracked::Address(address) => Value::object(address),
        },
    ));
    shape::register_type(
        TypeShape::of::<PropertyError>(ERROR_TYPE)
            .property("property_name", TypeRef::String, |e: &PropertyError| {
                Value::from(e.property)
            })
            .property("error_message", TypeRef::String, |e: &PropertyError| {
                Value::from(e.message)
            }),
    );
    // Maps tracked types to the names users know them by.
    shape::register_type(TypeShape::of::<Store>(CONTEXT_TYPE).method(
        "get_object_type",
        [TypeRef::Type],
        TypeRef::Type,
        |args| {
            let tracked = args[0].clone().into_type()?;
            let name = tracked.name().rsplit("::").next().unwrap_or_default();
            Ok(Value::Type(RuntimeType::new(tracked.id(), format!("store::{name}"))))
        },
    ));
}

fn save() -> ValidationFailed {
    let error = |property, message| PropertyError { property, message };
    ValidationFailed {
        results: vec![
            EntityResult {
                entry: Entry {
                    entity: Tracked::Customer(Customer),
                },
                errors: vec![
                    error("Email", "The Email field is required."),
                    error("Name", "The field Name must be a string with a maximum length of 64."),
                ],
            },
            EntityResult {
                entry: Entry {
                    entity: Tracked::Address(Address),
                },
                errors: vec![],
            },
        ],
    }
}

fn main() {
    // Shapes must be in place before the first report is formatted.
    publish_shapes();

    println!("=== Validation Errors ===\n");
    match ValidationAdapter::global() {
        Some(adapter) => println!("Bound: {adapter:?}\n"),
        None => println!("No validation framework found\n"),
    }

    let error = BasicException::new("Could not register the customer.")
        .with_origin("signup")
        .with_inner(save());
    println!("{}", error.report());
}
