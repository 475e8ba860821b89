//! A small persistence framework that publishes its shapes the way a real
//! one would.

#![allow(dead_code)]

use std::borrow::Cow;

use faultline::{
    Exception,
    fields::Fields,
    shape::{RuntimeType, TypeRef, TypeShape, Value},
    validation::{CONTEXT_TYPE, ENTRY_TYPE, ERROR_TYPE, EXCEPTION_TYPE, RESULT_TYPE},
};

pub struct Customer;

pub struct Invoice;

pub enum Entity {
    Customer(Customer),
    Invoice(Invoice),
}

pub struct Entry {
    pub entity: Entity,
}

pub struct Failure {
    pub property: &'static str,
    pub message: &'static str,
    /// Makes the message unreadable.
    pub corrupt: bool,
}

impl Failure {
    pub fn new(property: &'static str, message: &'static str) -> Self {
        Self {
            property,
            message,
            corrupt: false,
        }
    }
}

pub struct Outcome {
    pub entry: Entry,
    pub failures: Vec<Failure>,
}

impl Outcome {
    pub fn new(entity: Entity, failures: Vec<Failure>) -> Self {
        Self {
            entry: Entry { entity },
            failures,
        }
    }
}

pub struct SaveRejected {
    pub outcomes: Vec<Outcome>,
    pub origin: Option<&'static str>,
}

impl SaveRejected {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            outcomes,
            origin: None,
        }
    }
}

impl Exception for SaveRejected {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed("Validation failed for one or more entities.")
    }

    fn type_name(&self) -> Cow<'static, str> {
        Cow::Borrowed("SaveRejected")
    }

    fn describe(&self) -> Fields {
        Fields::new()
            .field("Entities", |e: &Self| e.outcomes.len())
            .field("EntityValidationErrors", |_: &Self| "listed by its own section")
    }

    fn origin(&self) -> Option<Cow<'_, str>> {
        self.origin.map(Cow::Borrowed)
    }
}

pub struct Context;

/// Every shape the framework publishes.
pub fn shapes() -> Vec<TypeShape> {
    vec![
        TypeShape::of::<SaveRejected>(EXCEPTION_TYPE).property(
            "entity_validation_errors",
            TypeRef::enumerable_of(TypeRef::named(RESULT_TYPE)),
            |e: &SaveRejected| Value::objects(&e.outcomes),
        ),
        TypeShape::of::<Outcome>(RESULT_TYPE)
            .property("is_valid", TypeRef::Bool, |o: &Outcome| {
                Value::Bool(o.failures.is_empty())
            })
            .property("entry", TypeRef::named(ENTRY_TYPE), |o: &Outcome| {
                Value::object(&o.entry)
            })
            .property(
                "validation_errors",
                TypeRef::collection_of(TypeRef::named(ERROR_TYPE)),
                |o: &Outcome| Value::objects(&o.failures),
            ),
        TypeShape::of::<Entry>(ENTRY_TYPE).property("entity", TypeRef::Object, |e: &Entry| {
            match &e.entity {
                Entity::Customer(customer) => Value::object(customer),
                Entity::Invoice(invoice) => Value::object(invoice),
            }
        }),
        TypeShape::of::<Failure>(ERROR_TYPE)
            .property("property_name", TypeRef::String, |f: &Failure| {
                Value::from(f.property)
            })
            .property("error_message", TypeRef::String, |f: &Failure| {
                if f.corrupt {
                    Value::Bool(false)
                } else {
                    Value::from(f.message)
                }
            }),
        TypeShape::of::<Context>(CONTEXT_TYPE).method(
            "get_object_type",
            [TypeRef::Type],
            TypeRef::Type,
            |args| {
                let runtime_type = args[0].clone().into_type()?;
                let short_name = runtime_type
                    .name()
                    .rsplit("::")
                    .next()
                    .unwrap_or_default()
                    .to_owned();
                Ok(Value::Type(RuntimeType::new(runtime_type.id(), short_name)))
            },
        ),
    ]
}
