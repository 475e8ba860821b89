//! Rendering of entity validation failures with a locally probed adapter.
//!
//! The global adapter is covered by `global_validation.rs`, which runs in a
//! process of its own.

mod support;

use faultline::{
    Registry, Renderer, ValidationAdapter,
    exceptions::BasicException,
    shape::{TypeCatalog, TypeRef, TypeShape, Value},
    validation::{ProbeError, RESULT_TYPE},
};
use support::{Customer, Entity, Failure, Invoice, Outcome, SaveRejected};

fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    for shape in support::shapes() {
        catalog.insert(shape);
    }
    catalog
}

fn render(adapter: &ValidationAdapter, exception: &dyn faultline::Exception) -> String {
    let registry = Registry::new();
    Renderer::new(&registry)
        .with_validation(Some(adapter))
        .render(exception)
}

#[test]
fn test_section_lists_invalid_entities() {
    let adapter = ValidationAdapter::probe(&catalog()).unwrap();
    let error = SaveRejected::new(vec![
        Outcome::new(
            Entity::Customer(Customer),
            vec![
                Failure::new("email", "The email field is required."),
                Failure::new("name", "The name is too long."),
            ],
        ),
        Outcome::new(Entity::Invoice(Invoice), vec![]),
        Outcome::new(
            Entity::Invoice(Invoice),
            vec![Failure::new("total", "must not be negative")],
        ),
    ]);
    assert_eq!(
        render(&adapter, &error),
        "Type: SaveRejected\n\
         Message: Validation failed for one or more entities.\n\
         Properties:\n   \
            Entities: 3\n   \
            EntityValidationErrors:\n      \
               Customer:\n         \
                  email: The email field is required.\n         \
                  name: The name is too long.\n      \
               Invoice:\n         \
                  total: must not be negative"
    );
}

#[test]
fn test_all_valid_gives_empty_section() {
    let adapter = ValidationAdapter::probe(&catalog()).unwrap();
    let error = SaveRejected::new(vec![Outcome::new(Entity::Customer(Customer), vec![])]);
    assert!(
        render(&adapter, &error).ends_with("   Entities: 1\n   EntityValidationErrors:")
    );
}

#[test]
fn test_other_types_get_no_section() {
    let adapter = ValidationAdapter::probe(&catalog()).unwrap();
    let text = render(&adapter, &BasicException::new("unrelated"));
    assert!(!text.contains("EntityValidationErrors"));
}

#[test]
fn test_nested_validation_error() {
    let adapter = ValidationAdapter::probe(&catalog()).unwrap();
    let error = BasicException::new("could not save").with_inner(SaveRejected::new(vec![
        Outcome::new(
            Entity::Customer(Customer),
            vec![Failure::new("email", "required")],
        ),
    ]));
    assert!(render(&adapter, &error).ends_with(
        "InnerException:\n   \
            Type: SaveRejected\n   \
            Message: Validation failed for one or more entities.\n   \
            Properties:\n      \
               Entities: 1\n      \
               EntityValidationErrors:\n         \
                  Customer:\n            \
                     email: required"
    ));
}

#[test]
fn test_walk_failure_keeps_earlier_lines() {
    let adapter = ValidationAdapter::probe(&catalog()).unwrap();
    let mut error = SaveRejected::new(vec![
        Outcome::new(
            Entity::Customer(Customer),
            vec![
                Failure::new("email", "required"),
                Failure {
                    corrupt: true,
                    ..Failure::new("name", "never shown")
                },
                Failure::new("phone", "never shown either"),
            ],
        ),
        Outcome::new(
            Entity::Invoice(Invoice),
            vec![Failure::new("total", "never reached")],
        ),
    ]);
    error.origin = Some("orders");
    let text = render(&adapter, &error);
    assert!(text.ends_with(
        "   EntityValidationErrors:\n      \
               Customer:\n         \
                  email: required\n\
         Source: orders"
    ));
    assert!(!text.contains("never"));
}

#[test]
fn test_probe_requires_every_member() {
    let mut catalog = catalog();
    catalog.insert(
        TypeShape::of::<Outcome>(RESULT_TYPE)
            .property("is_valid", TypeRef::Bool, |o: &Outcome| {
                Value::Bool(o.failures.is_empty())
            })
            .property(
                "validation_errors",
                TypeRef::collection_of(TypeRef::named("ValidationError")),
                |o: &Outcome| Value::objects(&o.failures),
            ),
    );
    assert_eq!(
        ValidationAdapter::probe(&catalog).unwrap_err(),
        ProbeError::MissingMember {
            type_name: RESULT_TYPE,
            member: "entry",
        }
    );
}

#[test]
fn test_no_adapter_no_section() {
    let registry = Registry::new();
    let error = SaveRejected::new(vec![Outcome::new(
        Entity::Customer(Customer),
        vec![Failure::new("email", "required")],
    )]);
    assert_eq!(
        Renderer::new(&registry).render(&error),
        "Type: SaveRejected\n\
         Message: Validation failed for one or more entities.\n\
         Properties:\n   \
            Entities: 1"
    );
}

#[test]
fn test_multiline_failure_message() {
    let adapter = ValidationAdapter::probe(&catalog()).unwrap();
    let error = SaveRejected::new(vec![Outcome::new(
        Entity::Customer(Customer),
        vec![
            Failure::new("email", "The email field is required.\nUse a work address."),
            Failure::new("name", "required"),
        ],
    )]);
    assert!(render(&adapter, &error).ends_with(
        "   EntityValidationErrors:\n      \
               Customer:\n         \
                  email: The email field is required.\n         \
                  Use a work address.\n         \
                  name: required"
    ));
}
