//! Optional rendering of entity validation failures.
//!
//! Some persistence frameworks raise an error that carries a list of
//! per-entity validation results instead of a useful message. When such a
//! framework publishes the shapes of its types in the
//! [global catalog](crate::shape::register_type), reports for that error gain
//! an `EntityValidationErrors:` section listing every failing entity and
//! property:
//!
//! ```text
//! Type: EntityValidationException
//! Message: Validation failed for one or more entities.
//! Properties:
//!    EntityValidationErrors:
//!       Customer:
//!          email: The email field is required.
//! ```
//!
//! The framework is discovered purely by shape. [`ValidationAdapter::probe`]
//! looks up five types by name and checks the declared type of every member
//! it needs. Only if all of them match is an adapter bound; otherwise the
//! section is never rendered.

use alloc::borrow::Cow;
use core::{any::Any, fmt};

use faultline_internals::{
    RuntimeType, ShapeError, TypeRef, Value,
    value::{MethodInvoker, PropertyGetter},
};
use triomphe::Arc;

use crate::{
    Exception,
    exception::concrete_type_id,
    shape::{self, TypeCatalog, TypeShape},
    sync::OnceSlot,
};

/// Name of the error type carrying the validation results.
pub const EXCEPTION_TYPE: &str = "EntityValidationException";
/// Name of the per-entity result type.
pub const RESULT_TYPE: &str = "EntityValidationResult";
/// Name of the per-property failure type.
pub const ERROR_TYPE: &str = "ValidationError";
/// Name of the type wrapping the validated entity.
pub const ENTRY_TYPE: &str = "EntityEntry";
/// Name of the type resolving an entity's runtime type.
pub const CONTEXT_TYPE: &str = "ObjectContext";
/// Name under which older framework versions publish [`CONTEXT_TYPE`].
pub const LEGACY_CONTEXT_TYPE: &str = "objects::ObjectContext";

/// The reason no [`ValidationAdapter`] could be bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeError {
    /// A required type is not in the catalog.
    MissingType {
        /// The name that was looked up.
        name: &'static str,
    },
    /// A required member is not declared on its type.
    MissingMember {
        /// The type that was searched.
        type_name: &'static str,
        /// The member that was looked up.
        member: &'static str,
    },
    /// A property is declared with a different type than required.
    PropertyType {
        /// The type declaring the property.
        type_name: &'static str,
        /// The property.
        member: &'static str,
        /// The required type.
        expected: TypeRef,
        /// The declared type.
        found: TypeRef,
    },
    /// A method is declared with a different signature than required.
    MethodSignature {
        /// The type declaring the method.
        type_name: &'static str,
        /// The method.
        member: &'static str,
    },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingType { name } => write!(f, "type {name} is not registered"),
            Self::MissingMember { type_name, member } => {
                write!(f, "type {type_name} has no member {member}")
            }
            Self::PropertyType {
                type_name,
                member,
                expected,
                found,
            } => write!(
                f,
                "property {type_name}::{member} has type {found}, expected {expected}"
            ),
            Self::MethodSignature { type_name, member } => {
                write!(f, "method {type_name}::{member} has an unexpected signature")
            }
        }
    }
}

impl core::error::Error for ProbeError {}

/// One step of a validation walk, in output order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationEvent<'a> {
    /// An entity that failed validation; its failures follow.
    Entity(RuntimeType),
    /// One failing property of the last entity.
    Failure {
        /// The property that failed.
        property: Cow<'a, str>,
        /// Why it failed.
        message: Cow<'a, str>,
    },
}

/// Accessors bound to a validation framework found by shape.
pub struct ValidationAdapter {
    exception_type: RuntimeType,
    entity_validation_errors: Arc<dyn PropertyGetter>,
    is_valid: Arc<dyn PropertyGetter>,
    entry: Arc<dyn PropertyGetter>,
    entity: Arc<dyn PropertyGetter>,
    validation_errors: Arc<dyn PropertyGetter>,
    property_name: Arc<dyn PropertyGetter>,
    error_message: Arc<dyn PropertyGetter>,
    get_object_type: Arc<dyn MethodInvoker>,
}

static GLOBAL: OnceSlot<Option<ValidationAdapter>> = OnceSlot::new();

impl ValidationAdapter {
    /// Checks `catalog` for the validation framework's types and binds their
    /// accessors.
    pub fn probe(catalog: &TypeCatalog) -> Result<Self, ProbeError> {
        let exception = find_type(catalog, EXCEPTION_TYPE)?;
        let result = find_type(catalog, RESULT_TYPE)?;
        let error = find_type(catalog, ERROR_TYPE)?;
        let entry = find_type(catalog, ENTRY_TYPE)?;
        let context = catalog
            .get(CONTEXT_TYPE)
            .or_else(|| catalog.get(LEGACY_CONTEXT_TYPE))
            .ok_or(ProbeError::MissingType { name: CONTEXT_TYPE })?;

        Ok(Self {
            exception_type: exception.runtime_type().clone(),
            entity_validation_errors: expect_property(
                exception,
                EXCEPTION_TYPE,
                "entity_validation_errors",
                TypeRef::enumerable_of(TypeRef::named(RESULT_TYPE)),
            )?,
            is_valid: expect_property(result, RESULT_TYPE, "is_valid", TypeRef::Bool)?,
            entry: expect_property(result, RESULT_TYPE, "entry", TypeRef::named(ENTRY_TYPE))?,
            entity: expect_property(entry, ENTRY_TYPE, "entity", TypeRef::Object)?,
            validation_errors: expect_property(
                result,
                RESULT_TYPE,
                "validation_errors",
                TypeRef::collection_of(TypeRef::named(ERROR_TYPE)),
            )?,
            property_name: expect_property(error, ERROR_TYPE, "property_name", TypeRef::String)?,
            error_message: expect_property(error, ERROR_TYPE, "error_message", TypeRef::String)?,
            get_object_type: expect_method(
                context,
                CONTEXT_TYPE,
                "get_object_type",
                &[TypeRef::Type],
                &TypeRef::Type,
            )?,
        })
    }

    /// The adapter bound to the global catalog, if the framework is present.
    ///
    /// The catalog is probed on the first call only; the outcome is kept for
    /// the rest of the process.
    pub fn global() -> Option<&'static ValidationAdapter> {
        GLOBAL
            .get_or_init(|| match shape::with_global_catalog(Self::probe) {
                Ok(adapter) => {
                    tracing::debug!(
                        exception_type = adapter.exception_type.name(),
                        "validation adapter bound"
                    );
                    Some(adapter)
                }
                Err(error) => {
                    tracing::debug!(reason = %error, "validation adapter unavailable");
                    None
                }
            })
            .as_ref()
    }

    /// Returns `true` if `exception` is the framework's validation error.
    #[must_use]
    pub fn matches(&self, exception: &dyn Exception) -> bool {
        concrete_type_id(exception) == self.exception_type.id()
    }

    /// Walks the validation results of `target`, reporting each invalid
    /// entity followed by its failures.
    ///
    /// Events already reported stay reported when a later step fails.
    pub fn walk<'a>(
        &self,
        target: &'a dyn Any,
        visit: &mut dyn FnMut(ValidationEvent<'a>),
    ) -> Result<(), ShapeError> {
        let results = self.entity_validation_errors.get(target)?.into_sequence()?;
        for result in results {
            let result = result.into_object()?.value();
            if self.is_valid.get(result)?.into_bool()? {
                continue;
            }

            let entry = self.entry.get(result)?.into_object()?.value();
            let entity = self.entity.get(entry)?.into_object()?;
            let entity_type = self
                .get_object_type
                .invoke(&[Value::Type(entity.runtime_type())])?
                .into_type()?;
            visit(ValidationEvent::Entity(entity_type));

            for error in self.validation_errors.get(result)?.into_sequence()? {
                let error = error.into_object()?.value();
                let property = self.property_name.get(error)?.into_str()?;
                let message = self.error_message.get(error)?.into_str()?;
                visit(ValidationEvent::Failure { property, message });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ValidationAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationAdapter")
            .field("exception_type", &self.exception_type.name())
            .finish_non_exhaustive()
    }
}

fn find_type<'c>(catalog: &'c TypeCatalog, name: &'static str) -> Result<&'c TypeShape, ProbeError> {
    catalog.get(name).ok_or(ProbeError::MissingType { name })
}

fn expect_property(
    shape: &TypeShape,
    type_name: &'static str,
    member: &'static str,
    expected: TypeRef,
) -> Result<Arc<dyn PropertyGetter>, ProbeError> {
    let property = shape
        .property_named(member)
        .ok_or(ProbeError::MissingMember { type_name, member })?;
    if *property.declared_type() != expected {
        return Err(ProbeError::PropertyType {
            type_name,
            member,
            expected,
            found: property.declared_type().clone(),
        });
    }
    Ok(property.getter())
}

fn expect_method(
    shape: &TypeShape,
    type_name: &'static str,
    member: &'static str,
    parameters: &[TypeRef],
    returns: &TypeRef,
) -> Result<Arc<dyn MethodInvoker>, ProbeError> {
    let method = shape
        .method_named(member)
        .ok_or(ProbeError::MissingMember { type_name, member })?;
    if method.parameters() != parameters || method.returns() != returns {
        return Err(ProbeError::MethodSignature { type_name, member });
    }
    Ok(method.invoker())
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec, vec::Vec};

    use super::*;

    struct Failure {
        property: String,
        message: String,
    }

    struct Account;

    struct Entry {
        entity: Account,
    }

    struct Outcome {
        entry: Entry,
        failures: Vec<Failure>,
    }

    struct Rejected {
        outcomes: Vec<Outcome>,
    }

    struct Context;

    fn catalog(context_name: &'static str) -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog.insert(TypeShape::of::<Rejected>(EXCEPTION_TYPE).property(
            "entity_validation_errors",
            TypeRef::enumerable_of(TypeRef::named(RESULT_TYPE)),
            |r: &Rejected| Value::objects(&r.outcomes),
        ));
        catalog.insert(
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
        );
        catalog.insert(
            TypeShape::of::<Failure>(ERROR_TYPE)
                .property("property_name", TypeRef::String, |f: &Failure| {
                    Value::from(f.property.as_str())
                })
                .property("error_message", TypeRef::String, |f: &Failure| {
                    Value::from(f.message.as_str())
                }),
        );
        catalog.insert(TypeShape::of::<Entry>(ENTRY_TYPE).property(
            "entity",
            TypeRef::Object,
            |e: &Entry| Value::object(&e.entity),
        ));
        catalog.insert(TypeShape::of::<Context>(context_name).method(
            "get_object_type",
            [TypeRef::Type],
            TypeRef::Type,
            |args| Ok(args[0].clone()),
        ));
        catalog
    }

    fn rejected() -> Rejected {
        let failure = |property: &str, message: &str| Failure {
            property: property.into(),
            message: message.into(),
        };
        Rejected {
            outcomes: vec![
                Outcome {
                    entry: Entry { entity: Account },
                    failures: vec![],
                },
                Outcome {
                    entry: Entry { entity: Account },
                    failures: vec![
                        failure("owner", "required"),
                        failure("balance", "must not be negative"),
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_adapter_send_sync() {
        static_assertions::assert_impl_all!(ValidationAdapter: Send, Sync);
    }

    #[test]
    fn test_walk_skips_valid_results() {
        let adapter = ValidationAdapter::probe(&catalog(CONTEXT_TYPE)).unwrap();
        let target = rejected();
        let mut events = Vec::new();
        adapter.walk(&target, &mut |event| events.push(event)).unwrap();
        assert_eq!(
            events,
            [
                ValidationEvent::Entity(RuntimeType::of::<Account>()),
                ValidationEvent::Failure {
                    property: "owner".into(),
                    message: "required".into()
                },
                ValidationEvent::Failure {
                    property: "balance".into(),
                    message: "must not be negative".into()
                },
            ]
        );
    }

    #[test]
    fn test_legacy_context_name() {
        assert!(ValidationAdapter::probe(&catalog(LEGACY_CONTEXT_TYPE)).is_ok());
        assert_eq!(
            ValidationAdapter::probe(&catalog("Elsewhere")).unwrap_err(),
            ProbeError::MissingType { name: CONTEXT_TYPE }
        );
    }

    #[test]
    fn test_property_type_mismatch() {
        let mut catalog = catalog(CONTEXT_TYPE);
        catalog.insert(
            TypeShape::of::<Failure>(ERROR_TYPE)
                .property("property_name", TypeRef::String, |f: &Failure| {
                    Value::from(f.property.as_str())
                })
                .property("error_message", TypeRef::Object, |f: &Failure| {
                    Value::object(f)
                }),
        );
        let error = ValidationAdapter::probe(&catalog).unwrap_err();
        assert_eq!(
            error,
            ProbeError::PropertyType {
                type_name: ERROR_TYPE,
                member: "error_message",
                expected: TypeRef::String,
                found: TypeRef::Object,
            }
        );
    }

    #[test]
    fn test_walk_on_wrong_target_fails() {
        let adapter = ValidationAdapter::probe(&catalog(CONTEXT_TYPE)).unwrap();
        let mut events = Vec::new();
        let error = adapter.walk(&5u32, &mut |event| events.push(event)).unwrap_err();
        assert!(matches!(error, ShapeError::TargetMismatch { .. }));
        assert!(events.is_empty());
    }

    #[test]
    fn test_empty_catalog() {
        assert_eq!(
            ValidationAdapter::probe(&TypeCatalog::new()).unwrap_err(),
            ProbeError::MissingType {
                name: EXCEPTION_TYPE
            }
        );
    }
}
