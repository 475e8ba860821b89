//! Structural descriptions of types the crate does not depend on.
//!
//! A library that wants its types to be inspected by `faultline` without
//! either crate depending on the other publishes a [`TypeShape`] for each of
//! them: a name, a list of typed properties and a list of static methods.
//! Consumers such as the [`ValidationAdapter`](crate::ValidationAdapter)
//! look the shapes up by name and check every member they need before using
//! any of them.
//!
//! ```
//! use faultline::shape::{TypeCatalog, TypeRef, TypeShape, Value};
//!
//! struct Ticket {
//!     open: bool,
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.insert(TypeShape::of::<Ticket>("Ticket").property(
//!     "open",
//!     TypeRef::Bool,
//!     |t: &Ticket| Value::Bool(t.open),
//! ));
//!
//! let shape = catalog.get("Ticket").unwrap();
//! let open = shape.property_named("open").unwrap();
//! assert_eq!(open.declared_type(), &TypeRef::Bool);
//! assert!(open.get(&Ticket { open: true }).unwrap().into_bool().unwrap());
//! ```

use alloc::{borrow::Cow, vec::Vec};
use core::{any::Any, fmt, panic::Location};

pub use faultline_internals::{
    ObjectRef, RuntimeType, ShapeError, TypeRef, Value,
    value::{MethodInvoker, PropertyGetter},
};
use faultline_internals::value::{FnInvoker, TypedGetter};
use hashbrown::HashMap;
use triomphe::Arc;
use unsize::CoerceUnsize;

use crate::sync::Lock;

/// One readable property of a shaped type.
pub struct PropertyShape {
    name: Cow<'static, str>,
    declared_type: TypeRef,
    getter: Arc<dyn PropertyGetter>,
}

impl PropertyShape {
    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type the property was declared with.
    #[must_use]
    pub fn declared_type(&self) -> &TypeRef {
        &self.declared_type
    }

    /// Reads the property from `target`.
    pub fn get<'a>(&self, target: &'a dyn Any) -> Result<Value<'a>, ShapeError> {
        self.getter.get(target)
    }

    pub(crate) fn getter(&self) -> Arc<dyn PropertyGetter> {
        Arc::clone(&self.getter)
    }
}

impl fmt::Debug for PropertyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyShape")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .finish_non_exhaustive()
    }
}

/// One static method of a shaped type.
pub struct MethodShape {
    name: Cow<'static, str>,
    parameters: Vec<TypeRef>,
    returns: TypeRef,
    invoker: Arc<dyn MethodInvoker>,
}

impl MethodShape {
    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared parameter types, in order.
    #[must_use]
    pub fn parameters(&self) -> &[TypeRef] {
        &self.parameters
    }

    /// The declared return type.
    #[must_use]
    pub fn returns(&self) -> &TypeRef {
        &self.returns
    }

    /// Invokes the method.
    pub fn invoke<'a>(&self, args: &[Value<'a>]) -> Result<Value<'a>, ShapeError> {
        if args.len() != self.parameters.len() {
            return Err(ShapeError::ArityMismatch {
                expected: self.parameters.len(),
                found: args.len(),
            });
        }
        self.invoker.invoke(args)
    }

    pub(crate) fn invoker(&self) -> Arc<dyn MethodInvoker> {
        Arc::clone(&self.invoker)
    }
}

impl fmt::Debug for MethodShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodShape")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// The published structure of one type.
pub struct TypeShape {
    name: Cow<'static, str>,
    runtime_type: RuntimeType,
    properties: Vec<PropertyShape>,
    methods: Vec<MethodShape>,
}

impl TypeShape {
    /// Starts the shape of `T`, published under `name`.
    pub fn of<T: Any>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            runtime_type: RuntimeType::of::<T>(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Adds a property read from values of type `T`.
    #[must_use]
    pub fn property<T, F>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        declared_type: TypeRef,
        getter: F,
    ) -> Self
    where
        T: Any,
        F: for<'a> Fn(&'a T) -> Value<'a> + 'static + Send + Sync,
    {
        let getter = Arc::new(TypedGetter::<T, F>::new(getter));
        self.properties.push(PropertyShape {
            name: name.into(),
            declared_type,
            getter: getter.unsize(unsize::Coercion!(to dyn PropertyGetter)),
        });
        self
    }

    /// Adds a static method.
    #[must_use]
    pub fn method<F>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        parameters: impl IntoIterator<Item = TypeRef>,
        returns: TypeRef,
        body: F,
    ) -> Self
    where
        F: for<'a, 'b> Fn(&'b [Value<'a>]) -> Result<Value<'a>, ShapeError>
            + 'static
            + Send
            + Sync,
    {
        let invoker = Arc::new(FnInvoker::new(body));
        self.methods.push(MethodShape {
            name: name.into(),
            parameters: parameters.into_iter().collect(),
            returns,
            invoker: invoker.unsize(unsize::Coercion!(to dyn MethodInvoker)),
        });
        self
    }

    /// The name the shape is published under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The concrete Rust type the shape describes.
    #[must_use]
    pub fn runtime_type(&self) -> &RuntimeType {
        &self.runtime_type
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn property_named(&self, name: &str) -> Option<&PropertyShape> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method_named(&self, name: &str) -> Option<&MethodShape> {
        self.methods.iter().find(|m| m.name() == name)
    }

    /// All properties, in the order they were added.
    #[must_use]
    pub fn properties(&self) -> &[PropertyShape] {
        &self.properties
    }

    /// All methods, in the order they were added.
    #[must_use]
    pub fn methods(&self) -> &[MethodShape] {
        &self.methods
    }
}

impl fmt::Debug for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeShape")
            .field("name", &self.name)
            .field("runtime_type", &self.runtime_type.name())
            .field("properties", &self.properties)
            .field("methods", &self.methods)
            .finish()
    }
}

/// A set of shapes, keyed by name.
///
/// Inserting a shape under a name that is already taken replaces the
/// earlier shape.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    shapes: HashMap<Cow<'static, str>, Arc<TypeShape>, rustc_hash::FxBuildHasher>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            shapes: HashMap::with_hasher(rustc_hash::FxBuildHasher),
        }
    }

    /// Adds `shape` to the catalog.
    pub fn insert(&mut self, shape: TypeShape) {
        self.shapes.insert(shape.name.clone(), Arc::new(shape));
    }

    /// Looks up a shape by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeShape> {
        self.shapes.get(name).map(|shape| &**shape)
    }

    /// Number of shapes in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if the catalog holds no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

static GLOBAL_CATALOG: Lock<TypeCatalog> = Lock::new(TypeCatalog::new());

/// Publishes `shape` in the process-wide catalog.
///
/// The global [`ValidationAdapter`](crate::ValidationAdapter) probes this
/// catalog the first time it is needed, and never again. Shapes must
/// therefore be registered before the first error is formatted.
#[track_caller]
pub fn register_type(shape: TypeShape) {
    let location = Location::caller();
    tracing::trace!(
        name = shape.name(),
        type_name = shape.runtime_type().name(),
        "type shape registered at {}:{}",
        location.file(),
        location.line()
    );
    GLOBAL_CATALOG.write().insert(shape);
}

/// Runs `f` with read access to the process-wide catalog.
pub fn with_global_catalog<R>(f: impl FnOnce(&TypeCatalog) -> R) -> R {
    f(&GLOBAL_CATALOG.read())
}
