//! Normalized dynamic functions and the values they produce.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::component::Kind;
use crate::dynfunc::resolve::ArgPool;

/// Declared type of one dynamic function input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    type_id: TypeId,
    type_name: &'static str,
}

impl Param {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A type-erased value produced by a dynamic function call.
pub struct DynValue {
    value: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl DynValue {
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Runtime type name of the contained value, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn downcast<T: 'static>(self) -> Result<T, DynValue> {
        let Self {
            value,
            type_id,
            type_name,
        } = self;
        match value.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(value) => Err(Self {
                value,
                type_id,
                type_name,
            }),
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub(crate) fn into_erased(self) -> (TypeId, &'static str, Arc<dyn Any + Send + Sync>) {
        (self.type_id, self.type_name, self.value.into())
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DynValue({})", self.type_name)
    }
}

type CallFn = dyn Fn(&ArgPool) -> anyhow::Result<DynValue> + Send + Sync;

/// A resolvable callable in normalized form.
///
/// Carries the declared input types, the declared output type, the declared
/// output capability set, and the call itself. Plugin RPC boundaries produce
/// `DynFunc` values directly; in-process code converts plain closures via
/// [`IntoDynFunc`].
#[derive(Clone)]
pub struct DynFunc {
    name: String,
    params: Vec<Param>,
    output: Param,
    capabilities: Vec<Kind>,
    call: Arc<CallFn>,
}

impl DynFunc {
    /// Construct a normalized function from its erased parts.
    pub fn new(
        name: impl Into<String>,
        params: Vec<Param>,
        output: Param,
        call: impl Fn(&ArgPool) -> anyhow::Result<DynValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            output,
            capabilities: Vec::new(),
            call: Arc::new(call),
        }
    }

    /// Replace the diagnostic name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare the capabilities the produced result satisfies.
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Kind>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn output(&self) -> Param {
        self.output
    }

    pub fn capabilities(&self) -> &[Kind] {
        &self.capabilities
    }

    /// Invoke the function against an already-resolved argument pool.
    ///
    /// Every declared input must be present in the pool; the resolution step
    /// guarantees this before any call is dispatched.
    pub fn call_with(&self, args: &ArgPool) -> anyhow::Result<DynValue> {
        (self.call)(args)
    }
}

impl fmt::Debug for DynFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynFunc")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("output", &self.output)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Conversion into normalized [`DynFunc`] form.
///
/// Implemented for `DynFunc` itself (identity: the form a plugin RPC boundary
/// already produces) and for plain closures of arity 0 through 4 whose
/// parameters are `Clone + Send + Sync + 'static` and which return
/// `anyhow::Result<R>`. The closure conversion records each parameter type at
/// compile time, so no runtime introspection is needed.
pub trait IntoDynFunc<Args> {
    fn into_dyn_func(self) -> DynFunc;
}

/// Marker for the identity conversion of an owned [`DynFunc`].
pub struct Normalized;

/// Marker for the cloning conversion of a borrowed [`DynFunc`].
pub struct NormalizedRef;

impl IntoDynFunc<Normalized> for DynFunc {
    fn into_dyn_func(self) -> DynFunc {
        self
    }
}

impl IntoDynFunc<NormalizedRef> for &DynFunc {
    fn into_dyn_func(self) -> DynFunc {
        self.clone()
    }
}

macro_rules! impl_into_dyn_func {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> IntoDynFunc<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> anyhow::Result<R> + Send + Sync + 'static,
            R: Send + Sync + 'static,
            $($arg: Clone + Send + Sync + 'static,)*
        {
            fn into_dyn_func(self) -> DynFunc {
                DynFunc {
                    name: type_name::<F>().to_string(),
                    params: vec![$(Param::of::<$arg>(),)*],
                    output: Param::of::<R>(),
                    capabilities: Vec::new(),
                    call: Arc::new(move |args: &ArgPool| {
                        let out = self($(args.expect::<$arg>()?),*)?;
                        Ok(DynValue::new(out))
                    }),
                }
            }
        }
    };
}

impl_into_dyn_func!();
impl_into_dyn_func!(A1);
impl_into_dyn_func!(A1, A2);
impl_into_dyn_func!(A1, A2, A3);
impl_into_dyn_func!(A1, A2, A3, A4);
