use crate::{
    capsule::Capsule,
    error::{DispatchError, TypeInfo},
    signature::Method,
};
use log::*;
use std::{
    any::Any,
    marker::PhantomData,
    panic::{self, AssertUnwindSafe},
    rc::Weak,
};

/// Erased side of a bound callback. The delegate stores exactly one of these
/// and only ever talks to it through this interface.
pub(crate) trait AnyCallback {
    fn invoke(&self, capsule: Capsule) -> Result<(), DispatchError>;

    /// Identity of the storage tuple this callback was bound with.
    fn expected(&self) -> TypeInfo;
}

/// One object's method, bound with a specific signature.
///
/// Holds a non-owning handle to the target, so the binding never keeps the
/// object alive. Immutable after construction; rebinding is done at the
/// delegate level by replacing the whole adapter.
pub(crate) struct Callback<Tgt: ?Sized, Sig, Fun> {
    target: Weak<Tgt>,
    method: Fun,
    _sig: PhantomData<fn(Sig)>,
}

impl<Tgt: ?Sized, Sig, Fun> Callback<Tgt, Sig, Fun> {
    pub(crate) fn new(target: Weak<Tgt>, method: Fun) -> Self {
        Self {
            target,
            method,
            _sig: PhantomData,
        }
    }
}

impl<Tgt, Sig, Fun> AnyCallback for Callback<Tgt, Sig, Fun>
where
    Tgt: ?Sized + 'static,
    Sig: 'static,
    Fun: Method<Tgt, Sig>,
{
    fn invoke(&self, capsule: Capsule) -> Result<(), DispatchError> {
        // Checked downcast back to the exact tuple this signature stores.
        let args = capsule
            .downcast::<Fun::Stored>()
            .map_err(|capsule| DispatchError::mismatch::<Fun::Stored>(capsule.info()))?;

        // Check-and-acquire a strong reference for the duration of the call.
        let target = self
            .target
            .upgrade()
            .ok_or_else(DispatchError::expired::<Tgt>)?;

        trace!(
            "invoking {} on {}",
            std::any::type_name::<Fun>(),
            std::any::type_name::<Tgt>()
        );

        panic::catch_unwind(AssertUnwindSafe(|| self.method.apply(&target, args)))
            .map_err(|payload| DispatchError::panicked::<Tgt>(panic_message(payload.as_ref())))
    }

    fn expected(&self) -> TypeInfo {
        TypeInfo::of::<Fun::Stored>()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
