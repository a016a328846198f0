use std::{
    any::{Any, TypeId},
    fmt::Display,
};

/// Dispatch level diagnostics.
/// Never escape [`Delegate::call`](crate::Delegate::call); surfaced only
/// through [`Delegate::try_call`](crate::Delegate::try_call) and the log.
#[derive(Debug, Clone)]
pub enum DispatchError {
    /// Delegate has never been connected, or was disconnected.
    Unbound,
    /// Target object was dropped after binding.
    TargetExpired { target: TypeInfo },
    /// Capsule was packed for a different signature than is bound.
    SignatureMismatch { expected: TypeInfo, found: TypeInfo },
    /// Bound method panicked; the panic was caught at the adapter boundary.
    MethodPanicked { target: TypeInfo, message: String },
}

impl DispatchError {
    pub fn expired<T: Any + ?Sized>() -> Self {
        Self::TargetExpired {
            target: TypeInfo::of::<T>(),
        }
    }

    pub fn mismatch<S: Any>(found: TypeInfo) -> Self {
        Self::SignatureMismatch {
            expected: TypeInfo::of::<S>(),
            found,
        }
    }

    pub fn panicked<T: Any + ?Sized>(message: String) -> Self {
        Self::MethodPanicked {
            target: TypeInfo::of::<T>(),
            message,
        }
    }

    pub fn is_unbound(&self) -> bool {
        matches!(self, Self::Unbound)
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Self::TargetExpired { .. })
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::SignatureMismatch { .. })
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Self::MethodPanicked { .. })
    }
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbound => write!(f, "No callback is bound."),
            Self::TargetExpired { target } => {
                write!(f, "Target {} was dropped after binding.", target)
            }
            Self::SignatureMismatch { expected, found } => write!(
                f,
                "Bound method expects arguments {} but call packed {}.",
                expected, found
            ),
            Self::MethodPanicked { target, message } => {
                write!(f, "Method bound on {} panicked: {}", target, message)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub ty: TypeId,
    pub ty_name: &'static str,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            ty: TypeId::of::<T>(),
            ty_name: std::any::type_name::<T>(),
        }
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.ty == TypeId::of::<T>()
    }
}

impl Eq for TypeInfo {}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ty_name)
    }
}
