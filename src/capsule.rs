use crate::error::TypeInfo;
use getset::CopyGetters;
use std::{any::Any, fmt};

/// Tuple of decayed argument values that can travel through a [`Capsule`].
///
/// Decayed means the storage form of a call's arguments: owned, `'static`
/// values, references and mutability stripped. Implemented for tuples up to
/// arity 6.
pub trait ArgList: Any {
    const ARITY: usize;
}

macro_rules! impl_arg_list {
    ($(($($arg:ident),*))+) => {
        $(
            impl<$($arg: 'static),*> ArgList for ($($arg,)*) {
                const ARITY: usize = impl_arg_list!(@count $($arg)*);
            }
        )+
    };
    (@count) => { 0 };
    (@count $head:ident $($tail:ident)*) => { 1 + impl_arg_list!(@count $($tail)*) };
}

impl_arg_list! {
    ()
    (A0)
    (A0, A1)
    (A0, A1, A2)
    (A0, A1, A2, A3)
    (A0, A1, A2, A3, A4)
    (A0, A1, A2, A3, A4, A5)
}

/// One invocation's arguments, erased to a non-generic carrier.
///
/// Packed once per call, consumed exactly once by the bound callback that
/// recovers the original tuple with [`Capsule::downcast`]. The concrete
/// tuple type is fixed at construction; [`Capsule::info`] is kept purely
/// for mismatch diagnostics.
#[derive(CopyGetters)]
pub struct Capsule {
    #[getset(get_copy = "pub")]
    info: TypeInfo,
    payload: Box<dyn Any>,
}

impl Capsule {
    pub fn pack<A: ArgList>(args: A) -> Self {
        Self {
            info: TypeInfo::of::<A>(),
            payload: Box::new(args),
        }
    }

    pub fn is<A: ArgList>(&self) -> bool {
        self.payload.is::<A>()
    }

    /// Checked recovery of the packed tuple.
    /// Returns the capsule back if it was packed for some other tuple type.
    pub fn downcast<A: ArgList>(self) -> Result<A, Self> {
        match self.payload.downcast::<A>() {
            Ok(args) => Ok(*args),
            Err(payload) => Err(Self {
                info: self.info,
                payload,
            }),
        }
    }
}

impl fmt::Debug for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capsule<{}>", self.info)
    }
}
