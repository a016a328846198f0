use crate::capsule::ArgList;
use std::marker::PhantomData;

/// Parameter is taken by value; the stored argument is moved into the call.
pub struct Owned<A>(PhantomData<A>);

/// Parameter is a shared borrow of the stored argument.
pub struct Ref<A>(PhantomData<A>);

/// Parameter is a mutable borrow of the stored argument.
pub struct Mut<A>(PhantomData<A>);

/// A callable bound as "one object's method with a specific parameter list".
///
/// `Sig` is a tuple of [`Owned`]/[`Ref`]/[`Mut`] markers recording, per
/// position, the passing mode the method was declared with. [`Method::apply`]
/// replays that mode from the decayed storage tuple: owned positions are
/// moved out, borrowed positions bind to the stored value for the duration
/// of the call.
///
/// `Sig` is inferred from the callable only when every parameter is taken
/// by value. A `&A` or `&mut A` parameter admits two readings, a borrow of
/// the stored `A` or a by-value `&'static A`, so such signatures name their
/// modes at the bind site ([`Delegate::connect_as`](crate::Delegate::connect_as)
/// or the [`connect!`](crate::connect) macro).
///
/// Implemented for `Fn(&Tgt, ...)` of arity 0..=6 over every mode
/// combination.
pub trait Method<Tgt: ?Sized, Sig>: 'static {
    /// Decayed storage form of the parameter list.
    type Stored: ArgList;

    fn apply(&self, target: &Tgt, args: Self::Stored);
}

macro_rules! impl_method {
    ($(($($arg:ident),*))+) => {
        $(impl_method!(@perm [] [$($arg)*]);)+
    };

    // Branch every remaining position into the three passing modes.
    (@perm [$($done:tt)*] [$head:ident $($tail:ident)*]) => {
        impl_method!(@perm [$($done)* (owned $head)] [$($tail)*]);
        impl_method!(@perm [$($done)* (shared $head)] [$($tail)*]);
        impl_method!(@perm [$($done)* (unique $head)] [$($tail)*]);
    };
    (@perm [$(($mode:ident $arg:ident))*] []) => {
        impl<Tgt, Fun, $($arg,)*> Method<Tgt, ($(impl_method!(@marker $mode $arg),)*)> for Fun
        where
            Tgt: ?Sized + 'static,
            Fun: for<'c> Fn(&'c Tgt $(, impl_method!(@decl $mode $arg 'c))*) + 'static,
            $($arg: 'static,)*
        {
            type Stored = ($($arg,)*);

            #[allow(non_snake_case, unused_mut)]
            fn apply(&self, target: &Tgt, args: Self::Stored) {
                let ($(mut $arg,)*) = args;
                (self)(target $(, impl_method!(@pass $mode $arg))*);
            }
        }
    };

    (@marker owned $arg:ident) => { $crate::signature::Owned<$arg> };
    (@marker shared $arg:ident) => { $crate::signature::Ref<$arg> };
    (@marker unique $arg:ident) => { $crate::signature::Mut<$arg> };

    (@decl owned $arg:ident $lt:lifetime) => { $arg };
    (@decl shared $arg:ident $lt:lifetime) => { &$lt $arg };
    (@decl unique $arg:ident $lt:lifetime) => { &$lt mut $arg };

    (@pass owned $arg:ident) => { $arg };
    (@pass shared $arg:ident) => { &$arg };
    (@pass unique $arg:ident) => { &mut $arg };
}

impl_method! {
    ()
    (A0)
    (A0, A1)
    (A0, A1, A2)
    (A0, A1, A2, A3)
    (A0, A1, A2, A3, A4)
    (A0, A1, A2, A3, A4, A5)
}
