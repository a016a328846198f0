use crate::{
    callback::{AnyCallback, Callback},
    capsule::{ArgList, Capsule},
    error::{DispatchError, TypeInfo},
    signature::Method,
};
use log::*;
use std::{
    fmt,
    rc::{Rc, Weak},
};

/// Single-slot, type-erased callback holder.
///
/// Holds at most one bound (target, method) pair behind an erased interface.
/// [`Delegate::connect`] replaces the binding wholesale, [`Delegate::call`]
/// dispatches it fire-and-forget: an unbound slot, an expired target, a
/// mismatched signature or a panicking method all degrade to a no-op, never
/// to a propagated error. [`Delegate::try_call`] is the same dispatch with
/// the outcome reported.
///
/// Not `Send`: the binding holds an `rc::Weak`, and the slot is not guarded
/// by any synchronization. Concurrent use has to be serialized externally.
#[derive(Default)]
pub struct Delegate {
    callback: Option<Box<dyn AnyCallback>>,
}

impl Delegate {
    pub fn new() -> Self {
        Self { callback: None }
    }

    /// Binds `method` on `target`, replacing any previous binding.
    ///
    /// The delegate keeps only a weak handle; once the last `Rc` to the
    /// target is dropped, every subsequent dispatch is a no-op.
    ///
    /// Infers the passing modes, which works when every parameter of the
    /// method is taken by value. Methods with `&`/`&mut` parameters name
    /// their modes through [`Delegate::connect_as`] or the
    /// [`connect!`](crate::connect) macro instead. Trait-object targets
    /// bind callables whose target parameter names the `'static` object,
    /// `&(dyn Trait + 'static)`.
    pub fn connect<Tgt, Sig, Fun>(&mut self, target: &Rc<Tgt>, method: Fun)
    where
        Tgt: ?Sized + 'static,
        Sig: 'static,
        Fun: Method<Tgt, Sig>,
    {
        self.connect_weak(Rc::downgrade(target), method);
    }

    /// Like [`Delegate::connect`] but takes the weak handle directly.
    ///
    /// A dangling handle (`Weak::new`, or one whose target is already gone)
    /// is accepted and installs a binding that never fires.
    pub fn connect_weak<Tgt, Sig, Fun>(&mut self, target: Weak<Tgt>, method: Fun)
    where
        Tgt: ?Sized + 'static,
        Sig: 'static,
        Fun: Method<Tgt, Sig>,
    {
        self.connect_weak_as::<Sig, Tgt, Fun>(target, method);
    }

    /// [`Delegate::connect`] with the signature named instead of inferred:
    /// `Sig` is the tuple of [`Owned`](crate::Owned)/[`Ref`](crate::Ref)/
    /// [`Mut`](crate::Mut) markers for the method's parameter list, given
    /// first so the bind site can write `connect_as::<Sig, _, _>`.
    ///
    /// This is the entry point for mixed-mode signatures, where a `&A`
    /// parameter is ambiguous between a borrow of the stored `A` and a
    /// by-value `&'static A`. The [`connect!`](crate::connect) macro
    /// derives `Sig` from a restated parameter list.
    pub fn connect_as<Sig, Tgt, Fun>(&mut self, target: &Rc<Tgt>, method: Fun)
    where
        Tgt: ?Sized + 'static,
        Sig: 'static,
        Fun: Method<Tgt, Sig>,
    {
        self.connect_weak_as::<Sig, Tgt, Fun>(Rc::downgrade(target), method);
    }

    /// [`Delegate::connect_weak`] with the signature named instead of
    /// inferred.
    pub fn connect_weak_as<Sig, Tgt, Fun>(&mut self, target: Weak<Tgt>, method: Fun)
    where
        Tgt: ?Sized + 'static,
        Sig: 'static,
        Fun: Method<Tgt, Sig>,
    {
        trace!(
            "binding {} on {}",
            std::any::type_name::<Fun>(),
            std::any::type_name::<Tgt>()
        );
        self.callback = Some(Box::new(Callback::new(target, method)));
    }

    /// Clears the slot. Calling afterwards is a no-op again.
    pub fn disconnect(&mut self) {
        self.callback = None;
    }

    pub fn is_connected(&self) -> bool {
        self.callback.is_some()
    }

    /// Identity of the storage tuple the current binding expects.
    pub fn expected(&self) -> Option<TypeInfo> {
        self.callback.as_deref().map(AnyCallback::expected)
    }

    /// Dispatches the bound callback with one invocation's arguments,
    /// packed as a tuple of their decayed values.
    ///
    /// Fail-quiet: never panics through, never returns an error. Mismatch
    /// and caught panics are logged, unbound/expired are silent.
    pub fn call<Args: ArgList>(&self, args: Args) {
        if let Err(error) = self.try_call(args) {
            match error {
                DispatchError::Unbound | DispatchError::TargetExpired { .. } => {
                    trace!("{}", error)
                }
                DispatchError::SignatureMismatch { .. } | DispatchError::MethodPanicked { .. } => {
                    error!("{}", error)
                }
            }
        }
    }

    /// Same dispatch as [`Delegate::call`] with the failure reported instead
    /// of logged. The call's effect on the target is identical.
    pub fn try_call<Args: ArgList>(&self, args: Args) -> Result<(), DispatchError> {
        let callback = self.callback.as_deref().ok_or(DispatchError::Unbound)?;
        let capsule = Capsule::pack(args);
        trace!("dispatching {:?}, bound {}", capsule, callback.expected());
        callback.invoke(capsule)
    }
}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected() {
            Some(info) => write!(f, "Delegate({})", info),
            None => write!(f, "Delegate(unbound)"),
        }
    }
}

/// Function-call-style dispatch: `call!(delegate, a, b, c)` packs the
/// arguments into a tuple and forwards to [`Delegate::call`].
#[macro_export]
macro_rules! call {
    ($delegate:expr $(, $arg:expr)* $(,)?) => {
        $delegate.call(($($arg,)*))
    };
}

/// Binds a method with its parameter list restated, so the passing mode of
/// every position is taken from the syntax: `T` is by value, `&T` borrows
/// the stored value, `&mut T` borrows it mutably.
///
/// ```ignore
/// connect!(delegate, &recorder, Recorder::shapes
///     => fn(i32, Token, f32, &i32, &mut i32, &i32));
/// ```
///
/// Expands to [`Delegate::connect_as`] with the matching
/// [`Owned`](crate::Owned)/[`Ref`](crate::Ref)/[`Mut`](crate::Mut) marker
/// tuple. This is how signatures with reference parameters are bound;
/// by-value-only methods can use plain [`Delegate::connect`] and let the
/// modes be inferred.
#[macro_export]
macro_rules! connect {
    (@parse [$delegate:expr, $target:expr, $method:expr] [$($sig:ty,)*]) => {
        $delegate.connect_as::<($($sig,)*), _, _>($target, $method)
    };
    (@parse $ctx:tt [$($sig:ty,)*] ,) => {
        $crate::connect!(@parse $ctx [$($sig,)*])
    };
    (@parse $ctx:tt [$($sig:ty,)*] &mut $param:ty, $($rest:tt)*) => {
        $crate::connect!(@parse $ctx [$($sig,)* $crate::signature::Mut<$param>,] $($rest)*)
    };
    (@parse $ctx:tt [$($sig:ty,)*] &$param:ty, $($rest:tt)*) => {
        $crate::connect!(@parse $ctx [$($sig,)* $crate::signature::Ref<$param>,] $($rest)*)
    };
    (@parse $ctx:tt [$($sig:ty,)*] $param:ty, $($rest:tt)*) => {
        $crate::connect!(@parse $ctx [$($sig,)* $crate::signature::Owned<$param>,] $($rest)*)
    };
    ($delegate:expr, $target:expr, $method:expr => fn()) => {
        $delegate.connect_as::<(), _, _>($target, $method)
    };
    ($delegate:expr, $target:expr, $method:expr => fn($($params:tt)+)) => {
        $crate::connect!(@parse [$delegate, $target, $method] [] $($params)+ ,)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::{Cell, RefCell},
        panic,
        rc::Rc,
    };

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<String>>,
        hits: Cell<u32>,
    }

    // Deliberately neither Copy nor Clone: receiving one by value proves the
    // stored argument was moved out of the capsule.
    struct Token(String);

    impl Recorder {
        fn ping(&self) {
            self.hits.set(self.hits.get() + 1);
            self.seen.borrow_mut().push("ping".to_owned());
        }

        fn shapes(&self, a: i32, b: Token, c: f32, d: &i32, e: &mut i32, f: &i32) {
            self.hits.set(self.hits.get() + 1);
            *e += *d;
            self.seen
                .borrow_mut()
                .push(format!("{} {} {} {} {} {}", a, b.0, c, d, e, f));
        }

        fn sum(&self, a: i64, b: i64) {
            self.seen.borrow_mut().push((a + b).to_string());
        }

        fn explode(&self, _: u32) {
            panic!("recorder exploded");
        }
    }

    #[test]
    fn unbound_call_is_noop() {
        let delegate = Delegate::new();
        delegate.call(());
        delegate.call((1u8, 2u16));
        assert!(!delegate.is_connected());
        assert!(delegate.try_call(()).unwrap_err().is_unbound());
    }

    #[test]
    fn round_trip_all_modes_arity_six() {
        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        connect!(delegate, &recorder, Recorder::shapes
            => fn(i32, Token, f32, &i32, &mut i32, &i32));
        delegate.call((1i32, Token("two".to_owned()), 3.5f32, 4i32, 5i32, 6i32));
        assert_eq!(recorder.hits.get(), 1);
        assert_eq!(recorder.seen.borrow().as_slice(), ["1 two 3.5 4 9 6"]);
    }

    #[test]
    fn explicit_signature_bind() {
        use crate::signature::{Mut, Owned};

        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        delegate.connect_as::<(Owned<u32>, Mut<u32>), _, _>(
            &recorder,
            |r: &Recorder, by: u32, acc: &mut u32| {
                *acc += by;
                r.seen.borrow_mut().push(acc.to_string());
            },
        );
        delegate.call((2u32, 40u32));
        assert_eq!(recorder.seen.borrow().as_slice(), ["42"]);
    }

    #[test]
    fn rebinding_replaces() {
        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        delegate.connect(&recorder, |r: &Recorder, _: u32| {
            r.seen.borrow_mut().push("first".to_owned());
        });
        delegate.connect(&recorder, |r: &Recorder, n: u32| {
            r.seen.borrow_mut().push(format!("second {}", n));
        });
        delegate.call((7u32,));
        assert_eq!(recorder.seen.borrow().as_slice(), ["second 7"]);
    }

    #[test]
    fn expired_target_silences_calls() {
        struct Remote {
            counter: Rc<Cell<u32>>,
        }

        impl Remote {
            fn bump(&self, by: u32) {
                self.counter.set(self.counter.get() + by);
            }
        }

        let counter = Rc::new(Cell::new(0));
        let remote = Rc::new(Remote {
            counter: counter.clone(),
        });
        let mut delegate = Delegate::new();
        delegate.connect(&remote, Remote::bump);
        drop(remote);
        delegate.call((5u32,));
        assert_eq!(counter.get(), 0);
        assert!(delegate.try_call((5u32,)).unwrap_err().is_expired());
        assert!(delegate.is_connected());
    }

    #[test]
    fn mismatched_call_is_rejected() {
        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        delegate.connect(&recorder, Recorder::sum);
        let error = delegate.try_call((1u8, 2u8, 3u8)).unwrap_err();
        match error {
            DispatchError::SignatureMismatch { expected, found } => {
                assert!(expected.is::<(i64, i64)>());
                assert!(found.is::<(u8, u8, u8)>());
            }
            other => panic!("expected mismatch, got {}", other),
        }
        delegate.call(("wrong".to_owned(),));
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn zero_arity_end_to_end() {
        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        delegate.connect(&recorder, Recorder::ping);
        delegate.call(());
        call!(delegate);
        assert_eq!(recorder.hits.get(), 2);
    }

    #[test]
    fn call_macro_packs_arguments() {
        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        delegate.connect(&recorder, Recorder::sum);
        call!(delegate, 20i64, 22i64);
        assert_eq!(recorder.seen.borrow().as_slice(), ["42"]);
    }

    #[test]
    fn panic_is_contained() {
        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        delegate.connect(&recorder, Recorder::explode);

        let hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        delegate.call((1u32,));
        let error = delegate.try_call((1u32,)).unwrap_err();
        panic::set_hook(hook);

        match error {
            DispatchError::MethodPanicked { message, .. } => {
                assert!(message.contains("recorder exploded"))
            }
            other => panic!("expected contained panic, got {}", other),
        }
    }

    #[test]
    fn dangling_weak_installs_dead_binding() {
        let mut delegate = Delegate::new();
        delegate.connect_weak(Weak::<Recorder>::new(), Recorder::ping);
        assert!(delegate.is_connected());
        delegate.call(());
        assert!(delegate.try_call(()).unwrap_err().is_expired());
    }

    #[test]
    fn disconnect_clears_slot() {
        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        delegate.connect(&recorder, Recorder::ping);
        delegate.disconnect();
        delegate.call(());
        assert_eq!(recorder.hits.get(), 0);
        assert!(delegate.try_call(()).unwrap_err().is_unbound());
    }

    #[test]
    fn expected_reports_bound_signature() {
        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        assert!(delegate.expected().is_none());
        delegate.connect(&recorder, Recorder::sum);
        assert!(delegate.expected().unwrap().is::<(i64, i64)>());
        assert_eq!(format!("{:?}", delegate), "Delegate((i64, i64))");
    }

    #[test]
    fn unsized_target() {
        trait Speak {
            fn speak(&self, word: String);
        }

        impl Speak for Recorder {
            fn speak(&self, word: String) {
                self.seen.borrow_mut().push(word);
            }
        }

        // The target parameter names the `'static` trait object; an elided
        // `&dyn Speak` would tie the object's lifetime to the borrow.
        fn relay_word(target: &(dyn Speak + 'static), word: String) {
            target.speak(word);
        }

        let recorder: Rc<Recorder> = Rc::new(Recorder::default());
        let spoken: Rc<dyn Speak> = recorder.clone();
        let mut delegate = Delegate::new();
        delegate.connect(&spoken, relay_word);
        delegate.call(("hello".to_owned(),));
        assert_eq!(recorder.seen.borrow().as_slice(), ["hello"]);
    }

    #[test]
    fn randomized_forwarding() {
        let recorder = Rc::new(Recorder::default());
        let mut delegate = Delegate::new();
        delegate.connect(&recorder, Recorder::sum);
        for _ in 0..100 {
            let a = i64::from(rand::random::<i32>());
            let b = i64::from(rand::random::<i32>());
            delegate.call((a, b));
            assert_eq!(
                recorder.seen.borrow_mut().pop().unwrap(),
                (a + b).to_string()
            );
        }
    }
}
