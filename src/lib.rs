//! # Goal
//! The main goal of this library is to provide a single-slot, type-erased
//! delegate: one object method is bound behind a weak reference and later
//! invoked with an arbitrary, tuple-packed argument list that is replayed
//! into the method with its declared passing modes.
//!
//! Primary attribute of the library is a narrow erasure boundary: the bind
//! and call sites are fully generic, while the stored binding is a single
//! non-generic object. Static checking is given up exactly there and
//! replaced by a checked downcast.
//!
//! Secondary attribute is the fail-quiet contract. The delegate models a
//! fire-and-forget notification, not a request needing a response: an
//! unbound slot, an expired target, a mismatched signature and a panicking
//! method all degrade to a no-op.
//!
//! # Features
//! - Weak ownership, through the [`Delegate::connect`] family.
//!      - Responsible for: the binding never keeps the target alive.
//! - Argument erasure, through [`Capsule`] and [`ArgList`].
//!      - Responsible for: can a call's arguments cross the erasure
//!        boundary and come back out as the exact tuple they went in as?
//! - Calling-convention replay, through [`signature`]'s [`Method`] trait
//!   and its [`Owned`]/[`Ref`]/[`Mut`] position markers.
//!      - Responsible for: does each parameter receive the stored value in
//!        the mode the method was declared with?
//!
//! # Architecture
//! There are several pieces that interact with one another:
//! - Capsule - opaque carrier of one invocation's decayed argument tuple.
//! - Method - a callable plus the per-position passing modes of its
//!   parameter list, named at the bind site through the `connect!` macro
//!   (or inferred, for by-value-only parameter lists).
//! - Callback - the typed adapter pairing a weak target handle with a
//!   method; the only piece that can recover a capsule's contents.
//! - Delegate - the public slot, owning at most one erased callback.
//!
//! Control flow: `connect` erases a typed callback into the slot; `call`
//! packs a capsule, the callback downcasts it, upgrades the weak handle and
//! replays the arguments. Everything is synchronous and single-threaded;
//! the delegate is not `Send` and concurrent use is out of contract.

#[macro_use]
pub mod delegate;

mod callback;
pub mod capsule;
pub mod error;
pub mod signature;

pub use capsule::{ArgList, Capsule};
pub use delegate::Delegate;
pub use error::{DispatchError, TypeInfo};
pub use signature::{Method, Mut, Owned, Ref};
