//! Explicit type lineage
//!
//! A type lists the types it can be viewed as (traits it is used through, base
//! structs it embeds) by implementing [`Lineage`]. Each ancestor is reported with
//! a pair of upcast functions, so code written against an ancestor can run
//! against the descendant without runtime type checks.
//!
//! Ancestors are reported flat, most general first.
//!
//! ```ignore
//! trait Audited: Send + Sync { fn touch(&mut self); }
//!
//! impl Lineage for User {
//!     fn ancestors<V: LineageVisitor<Self>>(visitor: &mut V) {
//!         visitor.visit::<dyn Audited>(|u| u, |u| u);
//!     }
//! }
//! ```

use std::any::{type_name, TypeId};

/// Receives one callback per ancestor of `D`
pub trait LineageVisitor<D: ?Sized> {
    fn visit<B: ?Sized + Send + Sync + 'static>(
        &mut self,
        upcast: fn(&D) -> &B,
        upcast_mut: fn(&mut D) -> &mut B,
    );
}

pub trait Lineage: 'static {
    /// Report every ancestor of `Self`, most general first; `Self` is not included
    fn ancestors<V: LineageVisitor<Self>>(_visitor: &mut V) {}
}

pub fn identity<T: ?Sized>(value: &T) -> &T {
    value
}

pub fn identity_mut<T: ?Sized>(value: &mut T) -> &mut T {
    value
}

/// Visit the ancestors of `D` and then `D` itself
pub fn walk<D, V>(visitor: &mut V)
where
    D: Lineage + Send + Sync,
    V: LineageVisitor<D>,
{
    D::ancestors(visitor);
    visitor.visit::<D>(identity::<D>, identity_mut::<D>);
}

struct Names(Vec<&'static str>);

impl<D: ?Sized> LineageVisitor<D> for Names {
    fn visit<B: ?Sized + Send + Sync + 'static>(
        &mut self,
        _upcast: fn(&D) -> &B,
        _upcast_mut: fn(&mut D) -> &mut B,
    ) {
        self.0.push(type_name::<B>());
    }
}

/// Type names of `D`'s lineage, ending with `D`
pub fn lineage_names<D: Lineage + Send + Sync>() -> Vec<&'static str> {
    let mut names = Names(Vec::new());
    walk::<D, _>(&mut names);
    names.0
}

struct Finder {
    target: TypeId,
    found: bool,
}

impl<D: ?Sized> LineageVisitor<D> for Finder {
    fn visit<B: ?Sized + Send + Sync + 'static>(
        &mut self,
        _upcast: fn(&D) -> &B,
        _upcast_mut: fn(&mut D) -> &mut B,
    ) {
        self.found |= TypeId::of::<B>() == self.target;
    }
}

/// Whether `D` is `B` or lists `B` among its ancestors
pub fn descends_from<D: Lineage + Send + Sync, B: ?Sized + 'static>() -> bool {
    let mut finder = Finder {
        target: TypeId::of::<B>(),
        found: false,
    };
    walk::<D, _>(&mut finder);
    finder.found
}
