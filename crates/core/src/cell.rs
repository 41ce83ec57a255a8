//! The tagged value cell.
//!
//! A [`Cell`] is the fixed-size record that carries any runtime value: a
//! header (heart + quote + flags), two payload slots, and one extra slot.
//! The heart names the base type; the quote byte layers isotope/plain/quoted
//! N times/quasi states on top of it. Type is fully determined by
//! `(heart, quote)` -- there is no separate "kind" tag to keep in sync.

use crate::node::NodeRef;
use crate::typeset::Typeset;
use std::fmt;
use std::rc::Rc;

/// The base type byte, independent of quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Heart {
    Blank = 0,
    Logic,
    Integer,
    Decimal,
    Pair,
    Word,
    Block,
    Group,
    Path,
    Text,
    Bitset,
    Handle,
    Typeset,
    Datatype,
    Action,
    Frame,
}

impl Heart {
    /// Whether this heart carries a binding (words, blocks/groups/paths --
    /// anything that can be bound to a context). Scalars are unbindable.
    pub fn is_bindable(self) -> bool {
        matches!(
            self,
            Heart::Word | Heart::Block | Heart::Group | Heart::Path | Heart::Frame
        )
    }
}

/// Quote byte states.
///
/// - 0: isotope (unstable, may not appear inside arrays)
/// - 1: plain (the ordinary form)
/// - 2..=127: quoted N-1 times
/// - 128..=254: quasiform of the heart
pub const QUOTE_ISOTOPE: u8 = 0;
pub const QUOTE_PLAIN: u8 = 1;
pub const QUOTE_MAX_DEPTH: u8 = 127;
pub const QUASI_BASE: u8 = 128;
pub const QUASI_MAX: u8 = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteByte(pub u8);

impl QuoteByte {
    pub const ISOTOPE: QuoteByte = QuoteByte(QUOTE_ISOTOPE);
    pub const PLAIN: QuoteByte = QuoteByte(QUOTE_PLAIN);

    pub fn is_isotope(self) -> bool {
        self.0 == QUOTE_ISOTOPE
    }

    pub fn is_plain(self) -> bool {
        self.0 == QUOTE_PLAIN
    }

    pub fn is_quoted(self) -> bool {
        (2..=QUOTE_MAX_DEPTH).contains(&self.0)
    }

    pub fn is_quasi(self) -> bool {
        (QUASI_BASE..=QUASI_MAX).contains(&self.0)
    }

    /// Number of leading sigils a quoted form renders with.
    pub fn quote_depth(self) -> u8 {
        if self.is_quoted() { self.0 - 1 } else { 0 }
    }

    /// One more level of quoting. Fails (returns `None`) past the legal
    /// quoted range -- quote depth is capped at 126 quotes of plain.
    pub fn quoted(self) -> Option<QuoteByte> {
        match self.0 {
            QUOTE_PLAIN..=126 => Some(QuoteByte(self.0 + 1)),
            _ => None,
        }
    }

    /// One less level of quoting.
    pub fn unquoted(self) -> Option<QuoteByte> {
        match self.0 {
            3..=QUOTE_MAX_DEPTH => Some(QuoteByte(self.0 - 1)),
            2 => Some(QuoteByte::PLAIN),
            _ => None,
        }
    }

    /// The quasi form of the same depth-0 heart.
    pub fn quasi(self) -> QuoteByte {
        QuoteByte(QUASI_BASE + (self.0.saturating_sub(QUOTE_PLAIN)))
    }

    /// Evaluating a quasiform decays it to the corresponding isotope.
    pub fn decay_quasi_to_isotope(self) -> QuoteByte {
        debug_assert!(self.is_quasi());
        QuoteByte::ISOTOPE
    }
}

/// A small hand-rolled bitflags set: the crate avoids an external bitflags
/// dependency for a handful of header bits.
macro_rules! bitflags_lite {
    (pub struct $name:ident: $ty:ty { $($(#[$flag_meta:meta])* const $flag:ident = $val:expr;)* }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name(pub $ty);

        impl $name {
            $($(#[$flag_meta])* pub const $flag: $ty = $val;)*

            pub const fn empty() -> Self { Self(0) }
            pub fn contains(self, bit: $ty) -> bool { self.0 & bit == bit }
            pub fn set(&mut self, bit: $ty) { self.0 |= bit; }
            pub fn clear(&mut self, bit: $ty) { self.0 &= !bit; }
            pub fn intersect(self, other: Self) -> Self { Self(self.0 & other.0) }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
        }
    };
}

bitflags_lite! {
    pub struct CellFlags: u16 {
        const PROTECTED       = 1 << 0;
        const CONST           = 1 << 1;
        const NEWLINE_BEFORE  = 1 << 2;
        const UNEVALUATED     = 1 << 3;
        const FIRST_IS_NODE   = 1 << 4;
        const SECOND_IS_NODE  = 1 << 5;
        /// Set on an exemplar varlist slot once specialized: the slot holds
        /// the actual argument value rather than a typeset, and is skipped
        /// during normal argument fulfillment.
        const HIDDEN          = 1 << 6;
    }
}

/// Flags that survive a `copy_cell` onto an already-initialized destination
/// (the bits a value keeps when another value is written over it).
pub const PERSIST_MASK: CellFlags = CellFlags(CellFlags::PROTECTED);

/// An interned-free symbol: a word's name. Equality is by content, not
/// identity -- a cheap `Rc<str>` clone stands in for a symbol table, since
/// nothing here needs interning or a particular hashing/iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(pub Rc<str>);

impl Symbol {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Symbol(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A word or relative binding, held in a cell's `extra` slot.
#[derive(Debug, Clone)]
pub enum Binding {
    Unbound,
    /// Bound directly to a context's varlist, with a cached slot index.
    Context { varlist: NodeRef, index: u32 },
    /// Bound through a single-cell patch array (LET / module variable).
    Patch(NodeRef),
    /// Bound to an action's details (relative); needs a specifier (a
    /// running frame) to resolve.
    Relative(NodeRef),
    /// Bound to a module's hash-indexed symbol table.
    ModuleAttached(NodeRef),
}

/// The non-node payload alternative: an inline scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    None,
    Logic(bool),
    Integer(i64),
    Decimal(f64),
    Pair(i32, i32),
}

/// A cell's payload: either an inline scalar or a handle to a managed node.
#[derive(Debug, Clone)]
pub enum Payload {
    Scalar(Scalar),
    Node(NodeRef),
}

impl Payload {
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Payload::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Payload::Scalar(s) => Some(*s),
            _ => None,
        }
    }
}

/// The tagged value cell.
#[derive(Debug, Clone)]
pub struct Cell {
    heart: Heart,
    quote: QuoteByte,
    flags: CellFlags,
    payload: Payload,
    extra: Binding,
    /// Word/datatype symbol, typeset data, or handle label -- whatever the
    /// heart needs beyond the payload node/scalar. Kept distinct from
    /// `payload` because e.g. a bound word needs both a symbol *and* a
    /// binding, and a typeset cell's bitmap lives here rather than forcing
    /// every heart through the node-allocation path.
    sideband: Sideband,
}

#[derive(Debug, Clone)]
pub enum Sideband {
    None,
    Symbol(Symbol),
    Typeset(Typeset),
}

impl Cell {
    /// "Prep": an all-zero sentinel distinct from any initialized cell --
    /// reads as "fresh".
    pub fn fresh() -> Self {
        Cell {
            heart: Heart::Blank,
            quote: QuoteByte(0xFF), // not a legal quote state: marks "fresh"
            flags: CellFlags::empty(),
            payload: Payload::Scalar(Scalar::None),
            extra: Binding::Unbound,
            sideband: Sideband::None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.quote.0 == 0xFF
    }

    /// "Reset": return a cell to the fresh state while preserving persist
    /// flags.
    pub fn reset(&mut self) {
        let persisted = self.flags.intersect(PERSIST_MASK);
        *self = Cell::fresh();
        self.flags = persisted;
    }

    pub fn new_scalar(heart: Heart, quote: QuoteByte, scalar: Scalar) -> Self {
        Cell {
            heart,
            quote,
            flags: CellFlags::empty(),
            payload: Payload::Scalar(scalar),
            extra: Binding::Unbound,
            sideband: Sideband::None,
        }
    }

    pub fn new_node(heart: Heart, quote: QuoteByte, node: NodeRef) -> Self {
        let mut flags = CellFlags::empty();
        flags.set(CellFlags::FIRST_IS_NODE);
        Cell {
            heart,
            quote,
            flags,
            payload: Payload::Node(node),
            extra: Binding::Unbound,
            sideband: Sideband::None,
        }
    }

    pub fn word(symbol: Symbol, binding: Binding) -> Self {
        Cell {
            heart: Heart::Word,
            quote: QuoteByte::PLAIN,
            flags: CellFlags::empty(),
            payload: Payload::Scalar(Scalar::None),
            extra: binding,
            sideband: Sideband::Symbol(symbol),
        }
    }

    /// An unspecialized exemplar slot: a typeset cell naming the accepted
    /// hearts and parameter class for that argument.
    pub fn typeset_cell(typeset: Typeset) -> Self {
        Cell {
            heart: Heart::Typeset,
            quote: QuoteByte::PLAIN,
            flags: CellFlags::empty(),
            payload: Payload::Scalar(Scalar::None),
            extra: Binding::Unbound,
            sideband: Sideband::Typeset(typeset),
        }
    }

    pub fn blank() -> Self {
        Cell::new_scalar(Heart::Blank, QuoteByte::PLAIN, Scalar::None)
    }

    pub fn logic(b: bool) -> Self {
        Cell::new_scalar(Heart::Logic, QuoteByte::PLAIN, Scalar::Logic(b))
    }

    pub fn integer(n: i64) -> Self {
        Cell::new_scalar(Heart::Integer, QuoteByte::PLAIN, Scalar::Integer(n))
    }

    pub fn decimal(f: f64) -> Self {
        Cell::new_scalar(Heart::Decimal, QuoteByte::PLAIN, Scalar::Decimal(f))
    }

    pub fn heart(&self) -> Heart {
        self.heart
    }

    pub fn quote(&self) -> QuoteByte {
        self.quote
    }

    pub fn flags(&self) -> CellFlags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut CellFlags {
        &mut self.flags
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn extra(&self) -> &Binding {
        &self.extra
    }

    pub fn extra_mut(&mut self) -> &mut Binding {
        &mut self.extra
    }

    pub fn sideband(&self) -> &Sideband {
        &self.sideband
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        match &self.sideband {
            Sideband::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn typeset(&self) -> Option<&Typeset> {
        match &self.sideband {
            Sideband::Typeset(t) => Some(t),
            _ => None,
        }
    }

    /// `VAL_TYPE`: the heart, except quoted forms (depth > 0) report as a
    /// uniform `Quoted` type regardless of what they wrap.
    pub fn val_type(&self) -> ValType {
        if self.quote.0 > QUOTE_PLAIN && self.quote.0 <= QUOTE_MAX_DEPTH {
            ValType::Quoted
        } else {
            ValType::Heart(self.heart)
        }
    }

    pub fn is_isotope(&self) -> bool {
        self.quote.is_isotope()
    }

    /// Isotopes can't live inside arrays. Array writers must call this
    /// before storing a cell.
    pub fn is_array_storable(&self) -> bool {
        !self.is_isotope()
    }

    pub fn is_protected(&self) -> bool {
        self.flags.contains(CellFlags::PROTECTED)
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(CellFlags::CONST)
    }

    /// Same heart/payload/sideband, a different quote byte -- used when
    /// reconstructing a cell's quote/quasi state from a separately-carried
    /// depth (e.g. deserializing [`crate::interchange::TypedCell`]).
    pub fn with_quote(&self, quote: QuoteByte) -> Cell {
        let mut out = self.clone();
        out.quote = quote;
        out
    }

    /// Evaluating a quasiform yields the corresponding isotope.
    pub fn decay_quasi(&self) -> Cell {
        debug_assert!(self.quote.is_quasi());
        let mut out = self.clone();
        out.quote = QuoteByte::ISOTOPE;
        out
    }

    /// One more level of literal quoting, e.g. turning a plain WORD! into
    /// the `'foo` a scanner would produce for a quoted-word literal.
    pub fn quote_once(&self) -> Cell {
        let mut out = self.clone();
        out.quote = self
            .quote
            .quoted()
            .expect("quote_once called at the maximum legal quote depth");
        out
    }

    /// Evaluating a quoted value removes one level of quoting without
    /// evaluating the unwrapped form -- a quoted value evaluates to itself,
    /// one quote lighter.
    pub fn unquote_one(&self) -> Cell {
        let mut out = self.clone();
        out.quote = self
            .quote
            .unquoted()
            .expect("unquote_one called on a non-quoted cell");
        out
    }

    /// Meta-quoting an isotope yields the quasiform; meta-quoting anything
    /// else just adds a quote.
    pub fn meta_quotify(&self) -> Cell {
        let mut out = self.clone();
        out.quote = if self.quote.is_isotope() {
            QuoteByte::PLAIN.quasi()
        } else {
            self.quote
                .quoted()
                .expect("meta-quoting overflowed quote depth")
        };
        out
    }

    /// Copy-cell identity: overwrites `self` with `src`'s heart, quote,
    /// payload, binding, and sideband, keeping whichever `PERSIST_MASK`
    /// flags were already set on `self` rather than adopting `src`'s.
    pub fn copy_from(&mut self, src: &Cell) {
        let persisted = self.flags.intersect(PERSIST_MASK);
        self.heart = src.heart;
        self.quote = src.quote;
        self.payload = src.payload.clone();
        self.extra = src.extra.clone();
        self.sideband = src.sideband.clone();
        self.flags = src.flags;
        self.flags.set(persisted.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValType {
    Heart(Heart),
    Quoted,
}

/// Structural equality for the copy-cell-identity check: same heart and
/// quote state, and payloads that match. Node payloads compare by identity
/// (`Rc::ptr_eq`) rather than deep structure -- a cell *references* a node,
/// it doesn't embed one, so two cells pointing at the same node are equal
/// even if nothing about the node's contents has been inspected.
pub fn cell_equals(a: &Cell, b: &Cell) -> bool {
    if a.heart != b.heart || a.quote != b.quote {
        return false;
    }
    match (&a.payload, &b.payload) {
        (Payload::Scalar(x), Payload::Scalar(y)) => x == y,
        (Payload::Node(x), Payload::Node(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_once_then_unquote_one_is_the_identity() {
        let original = Cell::integer(5);
        let quoted = original.quote_once();
        assert!(quoted.quote().is_quoted());
        assert_eq!(quoted.quote().quote_depth(), 1);
        let back = quoted.unquote_one();
        assert!(cell_equals(&back, &original));
    }

    #[test]
    fn quote_once_twice_then_unquote_twice_round_trips() {
        let original = Cell::logic(true);
        let twice = original.quote_once().quote_once();
        assert_eq!(twice.quote().quote_depth(), 2);
        let back = twice.unquote_one().unquote_one();
        assert!(cell_equals(&back, &original));
    }

    #[test]
    fn decaying_a_quasiform_yields_an_isotope_of_the_same_heart() {
        let plain = Cell::integer(9);
        let quasi = plain.with_quote(plain.quote().quasi());
        assert!(quasi.quote().is_quasi());
        let decayed = quasi.decay_quasi();
        assert!(decayed.is_isotope());
        assert_eq!(decayed.heart(), Heart::Integer);
        assert_eq!(decayed.payload().as_scalar(), Some(Scalar::Integer(9)));
    }

    #[test]
    fn copy_from_adopts_source_but_keeps_destination_persist_flags() {
        let mut dest = Cell::fresh();
        dest.flags_mut().set(CellFlags::PROTECTED);
        let src = Cell::integer(42);

        dest.copy_from(&src);

        assert!(cell_equals(&dest, &src));
        assert!(dest.is_protected());
    }

    #[test]
    fn copy_from_does_not_adopt_source_persist_flags() {
        let mut dest = Cell::fresh();
        let mut src = Cell::integer(1);
        src.flags_mut().set(CellFlags::PROTECTED);

        dest.copy_from(&src);

        assert!(!dest.is_protected());
    }

    #[test]
    fn cell_equals_compares_node_payloads_by_identity() {
        use crate::series::{Flavor, Series};
        let node: NodeRef = Rc::new(std::cell::RefCell::new(Series::new_array(Flavor::Array)));
        let a = Cell::new_node(Heart::Block, QuoteByte::PLAIN, node.clone());
        let b = Cell::new_node(Heart::Block, QuoteByte::PLAIN, node);
        let other = Cell::new_node(
            Heart::Block,
            QuoteByte::PLAIN,
            Rc::new(std::cell::RefCell::new(Series::new_array(Flavor::Array))),
        );
        assert!(cell_equals(&a, &b));
        assert!(!cell_equals(&a, &other));
    }
}
