//! Structural (non-textual) serialization of cells for host interchange.
//!
//! [`Cell`] itself holds `Rc<RefCell<dyn Node>>` payloads, which aren't
//! `Serialize`. `TypedCell` is an owned, serializable shadow of the cell
//! lattice, adapted from value variants to hearts. Actions, handles, and
//! frames never round-trip, matching how closures, quotations, and opaque
//! resources refuse serialization elsewhere in this codebase.

use crate::cell::{Cell, Heart, Scalar};
use crate::node::downcast_ref;
use crate::series::Series;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum InterchangeError {
    /// Functions are code, not data.
    ActionNotSerializable,
    HandleNotSerializable,
    FrameNotSerializable,
    Bincode(Box<bincode::Error>),
}

impl std::fmt::Display for InterchangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterchangeError::ActionNotSerializable => {
                write!(f, "action! values cannot be serialized -- code is not data")
            }
            InterchangeError::HandleNotSerializable => {
                write!(f, "handle! values cannot be serialized -- opaque host resource")
            }
            InterchangeError::FrameNotSerializable => {
                write!(f, "frame! values cannot be serialized -- a live activation record")
            }
            InterchangeError::Bincode(e) => write!(f, "bincode error: {e}"),
        }
    }
}

impl std::error::Error for InterchangeError {}

impl From<bincode::Error> for InterchangeError {
    fn from(e: bincode::Error) -> Self {
        InterchangeError::Bincode(Box::new(e))
    }
}

/// Owned, serializable shadow of a plain (non-isotope) cell's value.
/// Quote depth and quasi status ride alongside as a separate field rather
/// than as a variant, since every heart can carry either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedCell {
    pub quote_depth: u8,
    pub is_quasi: bool,
    pub body: TypedBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedBody {
    Blank,
    Logic(bool),
    Integer(i64),
    Decimal(f64),
    Pair(i32, i32),
    Word(String),
    Block(Vec<TypedCell>),
    Group(Vec<TypedCell>),
    Path(Vec<TypedCell>),
    Text(String),
}

impl TryFrom<&Cell> for TypedCell {
    type Error = InterchangeError;

    fn try_from(cell: &Cell) -> Result<Self, Self::Error> {
        let body = match cell.heart() {
            Heart::Blank => TypedBody::Blank,
            Heart::Logic => TypedBody::Logic(expect_logic(cell)),
            Heart::Integer => TypedBody::Integer(expect_integer(cell)),
            Heart::Decimal => TypedBody::Decimal(expect_decimal(cell)),
            Heart::Pair => {
                let (x, y) = expect_pair(cell);
                TypedBody::Pair(x, y)
            }
            Heart::Word => TypedBody::Word(
                cell.symbol()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
            ),
            Heart::Block => TypedBody::Block(array_items(cell)?),
            Heart::Group => TypedBody::Group(array_items(cell)?),
            Heart::Path => TypedBody::Path(array_items(cell)?),
            Heart::Text => TypedBody::Text("...".to_string()), // string byte contents out of scope
            Heart::Action => return Err(InterchangeError::ActionNotSerializable),
            Heart::Handle => return Err(InterchangeError::HandleNotSerializable),
            Heart::Frame => return Err(InterchangeError::FrameNotSerializable),
            Heart::Bitset | Heart::Typeset | Heart::Datatype => TypedBody::Blank,
        };
        Ok(TypedCell {
            quote_depth: cell.quote().quote_depth(),
            is_quasi: cell.quote().is_quasi(),
            body,
        })
    }
}

fn array_items(cell: &Cell) -> Result<Vec<TypedCell>, InterchangeError> {
    let Some(node) = cell.payload().as_node() else {
        return Ok(Vec::new());
    };
    let series = downcast_ref::<Series>(node);
    series.cells().iter().map(TypedCell::try_from).collect()
}

fn expect_logic(cell: &Cell) -> bool {
    matches!(cell.payload().as_scalar(), Some(Scalar::Logic(b)) if b)
}

fn expect_integer(cell: &Cell) -> i64 {
    match cell.payload().as_scalar() {
        Some(Scalar::Integer(n)) => n,
        _ => 0,
    }
}

fn expect_decimal(cell: &Cell) -> f64 {
    match cell.payload().as_scalar() {
        Some(Scalar::Decimal(d)) => d,
        _ => 0.0,
    }
}

fn expect_pair(cell: &Cell) -> (i32, i32) {
    match cell.payload().as_scalar() {
        Some(Scalar::Pair(x, y)) => (x, y),
        _ => (0, 0),
    }
}

/// Encode a cell to its bincode wire form for host interchange.
pub fn encode(cell: &Cell) -> Result<Vec<u8>, InterchangeError> {
    let typed = TypedCell::try_from(cell)?;
    Ok(bincode::serialize(&typed)?)
}

/// Decode a cell previously produced by [`encode`] back into a plain
/// (unbound) cell tree.
pub fn decode(bytes: &[u8]) -> Result<Cell, InterchangeError> {
    let typed: TypedCell = bincode::deserialize(bytes)?;
    Ok(typed.into_cell())
}

impl TypedCell {
    pub fn into_cell(self) -> Cell {
        let plain = match self.body {
            TypedBody::Blank => Cell::blank(),
            TypedBody::Logic(b) => Cell::logic(b),
            TypedBody::Integer(n) => Cell::integer(n),
            TypedBody::Decimal(d) => Cell::decimal(d),
            TypedBody::Pair(x, y) => {
                Cell::new_scalar(Heart::Pair, crate::cell::QuoteByte::PLAIN, Scalar::Pair(x, y))
            }
            TypedBody::Word(name) => Cell::word(crate::cell::Symbol::new(name), crate::cell::Binding::Unbound),
            TypedBody::Block(items) => rebuild_array(Heart::Block, items),
            TypedBody::Group(items) => rebuild_array(Heart::Group, items),
            TypedBody::Path(items) => rebuild_array(Heart::Path, items),
            TypedBody::Text(_) => Cell::blank(),
        };
        requote(plain, self.quote_depth, self.is_quasi)
    }
}

fn rebuild_array(heart: Heart, items: Vec<TypedCell>) -> Cell {
    let node = crate::series::new_array_node(crate::series::Flavor::Array);
    {
        let mut s = crate::node::downcast_mut::<Series>(&node);
        for item in items {
            s.push_cell(item.into_cell());
        }
    }
    Cell::new_node(heart, crate::cell::QuoteByte::PLAIN, node)
}

fn requote(cell: Cell, quote_depth: u8, is_quasi: bool) -> Cell {
    let mut quote = crate::cell::QuoteByte::PLAIN;
    for _ in 0..quote_depth {
        quote = quote.quoted().unwrap_or(quote);
    }
    let quote = if is_quasi { quote.quasi() } else { quote };
    cell.with_quote(quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_an_integer_through_bincode() {
        let cell = Cell::integer(42);
        let bytes = encode(&cell).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(back.heart(), Heart::Integer);
        assert_eq!(back.payload().as_scalar(), Some(Scalar::Integer(42)));
    }

    #[test]
    fn round_trips_a_block_of_mixed_scalars() {
        let node = crate::series::new_array_node(crate::series::Flavor::Array);
        {
            let mut s = crate::node::downcast_mut::<Series>(&node);
            s.push_cell(Cell::integer(1));
            s.push_cell(Cell::logic(true));
            s.push_cell(Cell::blank());
        }
        let block = Cell::new_node(Heart::Block, crate::cell::QuoteByte::PLAIN, node);
        let bytes = encode(&block).unwrap();
        let back = decode(&bytes).unwrap();
        let back_node = back.payload().as_node().cloned().unwrap();
        let series = downcast_ref::<Series>(&back_node);
        assert_eq!(series.cells().len(), 3);
    }

    #[test]
    fn refuses_to_serialize_an_action() {
        let node = crate::series::new_array_node(crate::series::Flavor::Array);
        let action_like = Cell::new_node(Heart::Action, crate::cell::QuoteByte::PLAIN, node);
        assert!(matches!(
            TypedCell::try_from(&action_like),
            Err(InterchangeError::ActionNotSerializable)
        ));
    }
}
