//! Feed: the cursor an executor advances over as it consumes input. An
//! array feed walks a block/group's cells in order; a variadic feed (used
//! by the host embedding API) walks a queue of cells supplied live rather
//! than pre-assembled into an array.

use rebel_core::{Cell, Flavor, NodeRef};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug)]
pub enum Feed {
    Array { node: NodeRef, index: usize },
    Variadic { items: VecDeque<Cell> },
}

pub type FeedRef = Rc<RefCell<Feed>>;

impl Feed {
    pub fn from_array(node: NodeRef) -> FeedRef {
        Rc::new(RefCell::new(Feed::Array { node, index: 0 }))
    }

    pub fn from_items(items: Vec<Cell>) -> FeedRef {
        Rc::new(RefCell::new(Feed::Variadic {
            items: items.into(),
        }))
    }

    pub fn is_end(&self) -> bool {
        match self {
            Feed::Array { node, index } => {
                let s = rebel_core::node::downcast_ref::<rebel_core::Series>(node);
                debug_assert!(matches!(s.flavor(), Flavor::Array));
                s.is_end(*index)
            }
            Feed::Variadic { items } => items.is_empty(),
        }
    }

    /// The cell under the cursor without consuming it ("lookahead").
    pub fn current(&self) -> Option<Cell> {
        match self {
            Feed::Array { node, index } => {
                let s = rebel_core::node::downcast_ref::<rebel_core::Series>(node);
                s.cell_at(*index).cloned()
            }
            Feed::Variadic { items } => items.front().cloned(),
        }
    }

    /// Consume the cell under the cursor and advance past it.
    pub fn fetch_next(&mut self) -> Option<Cell> {
        match self {
            Feed::Array { node, index } => {
                let s = rebel_core::node::downcast_ref::<rebel_core::Series>(node);
                let cell = s.cell_at(*index).cloned();
                drop(s);
                if cell.is_some() {
                    *index += 1;
                }
                cell
            }
            Feed::Variadic { items } => items.pop_front(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebel_core::series::new_array_node;

    #[test]
    fn array_feed_walks_in_order_then_ends() {
        let node = new_array_node(Flavor::Array);
        {
            let mut s = rebel_core::node::downcast_mut::<rebel_core::Series>(&node);
            s.push_cell(Cell::integer(1));
            s.push_cell(Cell::integer(2));
        }
        let feed = Feed::from_array(node);
        assert_eq!(
            feed.borrow_mut().fetch_next().unwrap().heart(),
            rebel_core::Heart::Integer
        );
        assert!(!feed.borrow().is_end());
        feed.borrow_mut().fetch_next();
        assert!(feed.borrow().is_end());
        assert!(feed.borrow_mut().fetch_next().is_none());
    }

    #[test]
    fn variadic_feed_drains_supplied_items() {
        let feed = Feed::from_items(vec![Cell::integer(9)]);
        assert!(!feed.borrow().is_end());
        assert_eq!(feed.borrow_mut().fetch_next().unwrap().heart(), rebel_core::Heart::Integer);
        assert!(feed.borrow().is_end());
    }
}
