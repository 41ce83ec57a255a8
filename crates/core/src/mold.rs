//! Persistent (molded) textual forms.
//!
//! Molded forms must round-trip for all plain unquoted values except
//! functions, handles, and cyclic structures. Quoted forms render with a
//! leading apostrophe sequence; quasiforms with surrounding tildes;
//! isotopes have no textual form and render as commentary.
//!
//! Parsing molded text back into cells is the scanner/lexer's job, which
//! is out of scope for this crate. `unmold_scalar` here is a narrow helper
//! -- not a scanner -- that round-trips only the handful of scalar hearts
//! needed to exercise the mold/unmold round-trip without a real lexer.

use crate::cell::{Cell, Heart, Scalar};

pub fn mold(cell: &Cell) -> String {
    if cell.is_isotope() {
        return format!("~{}~ ; isotope", mold_heart_body(cell));
    }
    if cell.quote().is_quasi() {
        return format!("~{}~", mold_heart_body(cell));
    }
    let depth = cell.quote().quote_depth();
    let sigils = "'".repeat(depth as usize);
    format!("{sigils}{}", mold_heart_body(cell))
}

fn mold_heart_body(cell: &Cell) -> String {
    match cell.heart() {
        Heart::Blank => "_".to_string(),
        Heart::Logic => match cell.payload().as_scalar() {
            Some(Scalar::Logic(b)) => b.to_string(),
            _ => "?logic?".to_string(),
        },
        Heart::Integer => match cell.payload().as_scalar() {
            Some(Scalar::Integer(n)) => n.to_string(),
            _ => "?integer?".to_string(),
        },
        Heart::Decimal => match cell.payload().as_scalar() {
            Some(Scalar::Decimal(d)) => {
                if d.fract() == 0.0 {
                    format!("{d:.1}")
                } else {
                    d.to_string()
                }
            }
            _ => "?decimal?".to_string(),
        },
        Heart::Pair => match cell.payload().as_scalar() {
            Some(Scalar::Pair(x, y)) => format!("{x}x{y}"),
            _ => "?pair?".to_string(),
        },
        Heart::Word => cell
            .symbol()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "?word?".to_string()),
        Heart::Block => mold_array(cell, '[', ']'),
        Heart::Group => mold_array(cell, '(', ')'),
        Heart::Path => mold_array(cell, '/', '/'),
        Heart::Text => "\"...\"".to_string(),
        Heart::Bitset => "#[bitset!]".to_string(),
        Heart::Handle => "#[handle!]".to_string(), // handles never round-trip
        Heart::Typeset => "#[typeset!]".to_string(),
        Heart::Datatype => "#[datatype!]".to_string(),
        Heart::Action => "#[action!]".to_string(), // functions never round-trip
        Heart::Frame => "#[frame!]".to_string(),
    }
}

fn mold_array(cell: &Cell, open: char, close: char) -> String {
    let Some(node) = cell.payload().as_node() else {
        return format!("{open}{close}");
    };
    let borrowed = node.borrow();
    let Some(series) = borrowed.as_any().downcast_ref::<crate::series::Series>() else {
        return format!("{open}{close}");
    };
    let items: Vec<String> = series.cells().iter().map(mold).collect();
    format!("{open}{}{close}", items.join(" "))
}

/// Round-trips `blank!`, `logic!`, and `integer!` literal text -- the
/// subset of hearts this crate tests the mold/unmold round-trip against
/// without a scanner.
pub fn unmold_scalar(text: &str) -> Option<Cell> {
    let text = text.trim();
    match text {
        "_" => return Some(Cell::blank()),
        "true" => return Some(Cell::logic(true)),
        "false" => return Some(Cell::logic(false)),
        _ => {}
    }
    text.parse::<i64>().ok().map(Cell::integer)
}

/// `unquote(quote(v)) == v` for quote depth <= 126.
pub fn quote_unquote_identity(cell: &Cell) -> bool {
    let Some(bumped) = cell.quote().quoted() else {
        return true; // already at the quote-depth ceiling; law is vacuous here
    };
    let quoted = Cell::new_scalar(
        cell.heart(),
        bumped,
        cell.payload().as_scalar().unwrap_or(Scalar::None),
    );
    quoted.quote().unquoted() == Some(cell.quote())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn molds_plain_scalars() {
        assert_eq!(mold(&Cell::integer(42)), "42");
        assert_eq!(mold(&Cell::logic(true)), "true");
        assert_eq!(mold(&Cell::blank()), "_");
    }

    #[test]
    fn molds_quoted_form_with_leading_sigils() {
        let mut c = Cell::integer(7);
        let q = c.quote().quoted().unwrap().quoted().unwrap();
        c = Cell::new_scalar(c.heart(), q, Scalar::Integer(7));
        assert_eq!(mold(&c), "''7");
    }

    #[test]
    fn round_trips_integer_and_blank() {
        for text in ["42", "-7", "_", "true", "false"] {
            let cell = unmold_scalar(text).unwrap();
            assert_eq!(mold(&cell), text);
        }
    }
}
