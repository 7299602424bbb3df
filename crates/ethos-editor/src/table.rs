//! Table construction and growth
//!
//! Growth operations check the table is rectangular before touching it, so
//! a refused operation leaves the tree exactly as it was.

use ethos_core::{tags, Document, Element, Fragment, FragmentNode, NodeId, Position, Selection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TableStyle;
use crate::error::{EditorError, Result};
use crate::locator::find_selection_ancestor;

/// Row and column counts of a rectangular table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    pub rows: usize,
    pub cols: usize,
}

/// Build a `rows` x `cols` grid of empty cells followed by an empty paragraph
pub fn build_table(rows: usize, cols: usize, style: &TableStyle) -> Result<Fragment> {
    if rows == 0 || cols == 0 {
        return Err(EditorError::InvalidTableSize { rows, cols });
    }

    let mut table = FragmentNode::element(tags::TABLE)
        .with_style("width", "100%")
        .with_style("border-collapse", "collapse")
        .with_style("border", style.border.as_str())
        .with_style("margin", style.margin.as_str())
        .with_style("table-layout", "fixed");
    for _ in 0..rows {
        let mut row = FragmentNode::element(tags::TR);
        for _ in 0..cols {
            row = row.with_child(cell_fragment(style));
        }
        table = table.with_child(row);
    }

    Ok(Fragment::new()
        .with(table)
        .with(FragmentNode::element(tags::P)))
}

fn cell_fragment(style: &TableStyle) -> FragmentNode {
    FragmentNode::Element {
        element: cell_element(style),
        children: Vec::new(),
    }
}

fn cell_element(style: &TableStyle) -> Element {
    Element::new(tags::TD)
        .with_style("border", style.border.as_str())
        .with_style("padding", style.cell_padding.as_str())
        .with_style("min-height", "40px")
        .with_style("vertical-align", "top")
}

/// The table the selection anchor sits in
pub fn table_in_scope(doc: &Document, selection: Option<&Selection>) -> Result<NodeId> {
    find_selection_ancestor(doc, selection, tags::TABLE).ok_or(EditorError::NoTableInScope)
}

/// Rows of `table` in order, looking through `thead`/`tbody`/`tfoot`
///
/// Rows of tables nested inside cells are not included.
pub fn rows(doc: &Document, table: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    for child in doc.children(table) {
        match doc.tag(*child) {
            Some(tags::TR) => out.push(*child),
            Some(tag) if tags::is_row_group(tag) => out.extend(
                doc.children(*child)
                    .iter()
                    .filter(|c| doc.has_tag(**c, tags::TR))
                    .copied(),
            ),
            _ => {}
        }
    }
    out
}

/// Cells of a row in order
pub fn cells(doc: &Document, row: NodeId) -> Vec<NodeId> {
    doc.children(row)
        .iter()
        .filter(|c| doc.tag(**c).is_some_and(tags::is_cell))
        .copied()
        .collect()
}

/// Shape of `table`, or `IrregularTable` when its rows differ in length
pub fn shape(doc: &Document, table: NodeId) -> Result<TableShape> {
    let rows = rows(doc, table);
    let mut counts = rows.iter().map(|row| cells(doc, *row).len());
    let cols = counts.next().unwrap_or(0);
    if counts.any(|count| count != cols) {
        return Err(EditorError::IrregularTable);
    }
    Ok(TableShape {
        rows: rows.len(),
        cols,
    })
}

/// Append a row matching the first row's cell count
///
/// New cells are empty and copy the attributes and style of the cell above.
pub fn add_row(doc: &mut Document, table: NodeId) -> Result<TableShape> {
    let current = shape(doc, table)?;
    let row_ids = rows(doc, table);

    let (row, parent) = match row_ids.last() {
        Some(last) => {
            let parent = doc.parent(*last).unwrap_or(table);
            let row = doc.shallow_clone(*last)?;
            for above in cells(doc, *last) {
                let cell = doc.shallow_clone(above)?;
                doc.append_child(row, cell)?;
            }
            (row, parent)
        }
        None => (doc.create_element(Element::new(tags::TR)), table),
    };
    doc.append_child(parent, row)?;

    debug!("Added row to table {}", table);
    Ok(TableShape {
        rows: current.rows + 1,
        cols: current.cols,
    })
}

/// Append one cell to every row
pub fn add_column(doc: &mut Document, table: NodeId, style: &TableStyle) -> Result<TableShape> {
    let current = shape(doc, table)?;

    for row in rows(doc, table) {
        let cell = match cells(doc, row).last() {
            Some(last) => doc.shallow_clone(*last)?,
            None => doc.create_element(cell_element(style)),
        };
        doc.append_child(row, cell)?;
    }

    debug!("Added column to table {}", table);
    Ok(TableShape {
        rows: current.rows,
        cols: current.cols + 1,
    })
}

/// Remove `table`, returning the slot it occupied
pub fn delete_table(doc: &mut Document, table: NodeId) -> Result<Position> {
    let parent = doc
        .parent(table)
        .ok_or(ethos_core::CoreError::NodeNotFound(table))?;
    let index = doc.index_in_parent(table).unwrap_or(0);
    doc.remove(table)?;
    debug!("Deleted table {}", table);
    Ok(Position::new(parent, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(markup: &str) -> (Document, NodeId) {
        let doc = Document::from_markup(markup).unwrap();
        let table = doc
            .descendants(doc.root())
            .into_iter()
            .find(|id| doc.has_tag(*id, tags::TABLE))
            .unwrap();
        (doc, table)
    }

    fn inserted(rows: usize, cols: usize) -> (Document, NodeId) {
        let fragment = build_table(rows, cols, &TableStyle::default()).unwrap();
        let mut doc = Document::new();
        let root = doc.root();
        let ids = doc.insert_fragment(root, 0, &fragment).unwrap();
        (doc, ids[0])
    }

    #[test]
    fn test_build_table_shape() {
        let (doc, table) = inserted(3, 4);
        assert_eq!(shape(&doc, table).unwrap(), TableShape { rows: 3, cols: 4 });

        for row in rows(&doc, table) {
            for cell in cells(&doc, row) {
                assert!(doc.children(cell).is_empty());
                assert_eq!(doc.element(cell).unwrap().style.get("vertical-align"), Some("top"));
            }
        }
        let root_children = doc.children(doc.root());
        assert_eq!(root_children.len(), 2);
        assert!(doc.has_tag(root_children[1], tags::P));
    }

    #[test]
    fn test_build_table_rejects_empty_sizes() {
        assert!(matches!(
            build_table(0, 3, &TableStyle::default()),
            Err(EditorError::InvalidTableSize { rows: 0, cols: 3 })
        ));
        assert!(build_table(2, 0, &TableStyle::default()).is_err());
    }

    #[test]
    fn test_build_table_markup() {
        let (doc, _) = inserted(1, 1);
        assert_eq!(
            doc.to_markup(),
            "<table style=\"width: 100%; border-collapse: collapse; border: 1px solid #cbd5e1; \
             margin: 15px 0; table-layout: fixed\"><tr><td style=\"border: 1px solid #cbd5e1; \
             padding: 12px; min-height: 40px; vertical-align: top\"></td></tr></table><p></p>"
        );
    }

    #[test]
    fn test_add_row_copies_cells_above() {
        let (mut doc, table) = grid(
            "<table><tbody><tr><td>a</td><td class=\"n\" style=\"padding: 4px\">1</td></tr></tbody></table>",
        );
        let shape = add_row(&mut doc, table).unwrap();

        assert_eq!(shape, TableShape { rows: 2, cols: 2 });
        assert_eq!(
            doc.to_markup(),
            "<table><tbody><tr><td>a</td><td class=\"n\" style=\"padding: 4px\">1</td></tr>\
             <tr><td></td><td class=\"n\" style=\"padding: 4px\"></td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_add_column_extends_every_row() {
        let (mut doc, table) = inserted(2, 3);
        add_column(&mut doc, table, &TableStyle::default()).unwrap();
        assert_eq!(shape(&doc, table).unwrap(), TableShape { rows: 2, cols: 4 });

        add_row(&mut doc, table).unwrap();
        assert_eq!(shape(&doc, table).unwrap(), TableShape { rows: 3, cols: 4 });
    }

    #[test]
    fn test_grow_every_size() {
        for r in 1..=5 {
            for c in 1..=5 {
                let (mut doc, table) = inserted(r, c);
                assert_eq!(shape(&doc, table).unwrap(), TableShape { rows: r, cols: c });
                assert_eq!(rows(&doc, table).len(), r);

                let grown = add_column(&mut doc, table, &TableStyle::default()).unwrap();
                assert_eq!(grown, TableShape { rows: r, cols: c + 1 });
                for row in rows(&doc, table) {
                    assert_eq!(cells(&doc, row).len(), c + 1);
                }

                let grown = add_row(&mut doc, table).unwrap();
                assert_eq!(grown, TableShape { rows: r + 1, cols: c + 1 });
                assert_eq!(shape(&doc, table).unwrap(), grown);
                for row in rows(&doc, table) {
                    assert!(cells(&doc, row).iter().all(|cell| doc.children(*cell).is_empty()));
                }
            }
        }
    }

    #[test]
    fn test_irregular_table_is_untouched() {
        let (mut doc, table) = grid("<table><tr><td>1</td><td>2</td></tr><tr><td>3</td></tr></table>");
        let before = doc.to_markup();

        assert!(matches!(
            add_column(&mut doc, table, &TableStyle::default()),
            Err(EditorError::IrregularTable)
        ));
        assert!(matches!(
            add_row(&mut doc, table),
            Err(EditorError::IrregularTable)
        ));
        assert_eq!(doc.to_markup(), before);
    }

    #[test]
    fn test_nested_table_rows_are_separate() {
        let (doc, outer) = grid(
            "<table><tr><td><table><tr><td>x</td><td>y</td><td>z</td></tr></table></td></tr></table>",
        );
        assert_eq!(shape(&doc, outer).unwrap(), TableShape { rows: 1, cols: 1 });
    }

    #[test]
    fn test_empty_table_gets_a_row() {
        let (mut doc, table) = grid("<table></table>");
        assert_eq!(shape(&doc, table).unwrap(), TableShape { rows: 0, cols: 0 });
        add_row(&mut doc, table).unwrap();
        assert_eq!(doc.to_markup(), "<table><tr></tr></table>");
    }

    #[test]
    fn test_delete_table_returns_slot() {
        let (mut doc, table) = grid("<p>a</p><table><tr><td>1</td></tr></table><p>b</p>");
        let slot = delete_table(&mut doc, table).unwrap();

        assert_eq!(doc.to_markup(), "<p>a</p><p>b</p>");
        assert_eq!(slot, Position::new(doc.root(), 1));
    }

    #[test]
    fn test_table_in_scope() {
        let (doc, table) = grid("<table><tr><td>in</td></tr></table><p>out</p>");
        let texts: Vec<NodeId> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|id| doc.is_text(*id))
            .collect();

        let inside = Selection::caret(Position::new(texts[0], 1));
        let outside = Selection::caret(Position::new(texts[1], 1));
        assert_eq!(table_in_scope(&doc, Some(&inside)).unwrap(), table);
        assert!(matches!(
            table_in_scope(&doc, Some(&outside)),
            Err(EditorError::NoTableInScope)
        ));
    }
}
