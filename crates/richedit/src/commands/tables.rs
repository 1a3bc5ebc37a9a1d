// Copyright 2024 richedit contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Table commands: `insertTable`, `addRowBefore`/ `addRowAfter`,
//! `addColumnBefore`/`addColumnAfter`, `deleteRow`/
//! `deleteColumn`/`deleteTable`, `mergeCells`, `splitCell`,
//! `toggleHeaderRow`/`toggleHeaderColumn`, `isInTable`. The engine has no
//! rectangular cell-range selection model, so `mergeCells` is scoped to the
//! current cell and its next sibling in the same row, and `splitCell` reverses
//! exactly that shape.

use crate::model::mark::{AttrValue, Attrs};
use crate::model::node::Node;
use crate::model::position::ResolvedPos;
use crate::plugin::DispatchFn;
use crate::state::EditorState;

use super::{innermost_container_pos, resolve_head, run};

/// Finds the nearest ancestor of `type_name`, returning
/// `(depth, node, pos)` with the same `path[depth]` convention as
/// [`super::lists::enclosing_list`].
fn find_ancestor<'a>(resolved: &ResolvedPos<'a>, type_name: &str) -> Option<(usize, &'a Node, usize)> {
    for depth in (0..=resolved.depth()).rev() {
        let node = resolved.path()[depth].node;
        if node.node_type() == type_name {
            let pos = if depth == 0 { 0 } else { resolved.path()[depth - 1].offset };
            return Some((depth, node, pos));
        }
    }
    None
}

/// `isInTable(state)`: true if the caret sits anywhere inside a `table`.
pub fn is_in_table(state: &EditorState) -> bool {
    let resolved = resolve_head(state);
    find_ancestor(&resolved, "table").is_some()
}

fn empty_paragraph(state: &EditorState) -> Result<Node, crate::error::EngineError> {
    state.schema().node("paragraph", Attrs::new(), vec![], vec![])
}

fn build_row(state: &EditorState, cols: usize, header: bool) -> Result<Node, crate::error::EngineError> {
    let mut cells = Vec::with_capacity(cols);
    for _ in 0..cols {
        let mut attrs = Attrs::new();
        if header {
            attrs.insert("header".to_string(), AttrValue::Bool(true));
        }
        cells.push(state.schema().node("tableCell", attrs, vec![empty_paragraph(state)?], vec![])?);
    }
    state.schema().node("tableRow", Attrs::new(), cells, vec![])
}

/// `insertTable(rows, cols, withHeaderRow)`: inserts a new table as a
/// sibling block after the current block.
pub fn insert_table(
    rows: usize,
    cols: usize,
    with_header_row: bool,
) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        run(state, dispatch, |state, tr| {
            if rows == 0 || cols == 0 {
                return Ok(());
            }
            let resolved = resolve_head(state);
            let insert_pos = innermost_container_pos(&resolved)
                .map(|p| p + resolved.parent().node_size())
                .unwrap_or(state.selection().head);
            let mut table_rows = Vec::with_capacity(rows);
            for r in 0..rows {
                table_rows.push(build_row(state, cols, with_header_row && r == 0)?);
            }
            let table = state.schema().node("table", Attrs::new(), table_rows, vec![])?;
            tr.replace_range(insert_pos, insert_pos, vec![table])?;
            Ok(())
        })
    }
}

/// Shared implementation for `addRowBefore`/`addRowAfter`.
fn add_row(before: bool) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        run(state, dispatch, |state, tr| {
            let resolved = resolve_head(state);
            let Some((row_depth, row_node, row_pos)) = find_ancestor(&resolved, "tableRow") else {
                return Ok(());
            };
            let has_header = row_node.children().iter().any(|c| {
                c.attrs()
                    .and_then(|a| a.get("header"))
                    .and_then(AttrValue::as_bool)
                    .unwrap_or(false)
            });
            let new_row = build_row(state, row_node.children().len(), has_header)?;
            let at = if before { row_pos } else { row_pos + row_node.node_size() };
            let _ = row_depth;
            tr.replace_range(at, at, vec![new_row])?;
            Ok(())
        })
    }
}

pub fn add_row_before(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    add_row(true)(state, dispatch)
}

pub fn add_row_after(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    add_row(false)(state, dispatch)
}

/// Shared implementation for `addColumnBefore`/`addColumnAfter`: inserts
/// a new cell at the current column index into every row of the table.
fn add_column(before: bool) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        run(state, dispatch, |state, tr| {
            let resolved = resolve_head(state);
            let Some((cell_depth, _, _)) = find_ancestor(&resolved, "tableCell") else {
                return Ok(());
            };
            let Some((_, table_node, table_pos)) = find_ancestor(&resolved, "table") else {
                return Ok(());
            };
            // `path[cell_depth]`'s `.index` is the cell's slot within its row.
            let col_index = resolved.path()[cell_depth].index;

            let mut new_rows = Vec::with_capacity(table_node.children().len());
            for row in table_node.children() {
                let is_header_col = row
                    .children()
                    .get(col_index)
                    .and_then(|c| c.attrs())
                    .and_then(|a| a.get("header"))
                    .and_then(AttrValue::as_bool)
                    .unwrap_or(false);
                let mut attrs = Attrs::new();
                if is_header_col {
                    attrs.insert("header".to_string(), AttrValue::Bool(true));
                }
                let new_cell = state.schema().node("tableCell", attrs, vec![empty_paragraph(state)?], vec![])?;
                let mut children = row.children().to_vec();
                let insert_at = if before { col_index } else { col_index + 1 };
                let insert_at = insert_at.min(children.len());
                children.insert(insert_at, new_cell);
                new_rows.push(state.schema().node("tableRow", Attrs::new(), children, vec![])?);
            }
            let new_table = state.schema().node("table", table_node.attrs().cloned().unwrap_or_default(), new_rows, vec![])?;
            tr.replace_range(table_pos, table_pos + table_node.node_size(), vec![new_table])?;
            Ok(())
        })
    }
}

pub fn add_column_before(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    add_column(true)(state, dispatch)
}

pub fn add_column_after(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    add_column(false)(state, dispatch)
}

/// `deleteRow`: removes the current row; deletes the whole table if it
/// was the only row.
pub fn delete_row(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some((_, row_node, row_pos)) = find_ancestor(&resolved, "tableRow") else {
            return Ok(());
        };
        let Some((_, table_node, table_pos)) = find_ancestor(&resolved, "table") else {
            return Ok(());
        };
        if table_node.children().len() == 1 {
            tr.delete_range(table_pos, table_pos + table_node.node_size())?;
        } else {
            tr.delete_range(row_pos, row_pos + row_node.node_size())?;
        }
        Ok(())
    })
}

/// `deleteColumn`: removes the current column's cell from every row;
/// deletes the whole table if it was the only column.
pub fn delete_column(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some((cell_depth, _, _)) = find_ancestor(&resolved, "tableCell") else {
            return Ok(());
        };
        let Some((_, table_node, table_pos)) = find_ancestor(&resolved, "table") else {
            return Ok(());
        };
        let col_index = resolved.path()[cell_depth].index;
        if table_node.children()[0].children().len() == 1 {
            tr.delete_range(table_pos, table_pos + table_node.node_size())?;
            return Ok(());
        }
        let mut new_rows = Vec::with_capacity(table_node.children().len());
        for row in table_node.children() {
            let mut children = row.children().to_vec();
            if col_index < children.len() {
                children.remove(col_index);
            }
            new_rows.push(state.schema().node("tableRow", Attrs::new(), children, vec![])?);
        }
        let new_table = state.schema().node("table", table_node.attrs().cloned().unwrap_or_default(), new_rows, vec![])?;
        tr.replace_range(table_pos, table_pos + table_node.node_size(), vec![new_table])?;
        Ok(())
    })
}

/// `deleteTable`: removes the enclosing table entirely.
pub fn delete_table(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some((_, table_node, table_pos)) = find_ancestor(&resolved, "table") else {
            return Ok(());
        };
        tr.delete_range(table_pos, table_pos + table_node.node_size())?;
        Ok(())
    })
}

/// `mergeCells`: merges the current cell with its next sibling cell in
/// the same row, concatenating their block content and summing
/// `colspan`. A no-op on the last cell of a row.
pub fn merge_cells(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some((cell_depth, _, cell_pos)) = find_ancestor(&resolved, "tableCell") else {
            return Ok(());
        };
        let row_depth = cell_depth - 1;
        let row_node = resolved.path()[row_depth].node;
        let cell_index = resolved.path()[cell_depth].index;
        if cell_index + 1 >= row_node.children().len() {
            return Ok(());
        }
        let cell = &row_node.children()[cell_index];
        let next = &row_node.children()[cell_index + 1];

        let mut attrs = cell.attrs().cloned().unwrap_or_default();
        let colspan = attrs.get("colspan").and_then(AttrValue::as_i64).unwrap_or(1);
        let next_colspan = next.attrs().and_then(|a| a.get("colspan")).and_then(AttrValue::as_i64).unwrap_or(1);
        attrs.insert("colspan".to_string(), AttrValue::Int(colspan + next_colspan));

        let merged_children: Vec<Node> = cell.children().iter().cloned().chain(next.children().iter().cloned()).collect();
        let merged_cell = state.schema().node("tableCell", attrs, merged_children, vec![])?;
        tr.replace_range(cell_pos, cell_pos + cell.node_size() + next.node_size(), vec![merged_cell])?;
        Ok(())
    })
}

/// `splitCell`: reverses [`merge_cells`] — a cell with `colspan > 1` is
/// split back into one cell per unit of span, the first keeping all the
/// original content and the rest starting empty. A no-op on an
/// unmerged cell.
pub fn split_cell(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some((_, cell, cell_pos)) = find_ancestor(&resolved, "tableCell") else {
            return Ok(());
        };
        let colspan = cell.attrs().and_then(|a| a.get("colspan")).and_then(AttrValue::as_i64).unwrap_or(1);
        if colspan <= 1 {
            return Ok(());
        }
        let mut attrs = cell.attrs().cloned().unwrap_or_default();
        attrs.insert("colspan".to_string(), AttrValue::Int(1));
        let first = state.schema().node("tableCell", attrs, cell.children().to_vec(), vec![])?;

        let mut replacement = vec![first];
        for _ in 1..colspan {
            let mut attrs = cell.attrs().cloned().unwrap_or_default();
            attrs.insert("colspan".to_string(), AttrValue::Int(1));
            replacement.push(state.schema().node("tableCell", attrs, vec![empty_paragraph(state)?], vec![])?);
        }
        tr.replace_range(cell_pos, cell_pos + cell.node_size(), replacement)?;
        Ok(())
    })
}

/// `toggleHeaderRow`: toggles `header` on every cell of the current row.
pub fn toggle_header_row(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some((_, row_node, row_pos)) = find_ancestor(&resolved, "tableRow") else {
            return Ok(());
        };
        let currently_header = row_node.children().iter().all(|c| {
            c.attrs().and_then(|a| a.get("header")).and_then(AttrValue::as_bool).unwrap_or(false)
        });
        let mut cells = Vec::with_capacity(row_node.children().len());
        for cell in row_node.children() {
            let mut attrs = cell.attrs().cloned().unwrap_or_default();
            attrs.insert("header".to_string(), AttrValue::Bool(!currently_header));
            cells.push(state.schema().node("tableCell", attrs, cell.children().to_vec(), vec![])?);
        }
        let new_row = state.schema().node("tableRow", Attrs::new(), cells, vec![])?;
        tr.replace_range(row_pos, row_pos + row_node.node_size(), vec![new_row])?;
        Ok(())
    })
}

/// `toggleHeaderColumn`: toggles `header` on every cell of the current
/// column, across all rows of the table.
pub fn toggle_header_column(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some((cell_depth, _, _)) = find_ancestor(&resolved, "tableCell") else {
            return Ok(());
        };
        let Some((_, table_node, table_pos)) = find_ancestor(&resolved, "table") else {
            return Ok(());
        };
        let col_index = resolved.path()[cell_depth].index;
        let currently_header = table_node.children().iter().all(|row| {
            row.children()
                .get(col_index)
                .and_then(|c| c.attrs())
                .and_then(|a| a.get("header"))
                .and_then(AttrValue::as_bool)
                .unwrap_or(false)
        });
        let mut new_rows = Vec::with_capacity(table_node.children().len());
        for row in table_node.children() {
            let mut cells = Vec::with_capacity(row.children().len());
            for (i, cell) in row.children().iter().enumerate() {
                if i == col_index {
                    let mut attrs = cell.attrs().cloned().unwrap_or_default();
                    attrs.insert("header".to_string(), AttrValue::Bool(!currently_header));
                    cells.push(state.schema().node("tableCell", attrs, cell.children().to_vec(), vec![])?);
                } else {
                    cells.push(cell.clone());
                }
            }
            new_rows.push(state.schema().node("tableRow", Attrs::new(), cells, vec![])?);
        }
        let new_table = state.schema().node("table", table_node.attrs().cloned().unwrap_or_default(), new_rows, vec![])?;
        tr.replace_range(table_pos, table_pos + table_node.node_size(), vec![new_table])?;
        Ok(())
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::selection::Selection;
    use crate::schema::default_schema::default_schema;
    use crate::state::ContentInit;

    fn empty_state() -> EditorState {
        EditorState::create(default_schema(), None, None).unwrap()
    }

    fn state_with_table(rows: usize, cols: usize) -> EditorState {
        let state = empty_state();
        let mut dispatched = None;
        assert!(insert_table(rows, cols, true)(&state, Some(&mut |tr| dispatched = Some(tr))));
        state.apply(dispatched.unwrap()).unwrap().state
    }

    #[test]
    fn insert_table_builds_rows_and_cols() {
        let state = state_with_table(2, 3);
        let table = &state.doc().children()[0];
        assert_eq!(table.node_type(), "table");
        assert_eq!(table.children().len(), 2);
        assert_eq!(table.children()[0].children().len(), 3);
    }

    #[test]
    fn is_in_table_detects_cursor_inside_cell() {
        let state = state_with_table(1, 1);
        // cursor at 0 is outside the table (before it); move inside the
        // first cell's paragraph content.
        let inside = EditorState::create(
            (**state.schema()).clone(),
            Some(ContentInit::Doc(state.doc().clone())),
            Some(Selection::cursor(4)),
        )
        .unwrap();
        assert!(is_in_table(&inside));
    }

    #[test]
    fn add_row_after_grows_table() {
        let state = state_with_table(1, 2);
        let cursor_state = EditorState::create(
            (**state.schema()).clone(),
            Some(ContentInit::Doc(state.doc().clone())),
            Some(Selection::cursor(4)),
        )
        .unwrap();
        let mut dispatched = None;
        assert!(add_row_after(&cursor_state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert_eq!(tr.doc().children()[0].children().len(), 2);
    }

    #[test]
    fn delete_table_removes_sole_table() {
        let state = state_with_table(1, 1);
        let cursor_state = EditorState::create(
            (**state.schema()).clone(),
            Some(ContentInit::Doc(state.doc().clone())),
            Some(Selection::cursor(4)),
        )
        .unwrap();
        let mut dispatched = None;
        assert!(delete_table(&cursor_state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert!(tr.doc().children().is_empty() || tr.doc().children()[0].node_type() != "table");
    }
}
