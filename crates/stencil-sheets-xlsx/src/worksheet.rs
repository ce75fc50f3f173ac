//! Worksheet expansion
//!
//! Rows are cloned out of the template's `<sheetData>` one at a time. Each
//! template row is first planned (which cells are placeholders and what they
//! resolve to), then emitted once per table element. Columns produced by
//! plain arrays push the rest of their row to the right. Every insertion is
//! recorded in an [`Insertions`] log, which then moves merged cells and the
//! other range-bearing elements of the sheet.

use log::{debug, trace, warn};
use stencil_sheets_core::placeholder::{contains_placeholder, sole_placeholder};
use stencil_sheets_core::{
    cell_ref, classify, index_to_letters, Accessor, CellAddress, CellContent, CellRange,
    Insertions, Value, MAX_COLS, MAX_ROWS,
};

use crate::render::RenderOptions;
use crate::shared_strings::{item_text, substitute_text, text_element, EntryPlan, SharedStringTable};
use crate::xml::{Document, Element, Node};

/// Offsets accumulated while emitting a worksheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffsetState {
    /// Extra rows emitted so far above the current template row
    pub row_offset: u32,
    /// Extra columns emitted so far to the left of the current cell
    pub cell_offset: u32,
}

/// What a planned cell turns into
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Template cell copied with a new address
    Copy,
    /// Formula cell; `<f>` kept
    Formula,
    /// One value
    Single(Option<CellContent>),
    /// Plain sequence spread over adjacent columns
    Columns(Vec<Option<CellContent>>),
    /// `table:` sequence, one element per emitted row
    Rows(Vec<Option<CellContent>>),
}

#[derive(Debug, Clone)]
struct PlannedCell {
    /// Rendered 1-based column of the first emitted cell
    col: u32,
    template_col: u32,
    template: Element,
    slot: Slot,
}

/// The plan for one template row
#[derive(Debug, Clone)]
pub struct RowPlan {
    template_row: u32,
    element: Element,
    cells: Vec<PlannedCell>,
    trailing: Vec<Node>,
    widened: bool,
}

impl RowPlan {
    /// 1-based row number in the template
    pub fn template_row(&self) -> u32 {
        self.template_row
    }

    /// Number of rows this template row becomes: the longest table
    /// sequence, and at least one
    pub fn multiplicity(&self) -> usize {
        self.cells
            .iter()
            .filter_map(|cell| match &cell.slot {
                Slot::Rows(items) => Some(items.len()),
                _ => None,
            })
            .max()
            .unwrap_or(1)
            .max(1)
    }

    /// Slots in cell order
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.cells.iter().map(|cell| &cell.slot)
    }
}

/// A worksheet after expansion
#[derive(Debug, Clone)]
pub struct ExpandedSheet {
    /// The rebuilt worksheet part
    pub document: Document,
    /// Rows and columns inserted, in template coordinates
    pub insertions: Insertions,
    /// Rows in the template
    pub rows_in: usize,
    /// Rows emitted
    pub rows_out: usize,
}

/// Expands one worksheet at a time against a data context
pub struct WorksheetExpander<'a> {
    strings: &'a mut SharedStringTable,
    data: &'a Value,
    options: &'a RenderOptions,
}

impl<'a> WorksheetExpander<'a> {
    /// Create an expander sharing the run's string table
    pub fn new(
        strings: &'a mut SharedStringTable,
        data: &'a Value,
        options: &'a RenderOptions,
    ) -> Self {
        Self {
            strings,
            data,
            options,
        }
    }

    /// Expand a parsed worksheet
    pub fn expand(&mut self, template: &Document) -> ExpandedSheet {
        let mut document = template.clone();
        let mut insertions = Insertions::new();
        let mut state = OffsetState::default();
        let mut rows_in = 0;
        let mut rows_out = 0;

        if let Some(sheet_data) = document.root.child_mut("sheetData") {
            let template_rows = std::mem::take(&mut sheet_data.children);
            let mut next_row = 1;
            // (row index, cell index, template range) of formula ranges to move
            let mut formula_refs = Vec::new();

            for node in template_rows {
                let Node::Element(row) = node else {
                    continue;
                };
                if row.name != "row" {
                    sheet_data.children.push(Node::Element(row));
                    continue;
                }

                let template_row = match row.attr("r").and_then(|r| r.parse::<u32>().ok()) {
                    Some(r) if r > 0 => r,
                    _ => {
                        warn!("row without a valid number; treating it as row {next_row}");
                        next_row
                    }
                };
                next_row = template_row + 1;

                state.cell_offset = 0;
                let plan = self.plan_row(&row, template_row, &mut state, &mut insertions);
                let multiplicity = plan.multiplicity();

                let mut emitted = 0;
                for copy in 0..multiplicity {
                    let out_row = template_row + state.row_offset + copy as u32;
                    if out_row > MAX_ROWS {
                        warn!(
                            "row {template_row}: {} rows past row {MAX_ROWS} dropped",
                            multiplicity - copy
                        );
                        break;
                    }
                    let index = sheet_data.children.len();
                    let mut refs = Vec::new();
                    let out = self.emit_row(&plan, copy, out_row, &mut refs);
                    sheet_data.children.push(Node::Element(out));
                    formula_refs.extend(refs.into_iter().map(|(cell, range)| (index, cell, range)));
                    emitted += 1;
                }

                let extra = (multiplicity - 1) as u32;
                if extra > 0 {
                    trace!("row {template_row} expanded to {multiplicity} rows");
                }
                insertions.insert_rows(template_row - 1, extra);
                state.row_offset += extra;

                rows_in += 1;
                rows_out += emitted;
            }

            for (row_index, cell_index, range) in formula_refs {
                let shifted = insertions.map_range(&range).to_string();
                if let Some(Node::Element(row)) = sheet_data.children.get_mut(row_index) {
                    if let Some(Node::Element(c)) = row.children.get_mut(cell_index) {
                        if let Some(f) = c.child_mut("f") {
                            f.set_attr("ref", shifted);
                        }
                    }
                }
            }
        }

        if !insertions.is_empty() {
            fix_ranges(&mut document.root, &insertions, self.options);
        }

        debug!("worksheet expanded: {rows_in} template rows, {rows_out} rows emitted");

        ExpandedSheet {
            document,
            insertions,
            rows_in,
            rows_out,
        }
    }

    /// Decide what each cell of a template row becomes
    pub fn plan_row(
        &mut self,
        row: &Element,
        template_row: u32,
        state: &mut OffsetState,
        insertions: &mut Insertions,
    ) -> RowPlan {
        let mut element = row.clone();
        element.children.clear();

        let mut cells = Vec::new();
        let mut trailing = Vec::new();
        let mut widened = false;
        let mut next_col = 1;

        for child in row.elements() {
            if child.name != "c" {
                trailing.push(Node::Element(child.clone()));
                continue;
            }

            let template_col = match child.attr("r").map(CellAddress::parse) {
                Some(Ok(addr)) => addr.col + 1,
                _ => {
                    warn!("cell without a valid reference in row {template_row}; numbering sequentially");
                    next_col
                }
            };
            next_col = template_col + 1;

            let mut template = child.clone();
            let slot = self.slot_for(&mut template, template_row, template_col);

            let col = template_col + state.cell_offset;
            if let Slot::Columns(items) = &slot {
                if items.len() > 1 {
                    let extra = (items.len() - 1) as u32;
                    insertions.insert_columns(template_row - 1, template_col - 1, extra);
                    state.cell_offset += extra;
                    widened = true;
                }
            }

            cells.push(PlannedCell {
                col,
                template_col,
                template,
                slot,
            });
        }

        RowPlan {
            template_row,
            element,
            cells,
            trailing,
            widened,
        }
    }

    fn slot_for(&mut self, cell: &mut Element, row: u32, col: u32) -> Slot {
        if cell.has_child("f") {
            return Slot::Formula;
        }

        let kind = cell.attr("t").map(str::to_owned);
        match kind.as_deref() {
            Some("s") => {
                let index = cell
                    .child("v")
                    .and_then(|v| v.text().trim().parse::<usize>().ok());
                match index.map(|i| self.strings.plan(i)) {
                    Some(Some(EntryPlan::Superseded(accessor))) => {
                        let accessor = accessor.clone();
                        placeholder_slot(&accessor, self.data)
                    }
                    Some(Some(_)) => Slot::Copy,
                    _ => {
                        warn!(
                            "cell {} refers to an unknown shared string",
                            cell_ref(row, col)
                        );
                        Slot::Copy
                    }
                }
            }
            Some("inlineStr") => {
                let text = cell.child("is").map(item_text).unwrap_or_default();
                if let Some(body) = sole_placeholder(&text) {
                    return placeholder_slot(&Accessor::parse(body), self.data);
                }
                if contains_placeholder(&text) {
                    let text = substitute_text(&text, self.data);
                    if let Some(is) = cell.child_mut("is") {
                        is.children = vec![Node::Element(text_element(&text))];
                    }
                }
                Slot::Copy
            }
            _ => Slot::Copy,
        }
    }

    /// Emit copy number `copy` of a planned row as rendered row `out_row`.
    ///
    /// Formula ranges of the first copy are collected in `refs` as
    /// (cell index, template range) and moved once the sheet is complete.
    fn emit_row(
        &mut self,
        plan: &RowPlan,
        copy: usize,
        out_row: u32,
        refs: &mut Vec<(usize, CellRange)>,
    ) -> Element {
        let mut row = plan.element.clone();
        row.set_attr("r", out_row.to_string());
        if plan.widened {
            row.remove_attr("spans");
        }

        let mut dropped = 0;
        for cell in &plan.cells {
            if cell.col > MAX_COLS {
                dropped += 1;
                continue;
            }
            match &cell.slot {
                Slot::Copy => {
                    let mut c = cell.template.clone();
                    c.set_attr("r", cell_ref(out_row, cell.col));
                    if c.attr("t") == Some("s") {
                        self.strings.reference();
                    }
                    row.children.push(Node::Element(c));
                }
                Slot::Formula => {
                    let c = self.formula_cell(cell, plan.template_row, out_row, copy);
                    if copy == 0 {
                        if let Some(range) = formula_ref(&c) {
                            refs.push((row.children.len(), range));
                        }
                    }
                    row.children.push(Node::Element(c));
                }
                Slot::Single(content) => {
                    let c = self.value_cell(&cell.template, out_row, cell.col, content.as_ref());
                    row.children.push(Node::Element(c));
                }
                Slot::Columns(items) if items.is_empty() => {
                    let c = self.value_cell(&cell.template, out_row, cell.col, None);
                    row.children.push(Node::Element(c));
                }
                Slot::Columns(items) => {
                    for (j, content) in items.iter().enumerate() {
                        let col = cell.col + j as u32;
                        if col > MAX_COLS {
                            dropped += items.len() - j;
                            break;
                        }
                        let c = self.value_cell(&cell.template, out_row, col, content.as_ref());
                        row.children.push(Node::Element(c));
                    }
                }
                Slot::Rows(items) => {
                    let content = items.get(copy).and_then(|c| c.as_ref());
                    let c = self.value_cell(&cell.template, out_row, cell.col, content);
                    row.children.push(Node::Element(c));
                }
            }
        }

        if dropped > 0 {
            warn!(
                "row {out_row}: {dropped} cells past column {} dropped",
                index_to_letters(MAX_COLS)
            );
        }

        row.children.extend(plan.trailing.iter().cloned());
        row
    }

    fn formula_cell(
        &self,
        cell: &PlannedCell,
        template_row: u32,
        row: u32,
        copy: usize,
    ) -> Element {
        let mut c = cell.template.clone();
        c.set_attr("r", cell_ref(row, cell.col));
        if self.options.remove_formula_values {
            c.remove_children("v");
        }

        // Only the first copy of a row may carry a shared-formula group
        if copy > 0 {
            let shared_master = c
                .child("f")
                .filter(|f| f.attr("t") == Some("shared"))
                .map(|f| f.attr("ref").is_some());
            match shared_master {
                Some(true) => {
                    if let Some(f) = c.child_mut("f") {
                        f.remove_attr("t");
                        f.remove_attr("ref");
                        f.remove_attr("si");
                    }
                }
                Some(false) => c.remove_children("f"),
                None => {}
            }

            // Array formulas keep their shape around the copied cell
            let (down, right) = (row - template_row, cell.col - cell.template_col);
            if let Some(range) = formula_ref(&c) {
                let moved = range.moved_to(
                    (range.start.row + down, range.start.col + right),
                    (range.end.row + down, range.end.col + right),
                );
                if let Some(f) = c.child_mut("f") {
                    f.set_attr("ref", moved.to_string());
                }
            }
        }

        c
    }

    fn value_cell(
        &mut self,
        template: &Element,
        row: u32,
        col: u32,
        content: Option<&CellContent>,
    ) -> Element {
        let mut c = template.clone();
        c.set_attr("r", cell_ref(row, col));
        c.remove_attr("t");
        c.children.clear();

        match content {
            None => {}
            Some(number @ CellContent::Number(_)) => {
                c.children
                    .push(Node::Element(Element::new("v").with_text(number.raw())));
            }
            Some(boolean @ CellContent::Boolean(_)) => {
                c.set_attr("t", "b");
                c.children
                    .push(Node::Element(Element::new("v").with_text(boolean.raw())));
            }
            Some(CellContent::Text(text)) => {
                let index = self.strings.add_string(text);
                self.strings.reference();
                c.set_attr("t", "s");
                c.children
                    .push(Node::Element(Element::new("v").with_text(index.to_string())));
            }
        }

        c
    }
}

/// The `ref` range of a cell's `<f>`, if it has a readable one
fn formula_ref(cell: &Element) -> Option<CellRange> {
    let reference = cell.child("f")?.attr("ref")?;
    match CellRange::parse(reference) {
        Ok(range) => Some(range),
        Err(_) => {
            warn!("unparsable formula range {reference:?} left unchanged");
            None
        }
    }
}

fn placeholder_slot(accessor: &Accessor, data: &Value) -> Slot {
    let value = data.resolve(accessor);

    if accessor.is_table() {
        let items = match value {
            Some(Value::Sequence(items)) => items,
            Some(other) => {
                trace!(
                    "${{{accessor}}} holds a {}; using it as a one-row table",
                    other.type_name()
                );
                vec![other]
            }
            None => Vec::new(),
        };
        return Slot::Rows(items.iter().map(|v| classify(Some(v))).collect());
    }

    match value {
        Some(Value::Sequence(items)) => {
            Slot::Columns(items.iter().map(|v| classify(Some(v))).collect())
        }
        other => Slot::Single(classify(other.as_ref())),
    }
}

fn fix_ranges(root: &mut Element, insertions: &Insertions, options: &RenderOptions) {
    for element in root.elements_mut() {
        let name = element.name.clone();
        match name.as_str() {
            "dimension" if options.update_dimension => shift_attr(element, "ref", insertions),
            _ if !options.shift_ranges => {}
            "mergeCells" => shift_merges(element, insertions),
            "autoFilter" => shift_attr(element, "ref", insertions),
            "conditionalFormatting" => shift_attr(element, "sqref", insertions),
            "dataValidations" => {
                for validation in element.elements_mut() {
                    shift_attr(validation, "sqref", insertions);
                }
            }
            "hyperlinks" => {
                for link in element.elements_mut() {
                    shift_attr(link, "ref", insertions);
                }
            }
            _ => {}
        }
    }
}

fn shift_attr(element: &mut Element, key: &str, insertions: &Insertions) {
    if let Some(value) = element.attr(key) {
        let shifted = insertions.shift_sqref(value);
        element.set_attr(key, shifted);
    }
}

/// Move merged ranges without resizing them. A merge inside a single
/// template row that became several rows is repeated on every copy.
fn shift_merges(merge_cells: &mut Element, insertions: &Insertions) {
    let mut merges = Vec::new();

    for merge in merge_cells.elements() {
        let Some(reference) = merge.attr("ref") else {
            continue;
        };
        let range = match CellRange::parse(reference) {
            Ok(range) => range,
            Err(_) => {
                warn!("unparsable merged range {reference:?} left unchanged");
                merges.push(merge.clone());
                continue;
            }
        };

        let shifted = insertions.move_range(&range);
        let copies = if range.is_single_row() {
            insertions.row_extra(range.start.row)
        } else {
            0
        };

        if copies == 0 {
            merges.push(merge.clone().with_attr("ref", shifted.to_string()));
            continue;
        }

        let top = insertions.map_row(range.start.row);
        for k in 0..=copies {
            let row = top + k;
            let copy = shifted.moved_to((row, shifted.start.col), (row, shifted.end.col));
            merges.push(merge.clone().with_attr("ref", copy.to_string()));
        }
    }

    merge_cells.set_attr("count", merges.len().to_string());
    merge_cells.children = merges.into_iter().map(Node::Element).collect();
}

/// Text of every inline-string cell, in document order
pub fn inline_texts(document: &Document) -> Vec<String> {
    let Some(sheet_data) = document.root.child("sheetData") else {
        return Vec::new();
    };

    sheet_data
        .elements()
        .flat_map(|row| row.elements())
        .filter(|c| c.name == "c" && c.attr("t") == Some("inlineStr"))
        .filter_map(|c| c.child("is"))
        .map(item_text)
        .collect()
}
