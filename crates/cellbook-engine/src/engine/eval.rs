//! Formula evaluation and full-sheet recalculation.
//!
//! A recalculation pass evaluates every formula cell with a memoized
//! depth-first traversal. Each pass owns its memo table and evaluation stack;
//! nothing is cached between passes.
//!
//! Value rules:
//! - numbers pass through; text and empty cells count as `0` in arithmetic
//! - a bare reference (`=A1`) yields the referenced value itself, so text
//!   survives and an empty cell reads as `0`
//! - error sentinels propagate through arithmetic unchanged (`#ERR` stays
//!   `#ERR`, `#CYCLE` stays `#CYCLE`); the left operand wins when both fail
//! - aggregate arguments that are references or ranges contribute only their
//!   numeric members; text, empty cells and sentinels are skipped
//! - division by zero, non-finite results, unknown functions and ranges used
//!   outside a function call are `#ERR`
//! - every cell on a reference loop is `#CYCLE`

use std::collections::{HashMap, HashSet};

use crate::builtins::Aggregate;

use super::cell::{CellContent, CellError, CellValue, Grid};
use super::cell_ref::{CellRef, GridBounds};
use super::parser::{BinaryOp, Expr, parse_formula};

/// Counts reported by a recalculation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecalcSummary {
    pub formulas: usize,
    pub errors: usize,
    pub cycles: usize,
}

/// Re-evaluate every formula cell in `grid` and store the results.
pub fn recalculate(grid: &Grid, bounds: GridBounds) -> RecalcSummary {
    let mut formula_cells: Vec<CellRef> = grid
        .iter()
        .filter(|entry| entry.value().is_formula())
        .map(|entry| *entry.key())
        .collect();
    // Row-major order keeps every pass identical for identical input.
    formula_cells.sort();

    let mut pass = Pass::new(grid, bounds);
    for cell_ref in &formula_cells {
        pass.value_of(*cell_ref);
    }

    let mut summary = RecalcSummary {
        formulas: formula_cells.len(),
        ..RecalcSummary::default()
    };
    let mut memo = pass.into_memo();
    for cell_ref in formula_cells {
        let value = memo
            .remove(&cell_ref)
            .unwrap_or(CellValue::Error(CellError::Err));
        match value {
            CellValue::Error(CellError::Err) => summary.errors += 1,
            CellValue::Error(CellError::Cycle) => summary.cycles += 1,
            _ => {}
        }
        if let Some(mut cell) = grid.get_mut(&cell_ref) {
            cell.value = value;
        }
    }

    log::debug!(
        "recalculated {} formulas ({} errors, {} cycles)",
        summary.formulas,
        summary.errors,
        summary.cycles
    );
    summary
}

/// Evaluate an ad-hoc formula (with or without the leading `=`) against the
/// current cells of a grid, without storing anything.
pub fn evaluate_formula(formula: &str, grid: &Grid, bounds: GridBounds) -> CellValue {
    let body = formula.strip_prefix('=').unwrap_or(formula);
    let expr = match parse_formula(body, bounds) {
        Ok(expr) => expr,
        Err(e) => {
            log::trace!("formula '{}' failed to parse: {}", body, e);
            return CellValue::Error(CellError::Err);
        }
    };
    let mut pass = Pass::new(grid, bounds);
    let mut reads = Vec::new();
    collect_reads(&expr, &mut reads);
    for cell_ref in reads {
        pass.value_of(cell_ref);
    }
    pass.finish(&expr)
}

/// A formula whose references are still being resolved.
struct Frame {
    cell: CellRef,
    expr: Option<Expr>,
    reads: Vec<CellRef>,
    next: usize,
}

struct Pass<'a> {
    grid: &'a Grid,
    bounds: GridBounds,
    memo: HashMap<CellRef, CellValue>,
    stack: Vec<Frame>,
    on_stack: HashSet<CellRef>,
    cyclic: HashSet<CellRef>,
}

impl<'a> Pass<'a> {
    fn new(grid: &'a Grid, bounds: GridBounds) -> Pass<'a> {
        Pass {
            grid,
            bounds,
            memo: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            cyclic: HashSet::new(),
        }
    }

    fn into_memo(self) -> HashMap<CellRef, CellValue> {
        self.memo
    }

    fn formula_body(&self, cell_ref: &CellRef) -> Option<String> {
        let cell = self.grid.get(cell_ref)?;
        match &cell.content {
            CellContent::Formula(body) => Some(body.clone()),
            _ => None,
        }
    }

    /// Value of a cell for this pass.
    ///
    /// Dependencies are walked depth-first with an explicit stack: a formula
    /// is evaluated only once every formula it reads has a memoized value, so
    /// chain length never turns into call depth.
    fn value_of(&mut self, root: CellRef) -> CellValue {
        self.visit(root);
        while let Some(frame) = self.stack.last_mut() {
            if frame.next < frame.reads.len() {
                let read = frame.reads[frame.next];
                frame.next += 1;
                self.visit(read);
                continue;
            }

            let Some(frame) = self.stack.pop() else {
                break;
            };
            self.on_stack.remove(&frame.cell);
            let value = if self.cyclic.contains(&frame.cell) {
                CellValue::Error(CellError::Cycle)
            } else {
                match &frame.expr {
                    Some(expr) => self.finish(expr),
                    None => CellValue::Error(CellError::Err),
                }
            };
            self.memo.insert(frame.cell, value);
        }
        self.lookup(&root)
    }

    /// Start resolving a cell, or close a loop when it is already being
    /// resolved. Memoized and non-formula cells need nothing.
    fn visit(&mut self, cell_ref: CellRef) {
        if self.on_stack.contains(&cell_ref) {
            self.mark_cycle(cell_ref);
            return;
        }
        if self.memo.contains_key(&cell_ref) {
            return;
        }
        let Some(body) = self.formula_body(&cell_ref) else {
            return;
        };

        let expr = match parse_formula(&body, self.bounds) {
            Ok(expr) => Some(expr),
            Err(e) => {
                log::trace!("formula '{}' failed to parse: {}", body, e);
                None
            }
        };
        let mut reads = Vec::new();
        if let Some(expr) = &expr {
            collect_reads(expr, &mut reads);
        }
        self.on_stack.insert(cell_ref);
        self.stack.push(Frame {
            cell: cell_ref,
            expr,
            reads,
            next: 0,
        });
    }

    /// Every cell from `closing` to the top of the stack is on the loop.
    fn mark_cycle(&mut self, closing: CellRef) {
        if let Some(pos) = self.stack.iter().position(|frame| frame.cell == closing) {
            for frame in &self.stack[pos..] {
                self.cyclic.insert(frame.cell);
                self.memo
                    .insert(frame.cell, CellValue::Error(CellError::Cycle));
            }
        }
    }

    /// Current value of a cell whose dependencies are resolved.
    fn lookup(&self, cell_ref: &CellRef) -> CellValue {
        if let Some(value) = self.memo.get(cell_ref) {
            return value.clone();
        }
        match self.grid.get(cell_ref) {
            None => CellValue::Empty,
            Some(cell) => match &cell.content {
                CellContent::Formula(_) => CellValue::Error(CellError::Err),
                _ => cell.value.clone(),
            },
        }
    }

    /// Top-level value of a parsed formula.
    fn finish(&self, expr: &Expr) -> CellValue {
        match self.eval(expr) {
            CellValue::Empty => CellValue::Number(0.0),
            CellValue::Number(n) => finite(n),
            other => other,
        }
    }

    fn eval(&self, expr: &Expr) -> CellValue {
        match expr {
            Expr::Number(n) => CellValue::Number(*n),
            Expr::Ref(cell_ref) => self.lookup(cell_ref),
            Expr::Range(_) => CellValue::Error(CellError::Err),
            Expr::Literal(text) => CellValue::Text(text.clone()),
            Expr::Neg(inner) => match self.numeric(inner) {
                Ok(n) => finite(-n),
                Err(e) => CellValue::Error(e),
            },
            Expr::Binary { op, lhs, rhs } => match (self.numeric(lhs), self.numeric(rhs)) {
                (Err(e), _) | (_, Err(e)) => CellValue::Error(e),
                (Ok(a), Ok(b)) => apply_binary(*op, a, b),
            },
            Expr::Call { name, args } => self.call(name, args),
        }
    }

    /// Arithmetic view of an expression.
    fn numeric(&self, expr: &Expr) -> Result<f64, CellError> {
        match self.eval(expr) {
            CellValue::Number(n) => Ok(n),
            CellValue::Empty | CellValue::Text(_) => Ok(0.0),
            CellValue::Error(e) => Err(e),
        }
    }

    fn call(&self, name: &str, args: &[Expr]) -> CellValue {
        let Some(aggregate) = Aggregate::from_name(name) else {
            log::trace!("unknown function {}", name);
            return CellValue::Error(CellError::Err);
        };

        let mut values = Vec::new();
        let mut first_error = None;
        for arg in args {
            match arg {
                Expr::Range(range) => {
                    for member in range.cells() {
                        if let CellValue::Number(n) = self.lookup(&member) {
                            values.push(n);
                        }
                    }
                }
                Expr::Ref(cell_ref) => {
                    if let CellValue::Number(n) = self.lookup(cell_ref) {
                        values.push(n);
                    }
                }
                Expr::Literal(_) => {}
                other => match self.eval(other) {
                    CellValue::Number(n) => values.push(n),
                    CellValue::Error(e) => {
                        first_error.get_or_insert(e);
                    }
                    CellValue::Empty | CellValue::Text(_) => {}
                },
            }
        }

        if let Some(e) = first_error {
            return CellValue::Error(e);
        }
        match aggregate.apply(&values) {
            Some(n) => finite(n),
            None => CellValue::Error(CellError::Err),
        }
    }
}

/// Cells an expression reads, in evaluation order. Both operands of every
/// operator and every call argument are included, so loops hidden behind
/// an erroring operand are still found. A range read outside a call is an
/// error without touching its members.
fn collect_reads(expr: &Expr, out: &mut Vec<CellRef>) {
    match expr {
        Expr::Ref(cell_ref) => out.push(*cell_ref),
        Expr::Number(_) | Expr::Range(_) | Expr::Literal(_) => {}
        Expr::Neg(inner) => collect_reads(inner, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect_reads(lhs, out);
            collect_reads(rhs, out);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                match arg {
                    Expr::Range(range) => out.extend(range.cells()),
                    other => collect_reads(other, out),
                }
            }
        }
    }
}

fn apply_binary(op: BinaryOp, a: f64, b: f64) -> CellValue {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return CellValue::Error(CellError::Err);
            }
            a / b
        }
        BinaryOp::Pow => a.powf(b),
    };
    finite(result)
}

fn finite(n: f64) -> CellValue {
    if n.is_finite() {
        CellValue::Number(n)
    } else {
        CellValue::Error(CellError::Err)
    }
}
