//! Compare original and predicted one-hot label columns.
//!
//! Every comparator takes a record plus two parallel lists of field names:
//! `original[i]` is a ground-truth column and `new[i]` is its predicted
//! counterpart (usually the same name with a `_bert` or `_llm` suffix).

use crate::dataset::{Record, Table};
use crate::error::{PipelineError, Result};
use crate::pipelines::utils::with_suffix;
use serde::Serialize;

/// Predicted column names for `original`, e.g. `pay` -> `pay_bert`.
pub fn suffixed<S: AsRef<str>>(original: &[S], suffix: &str) -> Vec<String> {
    with_suffix(original, suffix)
}

fn pairs<'a, S: AsRef<str>, T: AsRef<str>>(
    original: &'a [S],
    new: &'a [T],
) -> Result<impl Iterator<Item = (&'a str, &'a str)>> {
    if original.len() != new.len() {
        return Err(PipelineError::InvalidParams(format!(
            "Got {} original label columns but {} new ones",
            original.len(),
            new.len()
        )));
    }
    Ok(original
        .iter()
        .map(|o| o.as_ref())
        .zip(new.iter().map(|n| n.as_ref())))
}

fn values(x: &Record, original: &str, new: &str) -> Result<(f64, f64)> {
    Ok((x.number(original)?, x.number(new)?))
}

/// True when every predicted column equals its original.
pub fn exact_match<S: AsRef<str>, T: AsRef<str>>(
    x: &Record,
    original: &[S],
    new: &[T],
) -> Result<bool> {
    for (o, n) in pairs(original, new)? {
        let (o, n) = values(x, o, n)?;
        if o != n {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True when no original label was dropped and at least one label was added.
pub fn correct_plus_extra<S: AsRef<str>, T: AsRef<str>>(
    x: &Record,
    original: &[S],
    new: &[T],
) -> Result<bool> {
    let mut extra = false;
    for (o, n) in pairs(original, new)? {
        let (o, n) = values(x, o, n)?;
        if o > n {
            return Ok(false);
        }
        if n > o {
            extra = true;
        }
    }
    Ok(extra)
}

/// True when some label absent from the original was predicted.
pub fn added_one<S: AsRef<str>, T: AsRef<str>>(
    x: &Record,
    original: &[S],
    new: &[T],
) -> Result<bool> {
    for (o, n) in pairs(original, new)? {
        let (o, n) = values(x, o, n)?;
        if o == 0.0 && n == 1.0 {
            return Ok(true);
        }
    }
    Ok(false)
}

/// True when some original label was not predicted.
pub fn missed_one<S: AsRef<str>, T: AsRef<str>>(
    x: &Record,
    original: &[S],
    new: &[T],
) -> Result<bool> {
    for (o, n) in pairs(original, new)? {
        let (o, n) = values(x, o, n)?;
        if n == 0.0 && o == 1.0 {
            return Ok(true);
        }
    }
    Ok(false)
}

/// All four comparisons for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelComparison {
    /// See [`exact_match`].
    pub exact_match: bool,
    /// See [`correct_plus_extra`].
    pub correct_plus_extra: bool,
    /// See [`added_one`].
    pub added_one: bool,
    /// See [`missed_one`].
    pub missed_one: bool,
}

/// Run every comparator on `x`.
pub fn compare_record<S: AsRef<str>, T: AsRef<str>>(
    x: &Record,
    original: &[S],
    new: &[T],
) -> Result<LabelComparison> {
    Ok(LabelComparison {
        exact_match: exact_match(x, original, new)?,
        correct_plus_extra: correct_plus_extra(x, original, new)?,
        added_one: added_one(x, original, new)?,
        missed_one: missed_one(x, original, new)?,
    })
}

/// Per-comparator counts over a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    /// Rows compared.
    pub total: usize,
    /// Rows where [`exact_match`] held.
    pub exact_match: usize,
    /// Rows where [`correct_plus_extra`] held.
    pub correct_plus_extra: usize,
    /// Rows where [`added_one`] held.
    pub added_one: usize,
    /// Rows where [`missed_one`] held.
    pub missed_one: usize,
}

impl ComparisonSummary {
    fn add(&mut self, comparison: LabelComparison) {
        self.total += 1;
        self.exact_match += comparison.exact_match as usize;
        self.correct_plus_extra += comparison.correct_plus_extra as usize;
        self.added_one += comparison.added_one as usize;
        self.missed_one += comparison.missed_one as usize;
    }

    /// Fraction of rows that matched exactly.
    pub fn exact_match_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.exact_match as f64 / self.total as f64
        }
    }
}

/// Compare every row of `table`.
pub fn summarize<S: AsRef<str>, T: AsRef<str>>(
    table: &Table,
    original: &[S],
    new: &[T],
) -> Result<ComparisonSummary> {
    let mut summary = ComparisonSummary::default();
    for row in table {
        summary.add(compare_record(row, original, new)?);
    }
    Ok(summary)
}
