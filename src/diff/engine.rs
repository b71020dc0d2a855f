//! Field-level diff between two records of the same shape
//!
//! Leaves are compared on their rendered string form. Two values that render
//! identically are unchanged even if they differ internally.

use crate::record::{FieldPath, PathSegment, Record};
use crate::resource::WatchedResource;
use crate::utils::AppError;

/// One changed leaf (or one padded sequence item)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub path: FieldPath,
    pub old_value: String,
    pub new_value: String,
}

/// Ordered changes in left-hand traversal order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    entries: Vec<DiffEntry>,
}

impl DiffResult {
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffEntry> {
        self.entries.iter()
    }

    /// Rendered paths, in order
    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.path.to_string()).collect()
    }
}

impl IntoIterator for DiffResult {
    type Item = DiffEntry;
    type IntoIter = std::vec::IntoIter<DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a DiffEntry;
    type IntoIter = std::slice::Iter<'a, DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Compare `old` against `new` below `path`.
///
/// # Errors
///
/// `SchemaMismatch` when the two trees disagree in variant, struct field names or
/// sequence item label. Differing sequence lengths are not an error: the extra
/// items are reported with the missing side rendered as an empty string.
pub fn diff(old: &Record, new: &Record, path: &FieldPath) -> Result<DiffResult, AppError> {
    let mut entries = Vec::new();
    let mut cursor = path.clone();
    walk(old, new, &mut cursor, &mut entries)?;
    Ok(DiffResult { entries })
}

/// Project the status of both snapshots and diff them from the root
pub fn diff_status<R: WatchedResource>(old: &R, new: &R) -> Result<DiffResult, AppError> {
    diff(&old.status_record(), &new.status_record(), &FieldPath::root())
}

fn walk(
    old: &Record,
    new: &Record,
    path: &mut FieldPath,
    out: &mut Vec<DiffEntry>,
) -> Result<(), AppError> {
    match (old, new) {
        (Record::Scalar(a), Record::Scalar(b)) => {
            if a != b {
                out.push(DiffEntry {
                    path: path.clone(),
                    old_value: a.clone(),
                    new_value: b.clone(),
                });
            }
            Ok(())
        }
        (Record::Struct(a), Record::Struct(b)) => {
            if a.len() != b.len() {
                return Err(AppError::schema_mismatch(
                    path.to_string(),
                    format!("field count {} vs {}", a.len(), b.len()),
                ));
            }
            for ((name_a, child_a), (name_b, child_b)) in a.iter().zip(b.iter()) {
                if name_a != name_b {
                    return Err(AppError::schema_mismatch(
                        path.to_string(),
                        format!("field `{}` vs `{}`", name_a, name_b),
                    ));
                }
                path.push(PathSegment::Field(*name_a));
                walk(child_a, child_b, path, out)?;
                path.pop();
            }
            Ok(())
        }
        (
            Record::Sequence {
                label: label_a,
                items: a,
            },
            Record::Sequence {
                label: label_b,
                items: b,
            },
        ) => {
            if label_a != label_b {
                return Err(AppError::schema_mismatch(
                    path.to_string(),
                    format!("item type `{}` vs `{}`", label_a, label_b),
                ));
            }
            let label = *label_a;
            let shared = a.len().min(b.len());
            for (index, (item_a, item_b)) in a.iter().zip(b.iter()).enumerate() {
                path.push(PathSegment::Index { index, label });
                walk(item_a, item_b, path, out)?;
                path.pop();
            }
            // Tail padding: at most one of these loops runs
            for (index, removed) in a.iter().enumerate().skip(shared) {
                out.push(DiffEntry {
                    path: path.item(index, label),
                    old_value: removed.to_string(),
                    new_value: String::new(),
                });
            }
            for (index, added) in b.iter().enumerate().skip(shared) {
                out.push(DiffEntry {
                    path: path.item(index, label),
                    old_value: String::new(),
                    new_value: added.to_string(),
                });
            }
            Ok(())
        }
        _ => Err(AppError::schema_mismatch(
            path.to_string(),
            format!("{} vs {}", old.variant_name(), new.variant_name()),
        )),
    }
}
