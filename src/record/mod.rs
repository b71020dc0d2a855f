//! Schema-driven record model used by the diff engine
//!
//! A status value is projected into a [`Record`] tree before comparison. The tree
//! shape depends only on the schema, never on the values, so two projections of
//! the same type can always be walked side by side.

use std::fmt;

/// A node in the comparison tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Canonical rendered form of a primitive value
    Scalar(String),
    /// Named members in schema declaration order
    Struct(Vec<(&'static str, Record)>),
    /// Ordered items sharing the item type `label`
    Sequence {
        label: &'static str,
        items: Vec<Record>,
    },
}

impl Record {
    pub fn scalar(value: impl fmt::Display) -> Self {
        Record::Scalar(value.to_string())
    }

    /// Start an ordered struct projection
    pub fn structure() -> StructBuilder {
        StructBuilder { fields: Vec::new() }
    }

    /// Same shape with every scalar emptied and every sequence cleared.
    ///
    /// Used for absent optional members so that `None` and `Some(_)` project to
    /// trees of identical shape.
    pub fn blanked(&self) -> Record {
        match self {
            Record::Scalar(_) => Record::Scalar(String::new()),
            Record::Struct(fields) => Record::Struct(
                fields
                    .iter()
                    .map(|(name, child)| (*name, child.blanked()))
                    .collect(),
            ),
            Record::Sequence { label, .. } => Record::Sequence {
                label: *label,
                items: Vec::new(),
            },
        }
    }

    /// True when the node carries no rendered content at all
    pub fn is_blank(&self) -> bool {
        match self {
            Record::Scalar(value) => value.is_empty(),
            Record::Struct(fields) => fields.iter().all(|(_, child)| child.is_blank()),
            Record::Sequence { items, .. } => items.is_empty(),
        }
    }

    /// Short name of the variant, used in mismatch reports
    pub fn variant_name(&self) -> &'static str {
        match self {
            Record::Scalar(_) => "scalar",
            Record::Struct(_) => "struct",
            Record::Sequence { .. } => "sequence",
        }
    }
}

/// Compact value rendering: scalars verbatim, structs as `{Name: value, ...}`
/// without blank members, sequences as `[a, b]`.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Scalar(value) => f.write_str(value),
            Record::Struct(fields) => {
                f.write_str("{")?;
                let mut first = true;
                for (name, child) in fields.iter().filter(|(_, c)| !c.is_blank()) {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{}: {}", name, child)?;
                }
                f.write_str("}")
            }
            Record::Sequence { items, .. } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Builder for [`Record::Struct`] keeping declaration order
pub struct StructBuilder {
    fields: Vec<(&'static str, Record)>,
}

impl StructBuilder {
    pub fn field<T: Project + ?Sized>(mut self, name: &'static str, value: &T) -> Self {
        self.fields.push((name, value.project()));
        self
    }

    pub fn finish(self) -> Record {
        Record::Struct(self.fields)
    }
}

/// One step from the comparison root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(&'static str),
    Index { index: usize, label: &'static str },
}

/// Position of a node relative to the comparison root.
///
/// Rendered as `ContainerStatuses[1].State.Running.StartedAt`; never used for lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// New path extended with a field name
    pub fn child(&self, name: &'static str) -> Self {
        let mut path = self.clone();
        path.push(PathSegment::Field(name));
        path
    }

    /// New path extended with a sequence index
    pub fn item(&self, index: usize, label: &'static str) -> Self {
        let mut path = self.clone();
        path.push(PathSegment::Index { index, label });
        path
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index { index, .. } => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Pure projection of a typed value into a [`Record`]
pub trait Project {
    /// Type label used for sequence items
    const KIND: &'static str;

    fn project(&self) -> Record;
}

impl Project for String {
    const KIND: &'static str = "string";

    fn project(&self) -> Record {
        Record::Scalar(self.clone())
    }
}

impl Project for str {
    const KIND: &'static str = "string";

    fn project(&self) -> Record {
        Record::Scalar(self.to_string())
    }
}

impl Project for bool {
    const KIND: &'static str = "bool";

    fn project(&self) -> Record {
        Record::scalar(self)
    }
}

impl Project for i32 {
    const KIND: &'static str = "int32";

    fn project(&self) -> Record {
        Record::scalar(self)
    }
}

impl Project for i64 {
    const KIND: &'static str = "int64";

    fn project(&self) -> Record {
        Record::scalar(self)
    }
}

impl<T: Project + Default> Project for Option<T> {
    const KIND: &'static str = T::KIND;

    fn project(&self) -> Record {
        match self {
            Some(value) => value.project(),
            None => T::default().project().blanked(),
        }
    }
}

impl<T: Project> Project for Vec<T> {
    const KIND: &'static str = "list";

    fn project(&self) -> Record {
        Record::Sequence {
            label: T::KIND,
            items: self.iter().map(Project::project).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        name: String,
        ready: bool,
        restarts: i32,
    }

    impl Project for Sample {
        const KIND: &'static str = "Sample";

        fn project(&self) -> Record {
            Record::structure()
                .field("Name", &self.name)
                .field("Ready", &self.ready)
                .field("Restarts", &self.restarts)
                .finish()
        }
    }

    #[test]
    fn should_project_struct_fields_in_declaration_order() {
        // Arrange
        let sample = Sample {
            name: "web".to_string(),
            ready: true,
            restarts: 2,
        };

        // Act
        let record = sample.project();

        // Assert
        assert_eq!(
            record,
            Record::Struct(vec![
                ("Name", Record::Scalar("web".to_string())),
                ("Ready", Record::Scalar("true".to_string())),
                ("Restarts", Record::Scalar("2".to_string())),
            ])
        );
    }

    #[test]
    fn should_project_absent_option_with_same_shape() {
        // Arrange
        let present: Option<Sample> = Some(Sample::default());
        let absent: Option<Sample> = None;

        // Act
        let present = present.project();
        let absent = absent.project();

        // Assert
        match (&present, &absent) {
            (Record::Struct(a), Record::Struct(b)) => {
                let names_a: Vec<_> = a.iter().map(|(n, _)| *n).collect();
                let names_b: Vec<_> = b.iter().map(|(n, _)| *n).collect();
                assert_eq!(names_a, names_b);
            }
            _ => panic!("expected structs"),
        }
        assert!(absent.is_blank());
        assert!(!present.is_blank());
    }

    #[test]
    fn should_label_sequences_with_item_kind() {
        // Arrange
        let samples = vec![Sample::default()];

        // Act
        let record = samples.project();

        // Assert
        match record {
            Record::Sequence { label, items } => {
                assert_eq!(label, "Sample");
                assert_eq!(items.len(), 1);
            }
            _ => panic!("expected sequence"),
        }
    }

    #[test]
    fn should_render_record_compactly() {
        // Arrange
        let sample = Sample {
            name: "sidecar".to_string(),
            ready: false,
            restarts: 0,
        };
        let list = vec![Sample::default(), sample];

        // Act
        let rendered = list.project().to_string();

        // Assert
        assert_eq!(
            rendered,
            "[{Ready: false, Restarts: 0}, {Name: sidecar, Ready: false, Restarts: 0}]"
        );
    }

    #[test]
    fn should_render_field_path_with_dots_and_indices() {
        // Arrange
        let path = FieldPath::root()
            .child("ContainerStatuses")
            .item(1, "ContainerStatus")
            .child("State")
            .child("Running");

        // Act & Assert
        assert_eq!(path.to_string(), "ContainerStatuses[1].State.Running");
        assert_eq!(path.segments().len(), 4);
        assert!(FieldPath::root().is_root());
        assert_eq!(FieldPath::root().to_string(), "");
    }
}
