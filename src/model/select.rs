//! Value columns - one entry of the SELECT list.

use serde::{Deserialize, Serialize};

use super::part::{PartError, PartResult, PartSlot, QueryPart};

/// One SELECT entry: exactly one column part plus at most one aggregate,
/// one window and one alias part.
///
/// Parts keep the order they were added in, which is the order the editor
/// shows them. The invariant is checked whenever a column is built from parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<QueryPart>", into = "Vec<QueryPart>")]
pub struct SelectColumn {
    parts: Vec<QueryPart>,
}

impl SelectColumn {
    /// A bare column with no aggregate, window or alias.
    pub fn new(column: &str) -> Self {
        Self {
            parts: vec![QueryPart::column(column)],
        }
    }

    /// Build from a list of parts, rejecting anything that breaks the
    /// one-part-per-slot rule or does not belong in a SELECT entry.
    pub fn from_parts(parts: Vec<QueryPart>) -> PartResult<Self> {
        let columns = parts
            .iter()
            .filter(|p| p.slot() == PartSlot::Column)
            .count();
        if columns != 1 {
            return Err(PartError::ColumnCount(columns));
        }

        let mut seen: Vec<PartSlot> = Vec::with_capacity(parts.len());
        for part in &parts {
            let slot = part.slot();
            match slot {
                PartSlot::Time | PartSlot::Macro | PartSlot::Expression => {
                    return Err(PartError::Misplaced {
                        part_type: part.type_name(),
                        section: "select",
                    })
                }
                _ => {}
            }
            if seen.contains(&slot) {
                return Err(PartError::DuplicateSlot(slot));
            }
            seen.push(slot);
        }

        Ok(Self { parts })
    }

    pub fn with_part(mut self, part: QueryPart) -> PartResult<Self> {
        self.set_part(part)?;
        Ok(self)
    }

    /// Add a part, replacing whatever occupies the same slot.
    ///
    /// Setting a column part renames the column.
    pub fn set_part(&mut self, part: QueryPart) -> PartResult<()> {
        let slot = part.slot();
        if matches!(slot, PartSlot::Time | PartSlot::Macro | PartSlot::Expression) {
            return Err(PartError::Misplaced {
                part_type: part.type_name(),
                section: "select",
            });
        }
        match self.parts.iter_mut().find(|p| p.slot() == slot) {
            Some(existing) => *existing = part,
            None => self.parts.push(part),
        }
        Ok(())
    }

    /// Remove the part in `slot`; returns whether anything was removed.
    pub fn remove_part(&mut self, slot: PartSlot) -> PartResult<bool> {
        if slot == PartSlot::Column {
            return Err(PartError::ColumnRemoval);
        }
        let before = self.parts.len();
        self.parts.retain(|p| p.slot() != slot);
        Ok(self.parts.len() != before)
    }

    pub fn parts(&self) -> &[QueryPart] {
        &self.parts
    }

    fn find(&self, slot: PartSlot) -> Option<&QueryPart> {
        self.parts.iter().find(|p| p.slot() == slot)
    }

    /// Name of the underlying column.
    pub fn column(&self) -> &str {
        match self.find(PartSlot::Column) {
            Some(QueryPart::Column { name }) => name,
            _ => unreachable!("SelectColumn always holds a column part"),
        }
    }

    /// The `aggregate` or `percentile` part, if any.
    pub fn aggregate(&self) -> Option<&QueryPart> {
        self.find(PartSlot::Aggregate)
    }

    /// The `window` or `moving_window` part, if any.
    pub fn window(&self) -> Option<&QueryPart> {
        self.find(PartSlot::Window)
    }

    pub fn alias(&self) -> Option<&str> {
        match self.find(PartSlot::Alias) {
            Some(QueryPart::Alias { name }) => Some(name),
            _ => None,
        }
    }
}

impl TryFrom<Vec<QueryPart>> for SelectColumn {
    type Error = PartError;

    fn try_from(parts: Vec<QueryPart>) -> PartResult<Self> {
        Self::from_parts(parts)
    }
}

impl From<SelectColumn> for Vec<QueryPart> {
    fn from(column: SelectColumn) -> Self {
        column.parts
    }
}
