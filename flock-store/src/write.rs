use crate::document::{DocumentKey, Fields};

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Write {
    Set(Fields),
    Update(Fields),
    /// Add `delta` to a numeric field of an existing document, flooring the
    /// result at zero. A missing field counts as zero.
    Increment { field: String, delta: i64 },
    Delete,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Precondition {
    Version(u64),
    Exists,
    Missing,
}

/// Writes committed together. Either all preconditions hold and all writes
/// apply, or the store is left untouched.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct WriteBatch {
    preconditions: Vec<(DocumentKey, Precondition)>,
    writes: Vec<(DocumentKey, Write)>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, key: DocumentKey, precondition: Precondition) -> &mut Self {
        self.preconditions.push((key, precondition));
        self
    }

    pub fn set(&mut self, key: DocumentKey, fields: Fields) -> &mut Self {
        self.writes.push((key, Write::Set(fields)));
        self
    }

    pub fn create(&mut self, key: DocumentKey, fields: Fields) -> &mut Self {
        self.require(key.clone(), Precondition::Missing);
        self.set(key, fields)
    }

    pub fn update(&mut self, key: DocumentKey, fields: Fields) -> &mut Self {
        self.writes.push((key, Write::Update(fields)));
        self
    }

    pub fn increment(&mut self, key: DocumentKey, field: &str, delta: i64) -> &mut Self {
        self.writes.push((
            key,
            Write::Increment {
                field: field.to_owned(),
                delta,
            },
        ));
        self
    }

    pub fn delete(&mut self, key: DocumentKey) -> &mut Self {
        self.writes.push((key, Write::Delete));
        self
    }

    #[must_use]
    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    #[must_use]
    pub fn preconditions(&self) -> &[(DocumentKey, Precondition)] {
        &self.preconditions
    }

    #[must_use]
    pub fn writes(&self) -> &[(DocumentKey, Write)] {
        &self.writes
    }

    #[must_use]
    pub fn first_key(&self) -> Option<&DocumentKey> {
        self.preconditions
            .first()
            .map(|(key, _)| key)
            .or_else(|| self.writes.first().map(|(key, _)| key))
    }
}
