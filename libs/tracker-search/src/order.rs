use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use crate::error::ValidationError;
use crate::key::CompositeKey;

static EMPTY: LazyLock<OrderingSpec> = LazyLock::new(|| OrderingSpec(Vec::new()));

// Ordering primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SortDir {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDir {
    /// Apply the direction to a natural ordering.
    #[must_use]
    pub fn apply(self, natural: Ordering) -> Ordering {
        match self {
            SortDir::Asc => natural,
            SortDir::Desc => natural.reverse(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

impl OrderKey {
    #[must_use]
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }

    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDir::Asc)
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDir::Desc)
    }
}

/// Validated list of order keys. No column appears twice (compared
/// case-insensitively, as field maps are).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OrderingSpec(Vec<OrderKey>);

impl OrderingSpec {
    /// # Errors
    /// - `ValidationError::EmptyColumn` if a field name is blank
    /// - `ValidationError::DuplicateColumn` if a field appears twice
    pub fn new(keys: Vec<OrderKey>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(keys.len());
        for key in &keys {
            if key.field.trim().is_empty() {
                return Err(ValidationError::EmptyColumn);
            }
            if !seen.insert(key.field.to_lowercase()) {
                return Err(ValidationError::DuplicateColumn(key.field.clone()));
            }
        }
        Ok(Self(keys))
    }

    /// The shared "no particular ordering" spec.
    #[must_use]
    pub fn empty() -> &'static OrderingSpec {
        &EMPTY
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn keys(&self) -> &[OrderKey] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|k| k.field.eq_ignore_ascii_case(field))
    }

    /// Render as "+f1,-f2"
    #[must_use]
    pub fn to_signed_tokens(&self) -> String {
        self.0
            .iter()
            .map(|k| match k.dir {
                SortDir::Asc => format!("+{}", k.field),
                SortDir::Desc => format!("-{}", k.field),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse signed tokens ("+a,-b"); a bare name means ascending. An empty
    /// string yields the empty spec.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidToken` for a sign without a name, and
    /// the [`OrderingSpec::new`] errors for duplicates.
    pub fn from_signed_tokens(signed: &str) -> Result<Self, ValidationError> {
        let mut out = Vec::new();
        for seg in signed.split(',') {
            let seg = seg.trim();
            if seg.is_empty() {
                continue;
            }
            let (dir, name) = if let Some(rest) = seg.strip_prefix('+') {
                (SortDir::Asc, rest)
            } else if let Some(rest) = seg.strip_prefix('-') {
                (SortDir::Desc, rest)
            } else {
                (SortDir::Asc, seg)
            };
            if name.trim().is_empty() {
                return Err(ValidationError::InvalidToken(seg.to_owned()));
            }
            out.push(OrderKey::new(name.trim(), dir));
        }
        Self::new(out)
    }

    /// New spec with `field` appended when not already present.
    #[must_use]
    pub fn with_tiebreaker(&self, field: &str, dir: SortDir) -> Self {
        let mut keys = self.0.clone();
        if !self.contains(field) {
            keys.push(OrderKey::new(field, dir));
        }
        Self(keys)
    }

    /// Lexicographic comparison of two keys under this ordering.
    ///
    /// Only the common prefix is compared, so the empty key compares equal
    /// to everything; callers treat it as "before the first row".
    #[must_use]
    pub fn compare_keys(&self, a: &CompositeKey, b: &CompositeKey) -> Ordering {
        for ((key, va), vb) in self.0.iter().zip(a.values()).zip(b.values()) {
            let ord = key.dir.apply(va.cmp(vb));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for OrderingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(none)");
        }

        let formatted: Vec<String> = self
            .0
            .iter()
            .map(|key| {
                let dir_str = match key.dir {
                    SortDir::Asc => "asc",
                    SortDir::Desc => "desc",
                };
                format!("{} {}", key.field, dir_str)
            })
            .collect();

        write!(f, "{}", formatted.join(", "))
    }
}

impl serde::Serialize for OrderingSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_signed_tokens())
    }
}

impl<'de> serde::Deserialize<'de> for OrderingSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_signed_tokens(&s).map_err(serde::de::Error::custom)
    }
}
