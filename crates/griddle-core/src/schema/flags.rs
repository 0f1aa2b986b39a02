use std::fmt;

/// A single column behavior flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFlag {
    ReadOnly,
    Private,
    Polymorphic,
    Primary,
    AutoIncrement,
    Required,
    Unique,
    Encrypted,
    Searchable,
    Translatable,
    CaseSensitive,
    Virtual,
    Queryable,
}

impl ColumnFlag {
    // DDL fragment order follows this listing; keep Required/Unique ahead
    // of AutoIncrement so column attributes render conventionally.
    pub const ALL: [ColumnFlag; 13] = [
        ColumnFlag::ReadOnly,
        ColumnFlag::Private,
        ColumnFlag::Polymorphic,
        ColumnFlag::Primary,
        ColumnFlag::Required,
        ColumnFlag::Unique,
        ColumnFlag::AutoIncrement,
        ColumnFlag::Encrypted,
        ColumnFlag::Searchable,
        ColumnFlag::Translatable,
        ColumnFlag::CaseSensitive,
        ColumnFlag::Virtual,
        ColumnFlag::Queryable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ReadOnly => "ReadOnly",
            Self::Private => "Private",
            Self::Polymorphic => "Polymorphic",
            Self::Primary => "Primary",
            Self::AutoIncrement => "AutoIncrement",
            Self::Required => "Required",
            Self::Unique => "Unique",
            Self::Encrypted => "Encrypted",
            Self::Searchable => "Searchable",
            Self::Translatable => "Translatable",
            Self::CaseSensitive => "CaseSensitive",
            Self::Virtual => "Virtual",
            Self::Queryable => "Queryable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// A set of [`ColumnFlag`] values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColumnFlags(u32);

impl ColumnFlags {
    pub const EMPTY: ColumnFlags = ColumnFlags(0);

    pub fn contains(self, flag: ColumnFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: ColumnFlag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: ColumnFlag) {
        self.0 &= !flag.bit();
    }

    pub fn with(mut self, flag: ColumnFlag) -> Self {
        self.insert(flag);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = ColumnFlag> {
        ColumnFlag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }

    /// Builds a flag set from string names, ignoring unknown ones.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut flags = Self::EMPTY;
        for name in names {
            if let Some(flag) = ColumnFlag::from_name(name) {
                flags.insert(flag);
            }
        }
        flags
    }

    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(ColumnFlag::name).collect()
    }
}

impl From<ColumnFlag> for ColumnFlags {
    fn from(flag: ColumnFlag) -> Self {
        ColumnFlags(flag.bit())
    }
}

impl FromIterator<ColumnFlag> for ColumnFlags {
    fn from_iter<T: IntoIterator<Item = ColumnFlag>>(iter: T) -> Self {
        let mut flags = Self::EMPTY;
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl fmt::Debug for ColumnFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_test() {
        let mut flags = ColumnFlags::EMPTY;
        flags.insert(ColumnFlag::Required);
        flags.insert(ColumnFlag::Unique);

        assert!(flags.contains(ColumnFlag::Required));
        assert!(flags.contains(ColumnFlag::Unique));
        assert!(!flags.contains(ColumnFlag::Primary));

        flags.remove(ColumnFlag::Unique);
        assert!(!flags.contains(ColumnFlag::Unique));
    }

    #[test]
    fn names_round_trip() {
        let flags = ColumnFlags::from_names(["Required", "Translatable", "NotAFlag"]);
        assert_eq!(flags.names(), vec!["Required", "Translatable"]);
    }
}
