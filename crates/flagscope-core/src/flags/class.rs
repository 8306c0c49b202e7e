use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of flag classes the catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagClass {
    Brunei,
    Cambodia,
    Indonesia,
    Laos,
    Malaysia,
    Myanmar,
    Philippines,
    Singapore,
    Thailand,
    Vietnam,
}

impl FlagClass {
    pub const ALL: [FlagClass; 10] = [
        FlagClass::Brunei,
        FlagClass::Cambodia,
        FlagClass::Indonesia,
        FlagClass::Laos,
        FlagClass::Malaysia,
        FlagClass::Myanmar,
        FlagClass::Philippines,
        FlagClass::Singapore,
        FlagClass::Thailand,
        FlagClass::Vietnam,
    ];

    /// Lower-case key used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagClass::Brunei => "brunei",
            FlagClass::Cambodia => "cambodia",
            FlagClass::Indonesia => "indonesia",
            FlagClass::Laos => "laos",
            FlagClass::Malaysia => "malaysia",
            FlagClass::Myanmar => "myanmar",
            FlagClass::Philippines => "philippines",
            FlagClass::Singapore => "singapore",
            FlagClass::Thailand => "thailand",
            FlagClass::Vietnam => "vietnam",
        }
    }
}

impl fmt::Display for FlagClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlagClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        FlagClass::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("Unknown flag class: {s}"))
    }
}

/// A class label coming from outside: either one of the known flags or an
/// arbitrary unknown label (kept lower-cased for reporting).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassKey {
    Known(FlagClass),
    Unknown(String),
}

impl ClassKey {
    /// Case-insensitive parse that never fails.
    pub fn parse(label: &str) -> Self {
        label
            .parse::<FlagClass>()
            .map(ClassKey::Known)
            .unwrap_or_else(|_| ClassKey::Unknown(label.trim().to_lowercase()))
    }

    pub fn known(&self) -> Option<FlagClass> {
        match self {
            ClassKey::Known(class) => Some(*class),
            ClassKey::Unknown(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClassKey::Known(class) => class.as_str(),
            ClassKey::Unknown(label) => label,
        }
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
