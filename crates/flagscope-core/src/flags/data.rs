use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::color::{ColorDistribution, ColorLabel};
use crate::flags::class::{ClassKey, FlagClass};
use crate::flags::entry::{AspectRatio, FlagReferenceEntry, LinePattern};

const FIELD_SEPARATOR: &str = r"\-";
const BUILTIN_CATALOG: &str = include_str!("../../assets/flags.txt");

/// Read-only reference table keyed by flag class.
#[derive(Debug, Clone)]
pub struct FlagCatalog {
    entries: BTreeMap<FlagClass, FlagReferenceEntry>,
    neutral: FlagReferenceEntry,
}

impl FlagCatalog {
    /// The embedded catalog, parsed once per process.
    pub fn builtin() -> &'static FlagCatalog {
        static BUILTIN: OnceLock<FlagCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| Self::parse(BUILTIN_CATALOG, "<builtin>"))
    }

    /// Load a catalog file in the `Name\-colors\-distribution\-pattern\-lines\-W:H\-description` format.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FlagCatalog> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to open catalog file: {}", path.display()))?;

        let catalog = Self::parse(&text, &path.display().to_string());
        if catalog.is_empty() {
            return Err(anyhow!("Catalog file {} has no usable entries", path.display()));
        }
        Ok(catalog)
    }

    /// Parse catalog text. Malformed lines are skipped with a warning.
    pub fn parse(text: &str, origin: &str) -> FlagCatalog {
        let mut entries = BTreeMap::new();

        for (line_num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Ok((class, entry)) => {
                    if entries.insert(class, entry).is_some() {
                        warn!("{origin}:{}: duplicate entry for '{class}', keeping the last one", line_num + 1);
                    }
                }
                Err(e) => warn!("{origin}:{}: skipping catalog line: {e:#}", line_num + 1),
            }
        }

        info!("Loaded {} flag classes from {}", entries.len(), origin);
        FlagCatalog {
            entries,
            neutral: FlagReferenceEntry::neutral(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `key`, if the catalog describes it.
    pub fn lookup(&self, key: &ClassKey) -> Option<&FlagReferenceEntry> {
        key.known().and_then(|class| self.entries.get(&class))
    }

    /// Entry for `key`, falling back to the neutral entry.
    pub fn resolve(&self, key: &ClassKey) -> &FlagReferenceEntry {
        self.lookup(key).unwrap_or(&self.neutral)
    }

    pub fn contains(&self, key: &ClassKey) -> bool {
        self.lookup(key).is_some()
    }

    /// Entries in class order.
    pub fn iter(&self) -> impl Iterator<Item = (FlagClass, &FlagReferenceEntry)> {
        self.entries.iter().map(|(class, entry)| (*class, entry))
    }
}

fn parse_line(line: &str) -> Result<(FlagClass, FlagReferenceEntry)> {
    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if parts.len() < 6 {
        return Err(anyhow!(
            "expected at least 6 fields separated by \\-, found {}",
            parts.len()
        ));
    }

    let class: FlagClass = parts[0].parse().map_err(|e: String| anyhow!(e))?;

    let colors = parts[1]
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<ColorLabel>().map_err(|e| anyhow!(e)))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Invalid color list '{}'", parts[1]))?;

    let expected_distribution = parse_distribution(parts[2])
        .with_context(|| format!("Invalid color distribution '{}'", parts[2]))?;

    let line_pattern: LinePattern = parts[3].parse().map_err(|e: String| anyhow!(e))?;

    let expected_lines = parts[4]
        .parse::<u32>()
        .with_context(|| format!("Invalid expected line count '{}'", parts[4]))?;

    // An unreadable ratio keeps the entry with the 3:2 default
    let aspect_ratio = parts[5].parse::<AspectRatio>().unwrap_or_else(|e| {
        warn!("{e}; using {}", AspectRatio::default());
        AspectRatio::default()
    });

    let pattern = parts.get(6).map(|s| s.to_string()).unwrap_or_default();

    Ok((
        class,
        FlagReferenceEntry {
            name: class.as_str().to_string(),
            colors,
            expected_distribution,
            line_pattern,
            expected_lines,
            aspect_ratio,
            pattern,
        },
    ))
}

fn parse_distribution(field: &str) -> Result<ColorDistribution> {
    let mut distribution = ColorDistribution::new();

    for pair in field.split(',').filter(|s| !s.trim().is_empty()) {
        let (color, share) = pair
            .split_once(':')
            .ok_or_else(|| anyhow!("expected color:proportion, got '{pair}'"))?;
        let color: ColorLabel = color.parse().map_err(|e: String| anyhow!(e))?;
        let share = share
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid proportion for {color}: '{share}'"))?;
        distribution.insert(color, share);
    }

    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_all_classes() {
        let catalog = FlagCatalog::builtin();
        assert_eq!(catalog.len(), FlagClass::ALL.len());
        for class in FlagClass::ALL {
            assert!(catalog.contains(&ClassKey::Known(class)), "missing {class}");
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = FlagCatalog::builtin();
        let entry = catalog.resolve(&ClassKey::parse("INDONESIA"));
        assert_eq!(entry.name, "indonesia");
        assert_eq!(entry.colors, vec![ColorLabel::Red, ColorLabel::White]);
        assert_eq!(entry.expected_distribution.get(&ColorLabel::Red), Some(&0.5));
        assert_eq!(entry.line_pattern, LinePattern::Horizontal);
        assert_eq!(entry.expected_lines, 1);
        assert_eq!(entry.aspect_ratio.value(), 1.5);
    }

    #[test]
    fn test_unknown_class_resolves_to_neutral() {
        let catalog = FlagCatalog::builtin();
        let key = ClassKey::parse("atlantis");
        assert!(catalog.lookup(&key).is_none());
        let entry = catalog.resolve(&key);
        assert_eq!(entry.line_pattern, LinePattern::Unknown);
        assert_eq!(entry.aspect_ratio.value(), 1.5);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "\
# comment
Laos\\-blue,red,white\\-blue:0.25,red:0.5,white:0.25\\-horizontal\\-2\\-2:3\\-tricolor
Atlantis\\-blue\\-blue:1.0\\-none\\-0\\-3:2\\-sunken
Vietnam\\-red,yellow\\-red:lots\\-none\\-0\\-3:2
Brunei\\-yellow
";
        let catalog = FlagCatalog::parse(text, "test");
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains(&ClassKey::Known(FlagClass::Laos)));
    }

    #[test]
    fn test_unreadable_aspect_defaults_to_three_by_two() {
        let catalog = FlagCatalog::parse(
            "Thailand\\-red,white,blue\\-red:0.33\\-horizontal\\-4\\-wide",
            "test",
        );
        let entry = catalog.resolve(&ClassKey::Known(FlagClass::Thailand));
        assert_eq!(entry.aspect_ratio, AspectRatio::new(3, 2));
        assert_eq!(entry.pattern, "");
    }
}
