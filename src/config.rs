//! Fixed configuration surface: recognized fields, filters, translation tables
//! and the defaults for the remote wiki.

use crate::record::StatField;

pub const DEFAULT_API_URL: &str = "https://runescape.wiki/api.php";
pub const DEFAULT_OUTPUT: &str = "equipment_data.json";
pub const IMAGE_URL_PREFIX: &str = "https://runescape.wiki/images/";
pub const USER_AGENT: &str = concat!("equipment_scraper/", env!("CARGO_PKG_VERSION"));

pub const ITEM_TEMPLATE: &str = "Infobox Item";
pub const BONUSES_TEMPLATE: &str = "Infobox Bonuses";

/// Full-text search that finds every page embedding the bonuses infobox.
pub const SEARCH_QUERY: &str = r"insource:/\{\{*Infobox Bonuses*/";
pub const SEARCH_LIMIT: usize = 500;
/// MediaWiki caps `pageids` at 50 for non-bot clients.
pub const READ_CHUNK: usize = 50;

pub const CONCURRENCY: usize = 4;
pub const MAX_RETRIES: u32 = 3;
pub const BASE_BACKOFF_MS: u64 = 2000;

/// Dyed and augmented variants duplicate their base item.
pub const DISALLOWED_CATEGORIES: &[&str] = &["Category:Augmented items", "Category:Dyed equipment"];

/// Bonuses-template parameters copied into `stats`, in output order.
pub const STAT_FIELDS: &[StatField] = &[
    StatField::Class,
    StatField::Slot,
    StatField::Tier,
    StatField::DamageTier,
    StatField::AccuracyTier,
    StatField::ArmourTier,
    StatField::InvTier,
    StatField::Type,
    StatField::Damage,
    StatField::Accuracy,
    StatField::Style,
    StatField::Armour,
    StatField::Life,
    StatField::Prayer,
    StatField::Strength,
    StatField::Ranged,
    StatField::Magic,
    StatField::Necromancy,
    StatField::PvmReduction,
    StatField::PvpReduction,
    StatField::AttackRange,
    StatField::Speed,
];

/// A record is equipment when any of these is strictly positive. `attack` is
/// never a bonuses parameter, so it can only ever be absent.
pub const QUALIFYING_STATS: &[&str] = &[
    "armour",
    "strength",
    "attack",
    "damage",
    "accuracy",
    "ranged",
    "magic",
    "necromancy",
    "prayer",
    "life",
];

/// Fields rewritten from strings to numbers after qualification.
pub const NUMERIC_FIELDS: &[StatField] = &[
    StatField::Accuracy,
    StatField::AttackRange,
    StatField::Speed,
    StatField::Damage,
    StatField::Armour,
    StatField::Strength,
    StatField::Ranged,
    StatField::Magic,
    StatField::ArmourTier,
    StatField::PvmReduction,
    StatField::DamageTier,
    StatField::AccuracyTier,
    StatField::Necromancy,
    StatField::Life,
    StatField::Prayer,
    StatField::Tier,
];

/// One row of a translation table: any of `from` (case-insensitive) becomes `to`.
#[derive(Debug, Clone, Copy)]
pub struct Translation {
    pub from: &'static [&'static str],
    pub to: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct TranslationTable {
    pub field: StatField,
    pub entries: &'static [Translation],
}

const fn tr(from: &'static [&'static str], to: &'static str) -> Translation {
    Translation { from, to }
}

/// Applied in this order.
pub const TRANSLATIONS: &[TranslationTable] = &[
    TranslationTable {
        field: StatField::Type,
        entries: &[
            tr(&["power armour"], "power"),
            tr(&["repriser", "rebounder"], "defender"),
        ],
    },
    TranslationTable {
        field: StatField::Style,
        entries: &[
            tr(&["stabbing"], "stab"),
            tr(&["crushing"], "crush"),
            tr(&["slashing"], "slash"),
            tr(&["bolts"], "bolt"),
            tr(&["arrows"], "arrow"),
        ],
    },
    TranslationTable {
        field: StatField::Class,
        entries: &[tr(&["all", "none"], "hybrid")],
    },
    TranslationTable {
        field: StatField::Slot,
        entries: &[
            tr(&["offhand", "off-hand weapon"], "off-hand"),
            tr(&["mainhand", "weapon", "main hand"], "main-hand"),
            tr(&["back"], "cape"),
            tr(&["torso"], "body"),
        ],
    },
    TranslationTable {
        field: StatField::Tier,
        entries: &[tr(&["no", "none"], "0")],
    },
];

/// How declared-numeric fields holding non-numeric text are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericPolicy {
    /// Abort with an error naming the field.
    #[default]
    Strict,
    /// Keep the original string.
    Lenient,
}

/// Runtime settings for a full scrape.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub output: std::path::PathBuf,
    pub search: String,
    pub max_pages: Option<usize>,
    pub numeric: NumericPolicy,
}

/// Human-readable dump used by the `fields` subcommand.
pub fn describe() -> String {
    let mut out = String::new();
    let join = |fields: &[StatField]| {
        fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
    };

    out.push_str(&format!("Templates:        {} + {}\n", ITEM_TEMPLATE, BONUSES_TEMPLATE));
    out.push_str(&format!("Stat fields:      {}\n", join(STAT_FIELDS)));
    out.push_str(&format!("Numeric fields:   {}\n", join(NUMERIC_FIELDS)));
    out.push_str(&format!("Qualifying stats: {}\n", QUALIFYING_STATS.join(", ")));
    out.push_str(&format!("Excluded:         {}\n", DISALLOWED_CATEGORIES.join(", ")));
    out.push_str(&format!("Image prefix:     {}\n", IMAGE_URL_PREFIX));
    out.push_str("Translations:\n");
    for table in TRANSLATIONS {
        for t in table.entries {
            out.push_str(&format!(
                "  {:<8} {} -> {}\n",
                table.field.as_str(),
                t.from.join(" | "),
                t.to
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_are_recognized_fields() {
        assert!(NUMERIC_FIELDS.iter().all(|f| STAT_FIELDS.contains(f)));
        assert_eq!(STAT_FIELDS.len(), 22);
        assert_eq!(NUMERIC_FIELDS.len(), 16);
    }

    #[test]
    fn canonical_outputs_are_lowercase() {
        for table in TRANSLATIONS {
            for t in table.entries {
                assert_eq!(t.to, t.to.to_lowercase());
            }
        }
    }

    #[test]
    fn describe_lists_every_table() {
        let text = describe();
        assert!(text.contains("off-hand weapon -> off-hand"));
        assert!(text.contains("Category:Dyed equipment"));
        assert!(text.contains("attack_range"));
    }
}
