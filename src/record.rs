use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Bonuses-template parameters recognized as stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    Class,
    Slot,
    Tier,
    DamageTier,
    AccuracyTier,
    ArmourTier,
    InvTier,
    Type,
    Damage,
    Accuracy,
    Style,
    Armour,
    Life,
    Prayer,
    Strength,
    Ranged,
    Magic,
    Necromancy,
    PvmReduction,
    PvpReduction,
    AttackRange,
    Speed,
}

impl StatField {
    /// Parameter name on the wiki, which is also the output key.
    pub fn as_str(self) -> &'static str {
        match self {
            StatField::Class => "class",
            StatField::Slot => "slot",
            StatField::Tier => "tier",
            StatField::DamageTier => "damageTier",
            StatField::AccuracyTier => "accuracyTier",
            StatField::ArmourTier => "armourTier",
            StatField::InvTier => "invtier",
            StatField::Type => "type",
            StatField::Damage => "damage",
            StatField::Accuracy => "accuracy",
            StatField::Style => "style",
            StatField::Armour => "armour",
            StatField::Life => "life",
            StatField::Prayer => "prayer",
            StatField::Strength => "strength",
            StatField::Ranged => "ranged",
            StatField::Magic => "magic",
            StatField::Necromancy => "necromancy",
            StatField::PvmReduction => "pvmReduction",
            StatField::PvpReduction => "pvpReduction",
            StatField::AttackRange => "attack_range",
            StatField::Speed => "speed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Text(String),
    Number(f64),
}

impl StatValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StatValue::Text(s) => Some(s),
            StatValue::Number(_) => None,
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatValue::Text(s) => serializer.serialize_str(s),
            // Integral values print as `15`, not `15.0`.
            StatValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            StatValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

/// Ordered stat map; keys keep the order they were inserted in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats(Vec<(StatField, StatValue)>);

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: StatField) -> Option<&StatValue> {
        self.iter().find(|(f, _)| *f == field).map(|(_, v)| v)
    }

    /// Lookup by output key, e.g. `"attack_range"`.
    pub fn get_by_name(&self, name: &str) -> Option<&StatValue> {
        self.iter().find(|(f, _)| f.as_str() == name).map(|(_, v)| v)
    }

    /// Builder-style insert; replaces in place when the field is present.
    pub fn with(mut self, field: StatField, value: StatValue) -> Self {
        match self.0.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.0.push((field, value)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &(StatField, StatValue)> {
        self.0.iter()
    }
}

impl FromIterator<(StatField, StatValue)> for Stats {
    fn from_iter<I: IntoIterator<Item = (StatField, StatValue)>>(iter: I) -> Self {
        iter.into_iter().fold(Stats::new(), |s, (f, v)| s.with(f, v))
    }
}

impl IntoIterator for Stats {
    type Item = (StatField, StatValue);
    type IntoIter = std::vec::IntoIter<(StatField, StatValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for Stats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, value) in &self.0 {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

/// One emitted equipment entry (one per item version).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRecord {
    pub item_name: String,
    /// `None` when the infobox id is not an integer; serialized as `null`.
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub stats: Stats,
}

/// A fetched wiki page, as handed to the extractor.
#[derive(Debug, Clone)]
pub struct WikiPage {
    pub title: String,
    pub content: String,
    pub categories: Vec<String>,
}
