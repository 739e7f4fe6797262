pub mod extract;
pub mod normalize;
pub mod wikitext;

use thiserror::Error;
use tracing::debug;

use crate::config::{NumericPolicy, BONUSES_TEMPLATE, ITEM_TEMPLATE};
use crate::record::StatRecord;
use extract::EquipmentPage;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("field `{field}` is declared numeric but holds {value:?}")]
    MalformedNumber { field: &'static str, value: String },
}

/// markup → templates → one normalized record per item version.
///
/// Pages without both infoboxes, or whose first version is not equipment,
/// yield no records.
pub fn extract_page(
    markup: &str,
    title: &str,
    policy: NumericPolicy,
) -> Result<Vec<StatRecord>, ExtractError> {
    let wikitext = wikitext::parse(markup);
    let (Some(item), Some(bonuses)) = (
        wikitext.template(ITEM_TEMPLATE),
        wikitext.template(BONUSES_TEMPLATE),
    ) else {
        debug!(title, "missing infobox, skipping");
        return Ok(Vec::new());
    };

    let page = EquipmentPage {
        title,
        wikitext: &wikitext,
        item,
        bonuses,
    };
    page.records(policy)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.wiki", name)).unwrap()
    }

    fn extract(markup: &str, title: &str) -> Vec<StatRecord> {
        extract_page(markup, title, NumericPolicy::Strict).unwrap()
    }

    #[test]
    fn test_sword_example() {
        let md = "{{Infobox Item|name=Test Sword|id=1234}}\n\
                  {{Infobox Bonuses|style=Slashing|damage=500|accuracy=120|armour=0}}";
        let recs = extract(md, "Test Sword");
        assert_eq!(recs.len(), 1);
        let v = serde_json::to_value(&recs[0]).unwrap();
        assert_eq!(
            v,
            json!({
                "itemName": "Test Sword",
                "id": 1234,
                "stats": { "damage": 500, "accuracy": 120, "style": "slash", "armour": 0 }
            })
        );
    }

    #[test]
    fn missing_templates_yield_nothing() {
        assert!(extract("{{Infobox Item|name=x|id=1}}", "x").is_empty());
        assert!(extract("{{Infobox Bonuses|damage=100}}", "x").is_empty());
        assert!(extract("plain text", "x").is_empty());
    }

    #[test]
    fn all_zero_page_is_dropped() {
        let md = "{{Infobox Item|name=Cabbage|id=1965}}{{Infobox Bonuses|armour=0|damage=0|life=0}}";
        assert!(extract(md, "Cabbage").is_empty());
    }

    #[test]
    fn first_version_failing_skips_whole_page() {
        let md = "{{Infobox Item|name1=Broken|name2=Fixed}}\
                  {{Infobox Bonuses|version1=Broken|version2=Fixed|damage1=0|damage2=300}}";
        assert!(extract(md, "Thing").is_empty());
    }

    #[test]
    fn malformed_numeric_aborts() {
        let md = "{{Infobox Item|name=x}}{{Infobox Bonuses|damage=N/A|armour=50}}";
        let err = extract_page(md, "x", NumericPolicy::Strict).unwrap_err();
        assert!(err.to_string().contains("damage"));
        let recs = extract_page(md, "x", NumericPolicy::Lenient).unwrap();
        assert_eq!(recs[0].stats.get_by_name("damage").and_then(|v| v.as_text()), Some("N/A"));
    }

    #[test]
    fn multi_version_fixture() {
        let recs = extract(&fixture("multi_version"), "Dragon dagger");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].item_name, "Dragon dagger");
        assert_eq!(recs[1].item_name, "Dragon dagger (p++)");
        assert_eq!(recs[0].id, Some(1215));
        assert_eq!(recs[1].id, Some(5698));
        let d0 = serde_json::to_value(&recs[0].stats).unwrap();
        let d1 = serde_json::to_value(&recs[1].stats).unwrap();
        assert_eq!(d0["damage"], 480);
        assert_eq!(d1["damage"], 520);
        assert_eq!(d0["slot"], "main-hand");
        assert_eq!(d0["style"], "stab");
        assert_eq!(d0["class"], "melee");
        assert_eq!(d0["accuracy"], d1["accuracy"]);
        assert_eq!(
            recs[0].image.as_deref(),
            Some("https://runescape.wiki/images/Dragon_dagger.png")
        );
        assert_eq!(
            recs[1].image.as_deref(),
            Some("https://runescape.wiki/images/Dragon_dagger_(p++).png")
        );
    }

    #[test]
    fn armour_fixture() {
        let recs = extract(&fixture("armour"), "Bandos chestplate");
        assert_eq!(recs.len(), 1);
        let v = serde_json::to_value(&recs[0]).unwrap();
        assert_eq!(v["itemName"], "Bandos chestplate");
        assert_eq!(v["stats"]["slot"], "body");
        assert_eq!(v["stats"]["type"], "power");
        assert_eq!(v["stats"]["armour"], 488.5);
        assert_eq!(v["stats"]["tier"], 80);
        assert_eq!(v["stats"]["invtier"], "no");
        assert!(v.get("image").is_none());
    }

    #[test]
    fn non_equipment_fixture() {
        assert!(extract(&fixture("non_equipment"), "Lobster").is_empty());
    }
}
