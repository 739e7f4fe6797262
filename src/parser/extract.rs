use super::normalize::{coerce_numeric, leading_int, normalize, qualifies};
use super::wikitext::{Template, Wikitext};
use super::ExtractError;
use crate::config::{NumericPolicy, IMAGE_URL_PREFIX, STAT_FIELDS};
use crate::record::{StatRecord, StatValue, Stats};

/// The two infoboxes an equipment page is built from.
pub struct EquipmentPage<'a> {
    pub title: &'a str,
    pub wikitext: &'a Wikitext,
    pub item: &'a Template,
    pub bonuses: &'a Template,
}

impl<'a> EquipmentPage<'a> {
    /// Version indices 1, 2, … for as long as the bonuses box declares `version{n}`.
    pub fn versions(&self) -> impl Iterator<Item = u32> + 'a {
        let bonuses = self.bonuses;
        std::iter::successors(Some(1u32), move |v| {
            bonuses
                .has_param(&format!("version{}", v + 1))
                .then_some(v + 1)
        })
    }

    /// Raw stat strings for `version`; empty parameters are left out.
    pub fn raw_stats(&self, version: u32) -> Stats {
        STAT_FIELDS
            .iter()
            .filter_map(|field| {
                self.bonuses
                    .versioned(field.as_str(), version)
                    .map(|v| (*field, StatValue::Text(v.to_string())))
            })
            .collect()
    }

    pub fn image(&self, version: u32) -> Option<String> {
        let link = self.item.versioned("image", version)?;
        self.wikitext
            .file_target(link)
            .map(|target| format!("{}{}", IMAGE_URL_PREFIX, target))
    }

    /// `Ok(None)` means this version is not equipment.
    pub fn record(&self, version: u32, policy: NumericPolicy) -> Result<Option<StatRecord>, ExtractError> {
        let stats = normalize(self.raw_stats(version));
        if !qualifies(&stats) {
            return Ok(None);
        }
        let stats = coerce_numeric(stats, policy)?;

        Ok(Some(StatRecord {
            item_name: self
                .item
                .versioned("name", version)
                .unwrap_or(self.title)
                .to_string(),
            id: self.item.versioned("id", version).and_then(leading_int),
            image: self.image(version),
            stats,
        }))
    }

    /// Records for every version up to the first one that is not equipment.
    pub fn records(&self, policy: NumericPolicy) -> Result<Vec<StatRecord>, ExtractError> {
        self.versions()
            .map(|v| self.record(v, policy))
            .map_while(Result::transpose)
            .collect()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BONUSES_TEMPLATE, ITEM_TEMPLATE};
    use crate::parser::wikitext::parse;
    use crate::record::StatField;

    fn with_page<T>(markup: &str, f: impl FnOnce(&EquipmentPage) -> T) -> T {
        let wt = parse(markup);
        let page = EquipmentPage {
            title: "Page title",
            wikitext: &wt,
            item: wt.template(ITEM_TEMPLATE).unwrap(),
            bonuses: wt.template(BONUSES_TEMPLATE).unwrap(),
        };
        f(&page)
    }

    #[test]
    fn versions_follow_markers() {
        let md = "{{Infobox Item|name=a}}{{Infobox Bonuses|version1=A|version2=B|version3=}}";
        let v: Vec<u32> = with_page(md, |p| p.versions().collect());
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn single_version_without_markers() {
        let md = "{{Infobox Item|name=a}}{{Infobox Bonuses|damage=1}}";
        let v: Vec<u32> = with_page(md, |p| p.versions().collect());
        assert_eq!(v, vec![1]);
    }

    #[test]
    fn gap_in_markers_stops_sequence() {
        let md = "{{Infobox Item}}{{Infobox Bonuses|version2=x|version4=y}}";
        let v: Vec<u32> = with_page(md, |p| p.versions().collect());
        assert_eq!(v, vec![1, 2]);
    }

    #[test]
    fn raw_stats_in_field_order_without_empties() {
        let md = "{{Infobox Item}}{{Infobox Bonuses|damage=5|class=Melee|armour=|speed1=3}}";
        let stats = with_page(md, |p| p.raw_stats(1));
        let keys: Vec<&str> = stats.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(keys, vec!["class", "damage", "speed"]);
    }

    #[test]
    fn name_falls_back_to_title() {
        let md = "{{Infobox Item|id=7}}{{Infobox Bonuses|damage=5}}";
        let rec = with_page(md, |p| p.record(1, NumericPolicy::Strict)).unwrap().unwrap();
        assert_eq!(rec.item_name, "Page title");
        assert_eq!(rec.id, Some(7));
    }

    #[test]
    fn image_resolved_through_file_links() {
        let md = "{{Infobox Item|image=[[File:Rune sword.png]]|image2=[[File:Missing.png]]}}\
                  {{Infobox Bonuses|damage=5|version2=}}";
        with_page(md, |p| {
            assert_eq!(
                p.image(1).as_deref(),
                Some("https://runescape.wiki/images/Rune_sword.png")
            );
            // image2 text is also a file link on the page, so it resolves too
            assert!(p.image(2).is_some());
        });
        let md = "{{Infobox Item|image=Rune sword.png}}{{Infobox Bonuses|damage=5}}";
        assert_eq!(with_page(md, |p| p.image(1)), None);
    }

    #[test]
    fn later_failed_version_keeps_earlier_records() {
        let md = "{{Infobox Item|name1=A|name2=B|name3=C}}\
                  {{Infobox Bonuses|version1=|version2=|version3=|damage1=5|damage2=0|damage3=9}}";
        let recs = with_page(md, |p| p.records(NumericPolicy::Strict)).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].item_name, "A");
        assert_eq!(recs[0].stats.get(StatField::Damage), Some(&StatValue::Number(5.0)));
    }

    #[test]
    fn unparseable_id_is_none() {
        let md = "{{Infobox Item|id=unknown}}{{Infobox Bonuses|damage=5}}";
        let rec = with_page(md, |p| p.record(1, NumericPolicy::Strict)).unwrap().unwrap();
        assert_eq!(rec.id, None);
    }
}
