//! Free-text label → category resolution and per-category prompt hints.
use std::collections::BTreeMap;

use scene_core::Category;
use serde_json::Value;

use crate::error::KeywordError;

/// Ordered prompt keywords per category.
pub type CategoryKeywords = BTreeMap<Category, Vec<String>>;

use Category::*;

/// Curated ADE20K-style vocabulary. Substring lookups walk this table in
/// order, so earlier entries win.
pub const LABEL_TO_CATEGORY: &[(&str, Category)] = &[
    // people, animals
    ("person", BassSubject),
    ("people", BassSubject),
    ("animal", BassSubject),
    ("dog", BassSubject),
    ("cat", BassSubject),
    ("bird", BassSubject),
    ("horse", BassSubject),
    ("cow", BassSubject),
    ("sheep", BassSubject),
    ("elephant", BassSubject),
    ("bear", BassSubject),
    ("zebra", BassSubject),
    ("giraffe", BassSubject),
    ("sculpture", BassSubject),
    ("statue", BassSubject),
    // vegetation
    ("tree", MidOrganic),
    ("palm", MidOrganic),
    ("plant", MidOrganic),
    ("flower", MidOrganic),
    ("grass", MidOrganic),
    ("bush", MidOrganic),
    ("leaves", MidOrganic),
    ("branch", MidOrganic),
    ("hedge", MidOrganic),
    ("forest", MidOrganic),
    ("vegetation", MidOrganic),
    ("flora", MidOrganic),
    ("shrub", MidOrganic),
    ("field", MidOrganic),
    // sky, light sources
    ("sky", HighSky),
    ("cloud", HighSky),
    ("sun", HighSky),
    ("moon", HighSky),
    ("star", HighSky),
    ("light", HighSky),
    ("lamp", HighSky),
    ("chandelier", HighSky),
    ("candle", HighSky),
    // ground, water, terrain
    ("floor", BeatGround),
    ("ground", BeatGround),
    ("earth", BeatGround),
    ("sand", BeatGround),
    ("snow", BeatGround),
    ("water", BeatGround),
    ("sea", BeatGround),
    ("river", BeatGround),
    ("lake", BeatGround),
    ("pool", BeatGround),
    ("road", BeatGround),
    ("path", BeatGround),
    ("sidewalk", BeatGround),
    ("pavement", BeatGround),
    ("rock", BeatGround),
    ("stone", BeatGround),
    ("mountain", BeatGround),
    ("hill", BeatGround),
    ("dirt", BeatGround),
    ("mud", BeatGround),
    ("carpet", BeatGround),
    ("rug", BeatGround),
    ("terrain", BeatGround),
    ("waterfall", BeatGround),
    ("swimming pool", BeatGround),
    // buildings, vehicles, furniture
    ("building", MidStructure),
    ("house", MidStructure),
    ("tower", MidStructure),
    ("bridge", MidStructure),
    ("fence", MidStructure),
    ("car", MidStructure),
    ("truck", MidStructure),
    ("bus", MidStructure),
    ("train", MidStructure),
    ("boat", MidStructure),
    ("ship", MidStructure),
    ("airplane", MidStructure),
    ("bicycle", MidStructure),
    ("motorcycle", MidStructure),
    ("chair", MidStructure),
    ("table", MidStructure),
    ("desk", MidStructure),
    ("bed", MidStructure),
    ("sofa", MidStructure),
    ("couch", MidStructure),
    ("bench", MidStructure),
    ("door", MidStructure),
    ("window", MidStructure),
    ("stairway", MidStructure),
    ("stairs", MidStructure),
    ("column", MidStructure),
    ("pillar", MidStructure),
    ("roof", MidStructure),
    ("tent", MidStructure),
    ("shelter", MidStructure),
    ("cabinet", MidStructure),
    ("counter", MidStructure),
    ("bookcase", MidStructure),
    ("shelf", MidStructure),
    ("railing", MidStructure),
    ("skyscraper", MidStructure),
    // walls, decor
    ("wall", LowAmbient),
    ("curtain", LowAmbient),
    ("blind", LowAmbient),
    ("screen", LowAmbient),
    ("mirror", LowAmbient),
    ("ceiling", LowAmbient),
    ("painting", LowAmbient),
    ("poster", LowAmbient),
    ("banner", LowAmbient),
    ("flag", LowAmbient),
    ("box", LowAmbient),
    ("bag", LowAmbient),
    ("blanket", LowAmbient),
    ("towel", LowAmbient),
    ("cloth", LowAmbient),
];

/// Resolve a free-text label.
///
/// Trimmed, case-insensitive exact match first, then the first dictionary
/// key that contains the label or is contained in it. Empty and unknown
/// labels resolve to `LowAmbient`.
pub fn label_to_category(label: &str) -> Category {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return LowAmbient;
    }
    if let Some(&(_, category)) = LABEL_TO_CATEGORY.iter().find(|(key, _)| *key == label) {
        return category;
    }
    LABEL_TO_CATEGORY
        .iter()
        .find(|(key, _)| {
            label.contains(key) || key.contains(label.as_str())
        })
        .map(|&(_, category)| category)
        .unwrap_or(LowAmbient)
}

/// Prompt hints derived from the dictionary, for requests without their own.
pub fn static_keywords() -> CategoryKeywords {
    let mut keywords = CategoryKeywords::new();
    for &(key, category) in LABEL_TO_CATEGORY {
        keywords.entry(category).or_default().push(key.to_string());
    }
    keywords
}

/// Parse `{"0": ["fox", "owl"], "3": ["river"]}` style hints.
///
/// The object may be wrapped in a Markdown code fence. Ids outside 0..=5 and
/// empty or non-array values are skipped; array entries that are not strings
/// are kept in their JSON form.
pub fn parse_category_keywords(text: &str) -> Result<CategoryKeywords, KeywordError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))?;
    let Value::Object(entries) = value else {
        return Err(KeywordError::NotAnObject);
    };

    let mut keywords = CategoryKeywords::new();
    for (key, value) in entries {
        let id: i64 = key
            .trim()
            .parse()
            .map_err(|_| KeywordError::InvalidCategory(key.clone()))?;
        if !(0..Category::COUNT as i64).contains(&id) {
            continue;
        }
        let Value::Array(items) = value else {
            continue;
        };
        if items.is_empty() {
            continue;
        }
        let words = items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        keywords.insert(Category::from_id(id as u8), words);
    }

    let total: usize = keywords.values().map(Vec::len).sum();
    log::debug!(
        "parsed {} keywords across {} categories",
        total,
        keywords.len()
    );
    Ok(keywords)
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    if !text.starts_with("```") {
        return text;
    }
    let body = text.split_once('\n').map_or("", |(_, rest)| rest);
    body.rsplit_once("```")
        .map_or(body, |(inner, _)| inner)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches() {
        assert_eq!(label_to_category("person"), BassSubject);
        assert_eq!(label_to_category("grass"), MidOrganic);
        assert_eq!(label_to_category("sky"), HighSky);
        assert_eq!(label_to_category("road"), BeatGround);
        assert_eq!(label_to_category("building"), MidStructure);
        assert_eq!(label_to_category("wall"), LowAmbient);
    }

    #[test]
    fn case_and_whitespace_are_ignored() {
        assert_eq!(label_to_category("  Sky "), HighSky);
        assert_eq!(label_to_category("TREE"), MidOrganic);
    }

    #[test]
    fn substring_in_either_direction() {
        // label contains a key
        assert_eq!(label_to_category("palm tree"), MidOrganic);
        assert_eq!(label_to_category("tree trunk"), MidOrganic);
        // key contains the label
        assert_eq!(label_to_category("giraf"), BassSubject);
        assert_eq!(label_to_category("swimming pool"), BeatGround);
        assert_eq!(label_to_category("pool table"), BeatGround);
    }

    #[test]
    fn first_matching_key_wins() {
        // "sky" is listed before "skyscraper"
        assert_eq!(label_to_category("skyscrap"), HighSky);
        assert_eq!(label_to_category("skyscraper"), MidStructure);
    }

    #[test]
    fn empty_and_unknown_are_ambient() {
        assert_eq!(label_to_category(""), LowAmbient);
        assert_eq!(label_to_category("   "), LowAmbient);
        assert_eq!(label_to_category("xyzzy"), LowAmbient);
    }

    #[test]
    fn static_keywords_cover_every_category() {
        let keywords = static_keywords();
        assert_eq!(keywords.len(), Category::COUNT);
        assert_eq!(keywords[&BassSubject][0], "person");
        assert_eq!(keywords[&HighSky].len(), 9);
        assert!(keywords[&BeatGround].contains(&"swimming pool".to_string()));
    }

    #[test]
    fn parses_fenced_hints() {
        let text = "```json\n{\"0\": [\"fox\", \"owl\"], \"3\": [\"river\"], \"4\": []}\n```";
        let keywords = parse_category_keywords(text).unwrap();
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[&BassSubject], vec!["fox", "owl"]);
        assert_eq!(keywords[&BeatGround], vec!["river"]);
    }

    #[test]
    fn out_of_range_ids_and_non_lists_are_skipped() {
        let keywords =
            parse_category_keywords(r#"{"7": ["x"], "2": "sun", "1": ["fern", 3]}"#).unwrap();
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[&MidOrganic], vec!["fern", "3"]);
    }

    #[test]
    fn malformed_hints_are_errors() {
        assert!(matches!(
            parse_category_keywords("not json"),
            Err(KeywordError::Json(_))
        ));
        assert!(matches!(
            parse_category_keywords("[1, 2]"),
            Err(KeywordError::NotAnObject)
        ));
        assert!(matches!(
            parse_category_keywords(r#"{"sky": ["sun"]}"#),
            Err(KeywordError::InvalidCategory(_))
        ));
    }
}
