//! Ordered painting of candidate regions onto a category map.
//!
//! Every candidate carries a [`PaintKey`]. Candidates are stably sorted by key
//! and painted in ascending order, so on overlapping pixels the candidate with
//! the greatest key is painted last and wins.
use std::cmp::Ordering;

use scene_core::{Category, CategoryMap, Detection, Mask};

#[derive(Debug, Clone, Copy)]
pub enum PaintKey {
    /// Oracle confidence; the most confident region wins.
    Confidence(f32),
    /// Pixel area; smaller, more specific regions win over larger ones.
    Area(usize),
    /// Prompt position; lower category ids win, then later keywords.
    Prompt { category: Category, keyword: usize },
}

impl PaintKey {
    fn rank(&self) -> u8 {
        match self {
            PaintKey::Confidence(_) => 0,
            PaintKey::Area(_) => 1,
            PaintKey::Prompt { .. } => 2,
        }
    }
}

impl Ord for PaintKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PaintKey::Confidence(a), PaintKey::Confidence(b)) => a.total_cmp(b),
            (PaintKey::Area(a), PaintKey::Area(b)) => b.cmp(a),
            (
                PaintKey::Prompt {
                    category: ca,
                    keyword: ka,
                },
                PaintKey::Prompt {
                    category: cb,
                    keyword: kb,
                },
            ) => cb.cmp(ca).then(ka.cmp(kb)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for PaintKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PaintKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PaintKey {}

/// One candidate region, already resized to the map.
#[derive(Debug, Clone)]
pub struct Stroke {
    pub key: PaintKey,
    pub mask: Mask,
    pub category: Category,
    pub label: String,
    pub confidence: f32,
}

impl Stroke {
    fn detection(&self) -> Detection {
        Detection {
            label: self.label.clone(),
            category: self.category,
            confidence: self.confidence,
            coverage_pct: self.mask.coverage_pct(),
        }
    }
}

/// Paint `strokes` onto `map` in key order. Returns one detection per stroke,
/// in paint order.
pub fn paint_strokes(map: &mut CategoryMap, mut strokes: Vec<Stroke>) -> Vec<Detection> {
    strokes.sort_by(|a, b| a.key.cmp(&b.key));
    strokes
        .iter()
        .map(|stroke| {
            let painted = map.paint(&stroke.mask, stroke.category);
            log::debug!(
                "painted {} px of `{}` as {}",
                painted,
                stroke.label,
                stroke.category
            );
            stroke.detection()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(key: PaintKey, category: Category, label: &str) -> Stroke {
        Stroke {
            key,
            mask: Mask::filled(2, 2, true),
            category,
            label: label.to_string(),
            confidence: 0.5,
        }
    }

    fn paint_all(strokes: Vec<Stroke>) -> (CategoryMap, Vec<Detection>) {
        let mut map = CategoryMap::new(2, 2);
        let detections = paint_strokes(&mut map, strokes);
        (map, detections)
    }

    #[test]
    fn highest_confidence_wins() {
        let (map, detections) = paint_all(vec![
            stroke(PaintKey::Confidence(0.9), Category::HighSky, "sky"),
            stroke(PaintKey::Confidence(0.4), Category::MidOrganic, "tree"),
        ]);
        assert_eq!(map.get(0, 0), Category::HighSky);
        let labels: Vec<_> = detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["tree", "sky"]);
    }

    #[test]
    fn equal_confidence_keeps_oracle_order() {
        let (map, _) = paint_all(vec![
            stroke(PaintKey::Confidence(0.5), Category::HighSky, "sky"),
            stroke(PaintKey::Confidence(0.5), Category::BeatGround, "road"),
        ]);
        assert_eq!(map.get(1, 1), Category::BeatGround);
    }

    #[test]
    fn smallest_area_wins() {
        let (map, _) = paint_all(vec![
            stroke(PaintKey::Area(10), Category::BassSubject, "small"),
            stroke(PaintKey::Area(400), Category::BeatGround, "large"),
        ]);
        assert_eq!(map.get(0, 1), Category::BassSubject);
    }

    #[test]
    fn subject_prompts_win_over_ambient() {
        let prompt = |category, keyword, label| {
            stroke(PaintKey::Prompt { category, keyword }, category, label)
        };
        let (map, detections) = paint_all(vec![
            prompt(Category::BassSubject, 0, "fox"),
            prompt(Category::LowAmbient, 0, "wall"),
            prompt(Category::BassSubject, 1, "owl"),
            prompt(Category::BeatGround, 0, "river"),
        ]);
        assert_eq!(map.get(0, 0), Category::BassSubject);
        let labels: Vec<_> = detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["wall", "river", "fox", "owl"]);
    }

    #[test]
    fn detections_report_coverage() {
        let mut half = stroke(PaintKey::Confidence(0.8), Category::HighSky, "sky");
        half.mask = Mask::from_vec(2, 2, vec![true, true, false, false]).unwrap();
        let (map, detections) = paint_all(vec![half]);
        assert_eq!(map.as_ids(), &[2, 2, 5, 5]);
        assert_eq!(detections[0].coverage_pct, 50.0);
    }
}
