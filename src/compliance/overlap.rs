use crate::detect::{BBox, Detection};

/// True when the label, lower-cased, contains any of the (lower-case) keywords.
pub fn label_matches(label: &str, keywords: &[String]) -> bool {
    let label = label.to_lowercase();
    keywords.iter().any(|k| label.contains(k.as_str()))
}

/// True when any keyword-matched detection has a positive-area overlap with
/// `region`. The first qualifying detection wins; confidence is not compared.
pub fn overlaps(region: &BBox, detections: &[Detection], keywords: &[String]) -> bool {
    detections
        .iter()
        .filter(|d| label_matches(&d.label, keywords))
        .any(|d| region.intersects(&d.bbox))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn matches_substring_case_insensitively() {
        let kw = keywords(&["helmet", "hat", "hardhat"]);
        assert!(label_matches("Hardhat", &kw));
        assert!(label_matches("safety_HELMET", &kw));
        assert!(!label_matches("person", &kw));
    }

    #[test]
    fn requires_both_label_and_overlap() {
        let region = BBox::new(0, 0, 100, 100);
        let kw = keywords(&["glove"]);
        let detections = vec![
            Detection::new("person", BBox::new(10, 10, 50, 50), 0.99),
            Detection::new("glove", BBox::new(200, 200, 250, 250), 0.9),
        ];
        assert!(!overlaps(&region, &detections, &kw));

        let detections = vec![Detection::new("Glove", BBox::new(90, 90, 150, 150), 0.1)];
        assert!(overlaps(&region, &detections, &kw));
    }

    #[test]
    fn touching_edges_are_not_overlap() {
        let region = BBox::new(0, 0, 10, 10);
        let kw = keywords(&["boot"]);
        let detections = vec![Detection::new("boot", BBox::new(10, 0, 20, 10), 0.9)];
        assert!(!overlaps(&region, &detections, &kw));
    }
}
