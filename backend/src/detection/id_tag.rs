use shared::DetectedLabel;

use super::lookup::HorseIdCodeMap;
use super::models::DetectedTextToken;

pub const ID_TAG_CONFIDENCE: f64 = 100.0;

/// Boosts a horse to full confidence when its ID code was read in the image.
///
/// Only the first label carrying the horse's name is boosted. A horse that is
/// not already among `labels` is never added. Returns the number of tokens
/// that matched a known code.
pub fn apply_id_tag_override(
    labels: &mut [DetectedLabel],
    tokens: &[DetectedTextToken],
    horse_ids: &HorseIdCodeMap,
) -> usize {
    let mut matched = 0;

    for token in tokens {
        let Some(horse_name) = horse_ids.horse_for(&token.text) else {
            continue;
        };
        matched += 1;

        match labels.iter_mut().find(|label| label.name == horse_name) {
            Some(label) => {
                log::info!(
                    "ID tag '{}' matched {}, confidence {:.2} -> {}",
                    token.text.trim(),
                    horse_name,
                    label.confidence,
                    ID_TAG_CONFIDENCE
                );
                label.confidence = ID_TAG_CONFIDENCE;
            }
            None => {
                log::info!(
                    "ID tag '{}' matched {}, but the detector did not report that horse",
                    token.text.trim(),
                    horse_name
                );
            }
        }
    }

    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::BoundingBox;
    use std::collections::HashMap;

    fn horse_ids() -> HorseIdCodeMap {
        HorseIdCodeMap::new(HashMap::from([
            ("K131".to_string(), "Prestige Good".to_string()),
            ("H344".to_string(), "Ping Hai Comet".to_string()),
            ("J375".to_string(), "Vigor Elleegant".to_string()),
        ]))
    }

    fn token(text: &str) -> DetectedTextToken {
        DetectedTextToken {
            text: text.to_string(),
            confidence: 99.0,
        }
    }

    fn label(name: &str, confidence: f64) -> DetectedLabel {
        DetectedLabel {
            name: name.to_string(),
            confidence,
            bounding_box: Some(BoundingBox {
                left: 0.1,
                top: 0.05,
                width: 0.2,
                height: 0.2,
            }),
        }
    }

    #[test]
    fn matching_tag_sets_full_confidence() {
        let mut labels = vec![label("Prestige Good", 50.0)];
        let original_box = labels[0].bounding_box;

        let matched = apply_id_tag_override(&mut labels, &[token(" k131 ")], &horse_ids());

        assert_eq!(matched, 1);
        assert_eq!(labels[0].confidence, 100.0);
        assert_eq!(labels[0].bounding_box, original_box);
    }

    #[test]
    fn override_ignores_prior_confidence() {
        for prior in [4.0, 99.9, 100.0] {
            let mut labels = vec![label("Vigor Elleegant", prior)];
            apply_id_tag_override(&mut labels, &[token("J375")], &horse_ids());
            assert_eq!(labels[0].confidence, 100.0);
        }
    }

    #[test]
    fn undetected_horse_is_not_injected() {
        let mut labels = vec![label("Prestige Good", 30.0)];

        let matched = apply_id_tag_override(&mut labels, &[token("H344")], &horse_ids());

        assert_eq!(matched, 1);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Prestige Good");
        assert_eq!(labels[0].confidence, 30.0);
    }

    #[test]
    fn unknown_and_empty_tokens_are_ignored() {
        let mut labels = vec![label("Prestige Good", 30.0), label("Ping Hai Comet", 20.0)];

        let matched = apply_id_tag_override(
            &mut labels,
            &[token(""), token("   "), token("K13"), token("HORSE"), token("K 131")],
            &horse_ids(),
        );

        assert_eq!(matched, 0);
        assert_eq!(labels[0].confidence, 30.0);
        assert_eq!(labels[1].confidence, 20.0);
    }

    #[test]
    fn only_first_entry_for_a_horse_is_boosted() {
        let mut labels = vec![
            label("Ping Hai Comet", 10.0),
            label("Prestige Good", 60.0),
            label("Prestige Good", 40.0),
        ];

        apply_id_tag_override(&mut labels, &[token("k131"), token("K131")], &horse_ids());

        assert_eq!(labels[0].confidence, 10.0);
        assert_eq!(labels[1].confidence, 100.0);
        assert_eq!(labels[2].confidence, 40.0);
    }

    #[test]
    fn several_horses_can_be_boosted() {
        let mut labels = vec![label("Ping Hai Comet", 10.0), label("Prestige Good", 60.0)];

        apply_id_tag_override(&mut labels, &[token("h344"), token("K131")], &horse_ids());

        assert!(labels.iter().all(|l| l.confidence == 100.0));
    }
}
