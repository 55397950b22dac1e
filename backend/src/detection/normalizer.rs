use shared::{BoundingBox, DetectedLabel};

use super::lookup::ClassMap;
use super::models::{Annotation, ImageSize, NamedLabel, Prediction, RawDetections};

/// Converts raw backend output into client labels.
///
/// Named labels pass through untouched. Indexed annotations are filtered by
/// class map membership and by `min_confidence` (percent), named via the class
/// map, and have their pixel boxes divided by the image size of the
/// prediction they came from. Order is preserved.
pub fn normalize(
    raw: RawDetections,
    classes: &ClassMap,
    min_confidence: f64,
) -> Vec<DetectedLabel> {
    match raw {
        RawDetections::Named(labels) => labels.into_iter().map(from_named).collect(),
        RawDetections::Indexed(predictions) => predictions
            .iter()
            .flat_map(|prediction| from_prediction(prediction, classes, min_confidence))
            .collect(),
    }
}

fn from_named(label: NamedLabel) -> DetectedLabel {
    DetectedLabel {
        name: label.name,
        confidence: label.confidence,
        bounding_box: label.bounding_box,
    }
}

fn from_prediction(
    prediction: &Prediction,
    classes: &ClassMap,
    min_confidence: f64,
) -> Vec<DetectedLabel> {
    let image_size = match prediction.image_size {
        Some(size) if size.width > 0.0 && size.height > 0.0 => size,
        other => {
            if !prediction.annotations.is_empty() {
                log::warn!(
                    "Dropping {} annotation(s): unusable image size {:?}",
                    prediction.annotations.len(),
                    other
                );
            }
            return Vec::new();
        }
    };

    prediction
        .annotations
        .iter()
        .filter_map(|annotation| {
            from_annotation(annotation, image_size, classes, min_confidence)
        })
        .collect()
}

fn from_annotation(
    annotation: &Annotation,
    image_size: ImageSize,
    classes: &ClassMap,
    min_confidence: f64,
) -> Option<DetectedLabel> {
    let name = classes.name_of(annotation.class_id?)?;

    let confidence = annotation.score * 100.0;
    if confidence < min_confidence {
        return None;
    }

    Some(DetectedLabel {
        name: name.to_string(),
        confidence,
        bounding_box: Some(BoundingBox {
            left: annotation.left / image_size.width,
            top: annotation.top / image_size.height,
            width: annotation.width / image_size.width,
            height: annotation.height / image_size.height,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn classes() -> ClassMap {
        ClassMap::new(HashMap::from([
            (0, "Prestige Good".to_string()),
            (1, "Ping Hai Comet".to_string()),
            (2, "Vigor Elleegant".to_string()),
        ]))
    }

    fn annotation(
        class_id: u32,
        score: f64,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) -> Annotation {
        Annotation {
            class_id: Some(class_id),
            score,
            left,
            top,
            width,
            height,
        }
    }

    fn size(width: f64, height: f64) -> Option<ImageSize> {
        Some(ImageSize { width, height })
    }

    #[test]
    fn converts_pixels_to_fractions() {
        let raw = RawDetections::Indexed(vec![Prediction {
            annotations: vec![annotation(0, 0.5, 100.0, 100.0, 200.0, 400.0)],
            image_size: size(1000.0, 2000.0),
        }]);

        let labels = normalize(raw, &classes(), 4.0);
        assert_eq!(
            labels,
            vec![DetectedLabel {
                name: "Prestige Good".to_string(),
                confidence: 50.0,
                bounding_box: Some(BoundingBox {
                    left: 0.1,
                    top: 0.05,
                    width: 0.2,
                    height: 0.2,
                }),
            }]
        );
    }

    #[test]
    fn drops_unknown_classes() {
        let raw = RawDetections::Indexed(vec![Prediction {
            annotations: vec![
                annotation(7, 0.9, 0.0, 0.0, 10.0, 10.0),
                annotation(1, 0.9, 0.0, 0.0, 10.0, 10.0),
                Annotation {
                    class_id: None,
                    ..annotation(0, 0.9, 0.0, 0.0, 10.0, 10.0)
                },
            ],
            image_size: size(100.0, 100.0),
        }]);

        let labels = normalize(raw, &classes(), 4.0);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Ping Hai Comet");
    }

    #[test]
    fn drops_scores_below_threshold() {
        let raw = RawDetections::Indexed(vec![Prediction {
            annotations: vec![
                annotation(0, 0.03, 0.0, 0.0, 10.0, 10.0),
                annotation(1, 0.05, 0.0, 0.0, 10.0, 10.0),
                annotation(2, 0.0399, 0.0, 0.0, 10.0, 10.0),
            ],
            image_size: size(100.0, 100.0),
        }]);

        let labels = normalize(raw, &classes(), 4.0);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Ping Hai Comet");
        assert_eq!(labels[0].confidence, 5.0);
    }

    #[test]
    fn keeps_score_exactly_at_threshold() {
        let raw = RawDetections::Indexed(vec![Prediction {
            annotations: vec![annotation(2, 0.04, 0.0, 0.0, 10.0, 10.0)],
            image_size: size(100.0, 100.0),
        }]);

        let labels = normalize(raw, &classes(), 4.0);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Vigor Elleegant");
        assert_eq!(labels[0].confidence, 4.0);
    }

    #[test]
    fn keeps_backend_order() {
        let raw = RawDetections::Indexed(vec![Prediction {
            annotations: vec![
                annotation(2, 0.1, 0.0, 0.0, 10.0, 10.0),
                annotation(0, 0.9, 0.0, 0.0, 10.0, 10.0),
                annotation(1, 0.5, 0.0, 0.0, 10.0, 10.0),
            ],
            image_size: size(100.0, 100.0),
        }]);

        let names: Vec<String> = normalize(raw, &classes(), 4.0)
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Vigor Elleegant", "Prestige Good", "Ping Hai Comet"]);
    }

    #[test]
    fn each_prediction_uses_its_own_image_size() {
        let raw = RawDetections::Indexed(vec![
            Prediction {
                annotations: vec![annotation(0, 0.9, 50.0, 50.0, 50.0, 50.0)],
                image_size: size(100.0, 100.0),
            },
            Prediction {
                annotations: vec![annotation(1, 0.9, 50.0, 50.0, 50.0, 50.0)],
                image_size: size(200.0, 500.0),
            },
        ]);

        let labels = normalize(raw, &classes(), 4.0);
        assert_eq!(labels[0].bounding_box.unwrap().left, 0.5);
        assert_eq!(labels[1].bounding_box.unwrap().left, 0.25);
        assert_eq!(labels[1].bounding_box.unwrap().top, 0.1);
    }

    #[test]
    fn unusable_image_size_drops_annotations() {
        let raw = RawDetections::Indexed(vec![
            Prediction {
                annotations: vec![annotation(0, 0.9, 1.0, 1.0, 1.0, 1.0)],
                image_size: None,
            },
            Prediction {
                annotations: vec![annotation(1, 0.9, 1.0, 1.0, 1.0, 1.0)],
                image_size: size(0.0, 100.0),
            },
            Prediction {
                annotations: vec![annotation(2, 0.9, 1.0, 1.0, 1.0, 1.0)],
                image_size: size(10.0, 10.0),
            },
        ]);

        let labels = normalize(raw, &classes(), 4.0);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Vigor Elleegant");
    }

    #[test]
    fn named_labels_pass_through() {
        let named = vec![
            NamedLabel {
                name: "Ping Hai Comet".to_string(),
                confidence: 2.5,
                bounding_box: None,
            },
            NamedLabel {
                name: "Not In Any Map".to_string(),
                confidence: 81.0,
                bounding_box: Some(BoundingBox {
                    left: 0.3,
                    top: 0.4,
                    width: 0.1,
                    height: 0.2,
                }),
            },
        ];

        let labels = normalize(RawDetections::Named(named.clone()), &classes(), 4.0);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].confidence, 2.5);
        assert_eq!(labels[1].name, "Not In Any Map");
        assert_eq!(labels[1].bounding_box, named[1].bounding_box);
    }

    #[test]
    fn empty_input() {
        assert!(normalize(RawDetections::Indexed(Vec::new()), &classes(), 4.0).is_empty());
        assert!(normalize(RawDetections::Named(Vec::new()), &classes(), 4.0).is_empty());
    }
}
