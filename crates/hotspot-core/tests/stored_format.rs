#![forbid(unsafe_code)]

//! Loading documents in the stored JSON shape.

use hotspot_core::{Document, Point};

const STORED: &str = r##"{
  "video": { "src": "intro.mp4", "duration": 12.5 },
  "hotspots": [
    {
      "target": "shoe",
      "selector": "#shoe",
      "cta": { "caption": "Buy", "value": "https://shop.example/shoe" },
      "data": { "sku": 42 },
      "timeline": {
        "points": [
          { "t": 0.0, "p": { "x": 0.1, "y": 0.1 }, "cta": { "x": 0.2, "y": 0.8 } },
          { "t": 2.0, "p": { "x": 0.5, "y": 0.5 }, "e": true },
          { "t": 4.0, "p": { "x": 0.9, "y": 0.9 }, "cta": { "x": 0.8, "y": 0.2 }, "e": false }
        ]
      }
    },
    { "target": "hat", "selector": ".hat" }
  ]
}"##;

#[test]
fn stored_document_loads_and_answers_queries() {
    let doc = Document::from_json_str(STORED).unwrap();
    assert_eq!(doc.len(), 2);
    assert_eq!(doc.video["src"], "intro.mp4");

    let ids: Vec<_> = doc.iter().map(|h| h.id()).collect();
    assert!(ids.iter().all(|id| id.is_assigned()));
    assert_ne!(ids[0], ids[1]);

    let shoe = doc.get(ids[0]).unwrap();
    assert_eq!(shoe.data.as_ref().unwrap()["sku"], 42);
    let tl = &shoe.timeline;
    assert_eq!(tl.len(), 3);
    assert!(tl.points()[1].e);
    assert!(!tl.points()[2].e);
    assert_eq!(tl.position(1.0), Some(Point::new(0.3, 0.3)));
    assert_eq!(tl.position(3.0), None);
    assert_eq!(tl.cta_position(3.0), Point::new(0.2, 0.8));
    assert_eq!(tl.cta_position(4.5), Point::new(0.8, 0.2));

    let hat = doc.get(ids[1]).unwrap();
    assert!(hat.timeline.is_empty());
    assert!(hat.cta.is_none());
}

#[test]
fn false_end_flags_are_not_written_back() {
    let doc = Document::from_json_str(STORED).unwrap();
    let json = doc.to_json_string().unwrap();
    assert!(!json.contains("\"e\":false"));
    assert!(!json.contains("\"id\""));
    assert_eq!(Document::from_json_str(&json).unwrap(), doc);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(Document::from_json_str("{\"hotspots\": 3}").is_err());
}
