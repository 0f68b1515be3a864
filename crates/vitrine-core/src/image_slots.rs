//! Image URL slots inside content documents.
//!
//! A slot is any string (or null) field whose name ends in `image_url` or
//! `image_<n>_url`, found anywhere in a document, including inside list items.
//! The population routines hand out URLs from an asset pool to those slots in
//! a stable order: documents by key, then fields depth-first in key order.
//! List items marked `"is_active": false` keep their slots out of
//! replace-all runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One image URL field of a content document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSlot {
    /// Content store key of the document holding the slot
    pub document: String,
    /// JSON pointer to the field within the document
    pub pointer: String,
    pub field: String,
    pub url: Option<String>,
    /// False inside a list item whose `is_active` is `false`
    pub active: bool,
}

impl ImageSlot {
    pub fn is_filled(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulateMode {
    /// Only slots without a URL receive one
    #[default]
    FillEmpty,
    /// Every slot receives a pool URL, overwriting existing ones
    ReplaceAll,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotChange {
    pub document: String,
    pub pointer: String,
    pub old_url: Option<String>,
    pub new_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotReport {
    pub total: usize,
    pub filled: usize,
    pub empty: usize,
    pub pool_size: usize,
    pub slots: Vec<ImageSlot>,
}

/// Whether a field name denotes an image URL slot.
pub fn is_image_url_field(name: &str) -> bool {
    let Some(stem) = name.strip_suffix("_url") else {
        return false;
    };
    let stem = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    let stem = if stem.len() < name.len() - "_url".len() {
        match stem.strip_suffix('_') {
            Some(s) => s,
            None => return false,
        }
    } else {
        stem
    };
    stem == "image" || stem.ends_with("_image")
}

/// All slots of one document in traversal order.
pub fn collect_slots(document: &str, value: &Value) -> Vec<ImageSlot> {
    let mut slots = Vec::new();
    walk(document, value, String::new(), true, &mut slots);
    slots
}

fn walk(
    document: &str,
    value: &Value,
    pointer: String,
    active: bool,
    slots: &mut Vec<ImageSlot>,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_pointer = format!("{}/{}", pointer, escape_pointer_token(key));
                if is_image_url_field(key) {
                    match child {
                        Value::String(s) => slots.push(ImageSlot {
                            document: document.to_string(),
                            pointer: child_pointer,
                            field: key.clone(),
                            url: Some(s.clone()),
                            active,
                        }),
                        Value::Null => slots.push(ImageSlot {
                            document: document.to_string(),
                            pointer: child_pointer,
                            field: key.clone(),
                            url: None,
                            active,
                        }),
                        _ => walk(document, child, child_pointer, active, slots),
                    }
                } else {
                    walk(document, child, child_pointer, active, slots);
                }
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let item_active = active && child.get("is_active") != Some(&Value::Bool(false));
                walk(document, child, format!("{}/{}", pointer, i), item_active, slots);
            }
        }
        _ => {}
    }
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Slots across every document, documents in key order.
pub fn collect_all_slots(documents: &BTreeMap<String, Value>) -> Vec<ImageSlot> {
    documents
        .iter()
        .flat_map(|(key, doc)| collect_slots(key, doc))
        .collect()
}

/// Assign pool URLs to slots, cycling through the pool sequentially.
///
/// With `dry_run` the documents are left untouched and the returned changes
/// describe what would have been written. An empty pool yields no changes.
pub fn populate(
    documents: &mut BTreeMap<String, Value>,
    pool: &[String],
    mode: PopulateMode,
    dry_run: bool,
) -> Vec<SlotChange> {
    if pool.is_empty() {
        tracing::warn!("No asset URLs available to populate image slots");
        return Vec::new();
    }

    let slots = collect_all_slots(documents);
    let mut changes = Vec::new();
    let mut next = 0usize;

    for slot in slots {
        let skip = match mode {
            PopulateMode::FillEmpty => slot.is_filled(),
            PopulateMode::ReplaceAll => !slot.active,
        };
        if skip {
            continue;
        }
        let url = pool[next % pool.len()].clone();
        next += 1;

        if !dry_run {
            if let Some(target) = documents
                .get_mut(&slot.document)
                .and_then(|doc| doc.pointer_mut(&slot.pointer))
            {
                *target = Value::String(url.clone());
            }
        }

        changes.push(SlotChange {
            document: slot.document,
            pointer: slot.pointer,
            old_url: slot.url.filter(|u| !u.trim().is_empty()),
            new_url: url,
        });
    }

    tracing::info!(
        mode = ?mode,
        dry_run = dry_run,
        changes = changes.len(),
        pool_size = pool.len(),
        "Image slots populated"
    );

    changes
}

pub fn report(documents: &BTreeMap<String, Value>, pool_size: usize) -> SlotReport {
    let slots = collect_all_slots(documents);
    let filled = slots.iter().filter(|s| s.is_filled()).count();
    SlotReport {
        total: slots.len(),
        filled,
        empty: slots.len() - filled,
        pool_size,
        slots,
    }
}

/// Body of `POST /dashboard/image-urls/populate`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PopulateRequest {
    #[serde(default)]
    pub mode: PopulateMode,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulateOutcome {
    pub mode: PopulateMode,
    pub dry_run: bool,
    pub pool_size: usize,
    pub changes_count: usize,
    pub changes: Vec<SlotChange>,
}

/// URLs available for image slots, in assignment order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrlPool {
    pub count: usize,
    pub urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn documents() -> BTreeMap<String, Value> {
        let mut docs = BTreeMap::new();
        docs.insert(
            "hero".to_string(),
            json!({"title": "Natural stone", "image_url": ""}),
        );
        docs.insert(
            "navigation".to_string(),
            json!({"logo_image_url": "https://cdn.example.com/logo.png", "links": []}),
        );
        docs.insert(
            "portfolio_page".to_string(),
            json!({
                "hero_image_1_url": null,
                "hero_image_2_url": "https://cdn.example.com/existing.jpg",
                "projects": [
                    {"title": "Kitchen", "image_url": null},
                    {"title": "Bath", "image_url": "  "}
                ]
            }),
        );
        docs
    }

    fn pool() -> Vec<String> {
        vec!["https://a/1.jpg".to_string(), "https://a/2.jpg".to_string()]
    }

    #[test]
    fn test_is_image_url_field() {
        assert!(is_image_url_field("image_url"));
        assert!(is_image_url_field("hero_image_url"));
        assert!(is_image_url_field("hero_background_image_url"));
        assert!(is_image_url_field("hero_image_3_url"));
        assert!(is_image_url_field("residential_featured_image_url"));
        assert!(!is_image_url_field("url"));
        assert!(!is_image_url_field("video_url"));
        assert!(!is_image_url_field("imageurl"));
        assert!(!is_image_url_field("hero_image3_url"));
        assert!(!is_image_url_field("backimage_url"));
    }

    #[test]
    fn test_collect_slots_walks_lists() {
        let docs = documents();
        let slots = collect_all_slots(&docs);
        let pointers: Vec<_> = slots
            .iter()
            .map(|s| format!("{}{}", s.document, s.pointer))
            .collect();
        assert_eq!(
            pointers,
            vec![
                "hero/image_url",
                "navigation/logo_image_url",
                "portfolio_page/hero_image_1_url",
                "portfolio_page/hero_image_2_url",
                "portfolio_page/projects/0/image_url",
                "portfolio_page/projects/1/image_url",
            ]
        );
    }

    #[test]
    fn test_populate_fills_only_empty_slots_cycling_pool() {
        let mut docs = documents();
        let changes = populate(&mut docs, &pool(), PopulateMode::FillEmpty, false);

        assert_eq!(changes.len(), 4);
        assert_eq!(docs["hero"]["image_url"], "https://a/1.jpg");
        assert_eq!(docs["portfolio_page"]["hero_image_1_url"], "https://a/2.jpg");
        assert_eq!(docs["portfolio_page"]["projects"][0]["image_url"], "https://a/1.jpg");
        assert_eq!(docs["portfolio_page"]["projects"][1]["image_url"], "https://a/2.jpg");
        assert_eq!(
            docs["navigation"]["logo_image_url"],
            "https://cdn.example.com/logo.png"
        );
        assert!(changes.iter().all(|c| c.old_url.is_none()));
    }

    #[test]
    fn test_replace_all_overwrites_everything() {
        let mut docs = documents();
        let changes = populate(&mut docs, &pool(), PopulateMode::ReplaceAll, false);

        assert_eq!(changes.len(), 6);
        assert_eq!(
            changes[1].old_url.as_deref(),
            Some("https://cdn.example.com/logo.png")
        );
        assert_eq!(docs["navigation"]["logo_image_url"], "https://a/2.jpg");
        assert_eq!(report(&docs, 2).empty, 0);
    }

    #[test]
    fn test_replace_all_skips_inactive_list_items() {
        let mut docs = BTreeMap::from([(
            "portfolio".to_string(),
            json!({
                "projects": [
                    {"title": "Kitchen", "is_active": true, "image_url": "https://old/k.jpg"},
                    {"title": "Archived", "is_active": false, "image_url": "https://old/a.jpg",
                     "gallery": [{"image_url": "https://old/g.jpg"}]},
                    {"title": "Bath", "image_url": "https://old/b.jpg"}
                ]
            }),
        )]);

        let slots = collect_all_slots(&docs);
        assert_eq!(
            slots.iter().map(|s| s.active).collect::<Vec<_>>(),
            vec![true, false, false, true]
        );

        let changes = populate(&mut docs, &pool(), PopulateMode::ReplaceAll, false);
        assert_eq!(changes.len(), 2);
        let projects = &docs["portfolio"]["projects"];
        assert_eq!(projects[0]["image_url"], "https://a/1.jpg");
        assert_eq!(projects[1]["image_url"], "https://old/a.jpg");
        assert_eq!(projects[1]["gallery"][0]["image_url"], "https://old/g.jpg");
        assert_eq!(projects[2]["image_url"], "https://a/2.jpg");
    }

    #[test]
    fn test_dry_run_leaves_documents_untouched() {
        let mut docs = documents();
        let before = docs.clone();
        let changes = populate(&mut docs, &pool(), PopulateMode::ReplaceAll, true);
        assert_eq!(changes.len(), 6);
        assert_eq!(docs, before);
    }

    #[test]
    fn test_empty_pool_changes_nothing() {
        let mut docs = documents();
        let changes = populate(&mut docs, &[], PopulateMode::FillEmpty, false);
        assert!(changes.is_empty());
        assert_eq!(docs, documents());
    }

    #[test]
    fn test_report_counts() {
        let r = report(&documents(), 2);
        assert_eq!(r.total, 6);
        assert_eq!(r.filled, 2);
        assert_eq!(r.empty, 4);
        assert_eq!(r.pool_size, 2);
    }

    #[test]
    fn test_pointer_escaping() {
        let doc = json!({"a/b": {"image_url": null}});
        let slots = collect_slots("doc", &doc);
        assert_eq!(slots[0].pointer, "/a~1b/image_url");
        let mut docs = BTreeMap::from([("doc".to_string(), doc)]);
        populate(&mut docs, &pool(), PopulateMode::FillEmpty, false);
        assert_eq!(docs["doc"]["a/b"]["image_url"], "https://a/1.jpg");
    }
}
