//! UI hierarchy snapshots from `uiautomator dump`

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{HarnessError, Result};
use crate::locator::{Locator, Strategy};
use crate::wait::NodeState;

lazy_static! {
    static ref NODE_RE: Regex = Regex::new(r"<node\b[^>]*>").unwrap();
    static ref ATTR_RE: Regex = Regex::new(r#"([a-zA-Z-]+)="([^"]*)""#).unwrap();
    static ref BOUNDS_RE: Regex =
        Regex::new(r"^\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]$").unwrap();
}

/// Pixel rectangle of a node, as reported by the dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    /// A degenerate rectangle means the node is laid out but not rendered
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    fn parse(raw: &str) -> Result<Self> {
        let caps = BOUNDS_RE
            .captures(raw)
            .ok_or_else(|| HarnessError::ParseError(format!("bad bounds attribute: {:?}", raw)))?;
        // The regex only matches integer captures, so parse cannot fail
        let coord = |i: usize| caps[i].parse::<i32>().unwrap_or(0);
        Ok(Self {
            left: coord(1),
            top: coord(2),
            right: coord(3),
            bottom: coord(4),
        })
    }
}

/// A single node extracted from the dump
#[derive(Debug, Clone)]
pub struct UiNode {
    pub text: String,
    pub resource_id: String,
    pub bounds: Bounds,
}

/// Parsed snapshot of the UI tree at one point in time.
///
/// A snapshot is never reused across polls; visibility answers always come
/// from a freshly captured dump.
#[derive(Debug, Clone, Default)]
pub struct UiSnapshot {
    nodes: Vec<UiNode>,
}

impl UiSnapshot {
    /// Parse the XML produced by `uiautomator dump`
    pub fn parse(xml: &str) -> Result<Self> {
        let mut nodes = Vec::new();
        for node in NODE_RE.find_iter(xml) {
            let mut text = String::new();
            let mut resource_id = String::new();
            let mut bounds = None;
            for attr in ATTR_RE.captures_iter(node.as_str()) {
                match &attr[1] {
                    "text" => text = unescape(&attr[2]),
                    "resource-id" => resource_id = attr[2].to_string(),
                    "bounds" => bounds = Some(Bounds::parse(&attr[2])?),
                    _ => {}
                }
            }
            // uiautomator emits bounds on every node; entries without them
            // are container markup we cannot reason about
            if let Some(bounds) = bounds {
                nodes.push(UiNode {
                    text,
                    resource_id,
                    bounds,
                });
            }
        }
        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the first node matching the locator
    pub fn find(&self, locator: &Locator) -> Option<&UiNode> {
        self.nodes.iter().find(|node| match locator.strategy() {
            Strategy::Text(text) => node.text == *text,
            Strategy::ResourceId(id) => node.resource_id == *id,
        })
    }

    /// Point-in-time visibility of the locator's target
    pub fn node_state(&self, locator: &Locator) -> NodeState {
        match self.find(locator) {
            None => NodeState::Missing,
            Some(node) if node.bounds.is_empty() => NodeState::Hidden,
            Some(_) => NodeState::Visible,
        }
    }
}

/// Undo the XML attribute escaping applied by the dump
fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DUMP: &str = concat!(
        r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?><hierarchy rotation="0">"#,
        r#"<node index="0" text="" resource-id="" class="android.widget.FrameLayout" package="dev.pytorch.playground" bounds="[0,0][1080,2400]">"#,
        r#"<node index="0" text="Playground" resource-id="dev.pytorch.playground:id/title" class="android.widget.TextView" package="dev.pytorch.playground" bounds="[42,156][1038,243]"/>"#,
        r#"<node index="1" text="Astro Bird" resource-id="" class="android.widget.TextView" package="dev.pytorch.playground" bounds="[42,300][500,360]"/>"#,
        r#"<node index="2" text="Hidden &amp; Offscreen" resource-id="" class="android.widget.TextView" package="dev.pytorch.playground" bounds="[0,0][0,0]"/>"#,
        r#"</node></hierarchy>"#,
    );

    #[test]
    fn test_parse_extracts_all_nodes() {
        let snapshot = UiSnapshot::parse(SAMPLE_DUMP).unwrap();
        assert_eq!(snapshot.len(), 4);
    }

    #[test]
    fn test_find_by_exact_text() {
        let snapshot = UiSnapshot::parse(SAMPLE_DUMP).unwrap();
        let node = snapshot.find(&Locator::text("Playground")).unwrap();
        assert_eq!(node.resource_id, "dev.pytorch.playground:id/title");
        assert_eq!(node.bounds.width(), 996);

        // Substrings must not match
        assert!(snapshot.find(&Locator::text("Play")).is_none());
    }

    #[test]
    fn test_find_by_resource_id() {
        let snapshot = UiSnapshot::parse(SAMPLE_DUMP).unwrap();
        let node = snapshot
            .find(&Locator::resource_id("dev.pytorch.playground:id/title"))
            .unwrap();
        assert_eq!(node.text, "Playground");
    }

    #[test]
    fn test_node_state_classification() {
        let snapshot = UiSnapshot::parse(SAMPLE_DUMP).unwrap();
        assert_eq!(
            snapshot.node_state(&Locator::text("Astro Bird")),
            NodeState::Visible
        );
        assert_eq!(
            snapshot.node_state(&Locator::text("Hidden & Offscreen")),
            NodeState::Hidden
        );
        assert_eq!(
            snapshot.node_state(&Locator::text("NonexistentLabel")),
            NodeState::Missing
        );
    }

    #[test]
    fn test_entities_are_unescaped() {
        let snapshot = UiSnapshot::parse(SAMPLE_DUMP).unwrap();
        assert!(snapshot.find(&Locator::text("Hidden & Offscreen")).is_some());
    }

    #[test]
    fn test_empty_bounds_helpers() {
        let bounds = Bounds {
            left: 10,
            top: 20,
            right: 10,
            bottom: 80,
        };
        assert_eq!(bounds.width(), 0);
        assert_eq!(bounds.height(), 60);
        assert!(bounds.is_empty());
    }

    #[test]
    fn test_malformed_bounds_is_a_parse_error() {
        let xml = r#"<node text="x" bounds="[1,2][three,4]"/>"#;
        let result = UiSnapshot::parse(xml);
        assert!(matches!(result, Err(HarnessError::ParseError(_))));
    }

    #[test]
    fn test_empty_dump_yields_empty_snapshot() {
        let snapshot = UiSnapshot::parse("<hierarchy rotation=\"0\"></hierarchy>").unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(
            snapshot.node_state(&Locator::text("anything")),
            NodeState::Missing
        );
    }
}
