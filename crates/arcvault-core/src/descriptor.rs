//! Strategy metadata as served by `GET /api/strategies`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static description of one clinical workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyDescriptor {
    /// Unique identifier, also the path segment of `/api/run/:id`.
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub content: Vec<ContentBlock>,

    #[serde(default)]
    pub inputs: Vec<InputField>,

    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

impl StrategyDescriptor {
    /// Title used in the navigation list, without a leading icon token.
    pub fn nav_title(&self) -> &str {
        match self.title.split_once(char::is_whitespace) {
            Some((first, rest)) if !first.chars().any(char::is_alphanumeric) => rest.trim_start(),
            _ => &self.title,
        }
    }

    /// Actions rendered as buttons. Hidden actions stay invocable by handlers.
    pub fn visible_actions(&self) -> impl Iterator<Item = &ActionSpec> {
        self.actions.iter().filter(|a| a.visible)
    }
}

/// A static block shown above the inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
        #[serde(default)]
        style: Option<String>,
    },
    Table {
        #[serde(default)]
        headers: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<Value>>,
    },
    Chart {
        #[serde(default)]
        chart_type: Option<String>,
        #[serde(default)]
        label: String,
        #[serde(default)]
        data: Vec<ChartPoint>,
        #[serde(default)]
        color: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

/// A free-text input whose value is sent with every action of the strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputField {
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(rename = "type", default = "default_input_type")]
    pub kind: String,

    #[serde(default)]
    pub placeholder: Option<String>,
}

fn default_input_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionSpec {
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

/// Render a table cell the way the backend meant it to be read.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_monitoring_descriptor() {
        let raw = json!({
            "id": "monitoring",
            "title": "📉 Continuous Monitoring",
            "description": "Patient Vitals & Recovery",
            "content": [
                {"type": "chart", "chart_type": "line", "label": "Recovery Trajectory",
                 "data": [{"x": 1, "y": 80}, {"x": 2, "y": 70}], "color": "#64FFDA"},
                {"type": "text", "text": "Recovery Trajectory: On Track", "style": "success"}
            ]
        });
        let d: StrategyDescriptor = serde_json::from_value(raw).unwrap();
        assert_eq!(d.content.len(), 2);
        assert!(d.inputs.is_empty());
        assert!(d.actions.is_empty());
        match &d.content[0] {
            ContentBlock::Chart { data, .. } => assert_eq!(data[1], ChartPoint { x: 2.0, y: 70.0 }),
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn unknown_block_type_is_tolerated() {
        let block: ContentBlock = serde_json::from_value(json!({"type": "video", "src": "x"})).unwrap();
        assert_eq!(block, ContentBlock::Unsupported);
    }

    #[test]
    fn actions_default_to_visible() {
        let d: StrategyDescriptor = serde_json::from_value(json!({
            "id": "intake",
            "title": "Intake",
            "actions": [
                {"name": "generate_soap", "label": "Generate SOAP Note"},
                {"name": "start_intake", "label": "Start", "visible": false}
            ]
        }))
        .unwrap();
        let names: Vec<_> = d.visible_actions().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["generate_soap"]);
        assert_eq!(d.actions.len(), 2);
    }

    #[test]
    fn nav_title_strips_icon_only() {
        let mut d: StrategyDescriptor =
            serde_json::from_value(json!({"id": "a", "title": "🏠 Home Self-Triage"})).unwrap();
        assert_eq!(d.nav_title(), "Home Self-Triage");
        d.title = "Recovery Monitor".to_string();
        assert_eq!(d.nav_title(), "Recovery Monitor");
        d.title = "Single".to_string();
        assert_eq!(d.nav_title(), "Single");
    }

    #[test]
    fn input_type_is_renamed() {
        let f: InputField = serde_json::from_value(json!({
            "name": "description", "label": "Describe symptoms", "type": "text",
            "placeholder": "Describe symptoms..."
        }))
        .unwrap();
        assert_eq!(f.kind, "text");
        assert_eq!(f.placeholder.as_deref(), Some("Describe symptoms..."));
    }

    #[test]
    fn cell_text_formats_scalars() {
        assert_eq!(cell_text(&json!("No")), "No");
        assert_eq!(cell_text(&json!(12)), "12");
        assert_eq!(cell_text(&Value::Null), "");
    }
}
