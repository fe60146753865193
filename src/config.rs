use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const PANEL_TYPE_TABLE: &str = "table";
const PANEL_TYPE_ITEM: &str = "item";
const PANEL_TYPE_LOGS: &str = "logs";

/// A fully parsed dashboard definition: an ordered list of panels.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub panels: Vec<PanelDef>,
}

/// Closed set of panel kinds. The raw document carries a `type` discriminator
/// and a type-specific payload which is re-parsed per variant.
#[derive(Debug, Clone)]
pub enum PanelDef {
    Table(TableDef),
    Item(ItemDef),
    Logs(LogsDef),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub label_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    /// Zero renders as a flex column with a default width.
    #[serde(default)]
    pub width: u16,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObjectKey {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn display(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDef {
    pub name: String,
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
    pub key: ObjectKey,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsDef {
    pub name: String,
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
    pub key: ObjectKey,
    #[serde(default)]
    pub container: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDashboard {
    #[serde(default)]
    panels: Vec<Value>,
}

/// Loads a dashboard definition from a local path or an HTTP(S) URL.
/// `.yaml`/`.yml` extensions select YAML parsing, anything else JSON.
pub async fn load_dashboard(source: &str) -> Result<Dashboard> {
    let raw = if source.starts_with("http://") || source.starts_with("https://") {
        let response = reqwest::get(source)
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("fetching remote dashboard {source}"))?;
        response
            .text()
            .await
            .with_context(|| format!("reading remote dashboard {source}"))?
    } else {
        fs::read_to_string(source).with_context(|| format!("reading dashboard file {source}"))?
    };

    parse_dashboard(&raw, has_yaml_extension(source))
}

fn has_yaml_extension(source: &str) -> bool {
    let trimmed = source.split(['?', '#']).next().unwrap_or(source);
    matches!(
        Path::new(trimmed).extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

pub fn parse_dashboard(raw: &str, yaml: bool) -> Result<Dashboard> {
    let document: RawDashboard = if yaml {
        serde_yaml::from_str(raw).context("parsing dashboard YAML")?
    } else {
        serde_json::from_str(raw).context("parsing dashboard JSON")?
    };

    let mut panels = Vec::new();
    for blob in document.panels {
        panels.push(parse_panel(blob)?);
    }
    Ok(Dashboard { panels })
}

/// Re-parses one panel document based on its `type` discriminator. The full
/// document doubles as the type-specific payload.
fn parse_panel(blob: Value) -> Result<PanelDef> {
    let name = blob
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();
    let Some(panel_type) = blob.get("type").and_then(Value::as_str).map(str::to_string) else {
        bail!("panel {name:?} is missing a type");
    };

    match panel_type.as_str() {
        PANEL_TYPE_TABLE => serde_json::from_value(blob)
            .map(PanelDef::Table)
            .with_context(|| format!("parsing table panel {name:?}")),
        PANEL_TYPE_ITEM => serde_json::from_value(blob)
            .map(PanelDef::Item)
            .with_context(|| format!("parsing item panel {name:?}")),
        PANEL_TYPE_LOGS => serde_json::from_value(blob)
            .map(PanelDef::Logs)
            .with_context(|| format!("parsing logs panel {name:?}")),
        unknown => bail!("panel {name:?} has unknown panel type: {unknown:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{PanelDef, parse_dashboard};

    const YAML: &str = r#"
panels:
  - name: deployments
    type: table
    group: apps
    version: v1
    kind: Deployment
    namespace: default
    labelSelector:
      app: skiff
    pageSize: 10
    columns:
      - header: Name
        width: 30
        path: metadata.name
      - header: Replicas
        path: spec.replicas
  - name: config
    type: item
    version: v1
    kind: ConfigMap
    key:
      namespace: default
      name: skiff-config
  - name: pod-logs
    type: logs
    version: v1
    kind: Pod
    key:
      namespace: default
      name: skiff-0
    container: server
"#;

    #[test]
    fn parses_yaml_dashboard() {
        let dashboard = parse_dashboard(YAML, true).expect("dashboard should parse");
        assert_eq!(dashboard.panels.len(), 3);

        let PanelDef::Table(table) = &dashboard.panels[0] else {
            panic!("first panel should be a table");
        };
        assert_eq!(table.kind, "Deployment");
        assert_eq!(table.page_size, 10);
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].width, 30);
        // missing width defaults to zero, rendered as a flex column
        assert_eq!(table.columns[1].width, 0);
        assert_eq!(
            table.label_selector.get("app").map(String::as_str),
            Some("skiff")
        );

        let PanelDef::Logs(logs) = &dashboard.panels[2] else {
            panic!("third panel should be logs");
        };
        assert_eq!(logs.key.display(), "default/skiff-0");
        assert_eq!(logs.container.as_deref(), Some("server"));
    }

    #[test]
    fn parses_json_dashboard() {
        let raw =
            r#"{"panels": [{"name": "nodes", "type": "table", "version": "v1", "kind": "Node"}]}"#;
        let dashboard = parse_dashboard(raw, false).expect("dashboard should parse");
        assert!(matches!(dashboard.panels[0], PanelDef::Table(_)));
    }

    #[test]
    fn rejects_unknown_panel_type() {
        let raw = r#"{"panels": [{"name": "weird", "type": "gauge"}]}"#;
        let error = parse_dashboard(raw, false).expect_err("unknown type should fail");
        assert!(format!("{error:#}").contains("unknown panel type"));
    }

    #[test]
    fn rejects_missing_panel_type() {
        let raw = r#"{"panels": [{"name": "weird"}]}"#;
        let error = parse_dashboard(raw, false).expect_err("missing type should fail");
        assert!(format!("{error:#}").contains("missing a type"));
    }
}
