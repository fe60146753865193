use crate::config::{ItemDef, LogsDef, TableDef};
use crate::item::ItemWriter;
use crate::k8s::{self, KindBinding, KubeGateway};
use crate::logs::LogsWriter;
use crate::table::TableWriter;
use futures::io::AsyncBufReadExt;
use futures::{StreamExt, TryStreamExt};
use kube::ResourceExt;
use kube::core::DynamicObject;
use kube::runtime::watcher::{Config as WatchConfig, Event, watcher};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

const RETRY_DELAY: Duration = Duration::from_millis(900);

/// Per-event bookkeeping for one watch stream. The `resync` set collects uids
/// seen during a relist so rows deleted while the stream was down can be
/// dropped when the relist completes.
#[derive(Default)]
struct TableResync {
    uids: Option<Vec<String>>,
}

fn apply_table_event(writer: &TableWriter, resync: &mut TableResync, event: Event<DynamicObject>) {
    match event {
        Event::Init => {
            resync.uids = Some(Vec::new());
        }
        Event::InitApply(object) => {
            if let (Some(uids), Some(uid)) = (resync.uids.as_mut(), object.uid()) {
                uids.push(uid);
            }
            writer.add_or_update(&object);
        }
        Event::InitDone => {
            if let Some(uids) = resync.uids.take() {
                writer.retain_uids(&uids);
            }
        }
        Event::Apply(object) => writer.add_or_update(&object),
        Event::Delete(object) => {
            if let Some(uid) = object.uid() {
                writer.delete_row(&uid);
            } else {
                warn!("dropping delete without metadata.uid for {}", object.name_any());
            }
        }
    }
}

fn table_watch_config(def: &TableDef) -> WatchConfig {
    let config = WatchConfig::default();
    if def.label_selector.is_empty() {
        config
    } else {
        config.labels(&k8s::label_selector_string(&def.label_selector))
    }
}

pub fn spawn_table_router(
    gateway: KubeGateway,
    binding: KindBinding,
    def: TableDef,
    writer: TableWriter,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let api = gateway.api_for(&binding, &def.namespace);
            let mut events = watcher(api, table_watch_config(&def)).boxed();
            let mut resync = TableResync::default();
            loop {
                match events.try_next().await {
                    Ok(Some(event)) => apply_table_event(&writer, &mut resync, event),
                    Ok(None) => break,
                    Err(error) => {
                        warn!("watch stream error for table {}: {error}", def.name);
                        writer.set_error(format!("watch error: {error}"));
                        break;
                    }
                }
            }
            tokio::time::sleep(RETRY_DELAY).await;
        }
    })
}

/// Relist bookkeeping for one item watch. A relist that delivers no
/// `InitApply` means the tracked object was deleted while the stream was
/// down, so the panel content has to be cleared when the relist completes.
#[derive(Default)]
struct ItemResync {
    applied: Option<bool>,
}

fn apply_item_event(writer: &ItemWriter, resync: &mut ItemResync, event: Event<DynamicObject>) {
    match event {
        Event::Init => {
            resync.applied = Some(false);
        }
        Event::InitApply(object) => {
            if let Some(applied) = resync.applied.as_mut() {
                *applied = true;
            }
            write_item_yaml(writer, &object);
        }
        Event::InitDone => {
            if resync.applied.take() == Some(false) {
                writer.set_content(String::new());
            }
        }
        Event::Apply(object) => write_item_yaml(writer, &object),
        // the tracked object is gone; show an empty panel until it returns
        Event::Delete(_) => writer.set_content(String::new()),
    }
}

fn write_item_yaml(writer: &ItemWriter, object: &DynamicObject) {
    match k8s::to_yaml(object) {
        Ok(content) => writer.set_content(content),
        Err(error) => {
            warn!("{error:#}");
            writer.set_error(error.to_string());
        }
    }
}

pub fn spawn_item_router(
    gateway: KubeGateway,
    binding: KindBinding,
    def: ItemDef,
    writer: ItemWriter,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let config = WatchConfig::default().fields(&format!("metadata.name={}", def.key.name));
        loop {
            let api = gateway.api_for(&binding, &def.key.namespace);
            let mut events = watcher(api, config.clone()).boxed();
            let mut resync = ItemResync::default();
            loop {
                match events.try_next().await {
                    Ok(Some(event)) => apply_item_event(&writer, &mut resync, event),
                    Ok(None) => break,
                    Err(error) => {
                        warn!("watch stream error for item {}: {error}", def.name);
                        writer.set_error(format!("watch error: {error}"));
                        break;
                    }
                }
            }
            tokio::time::sleep(RETRY_DELAY).await;
        }
    })
}

/// Resolves the target pod and copies its log lines into the panel buffer.
/// Runs once per panel; a failed resolution or a closed stream surfaces as a
/// panel error rather than tearing the dashboard down.
pub fn spawn_logs_router(
    gateway: KubeGateway,
    binding: KindBinding,
    def: LogsDef,
    writer: LogsWriter,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (namespace, pod_name) = match gateway.resolve_log_pod(&binding, &def).await {
            Ok(target) => target,
            Err(error) => {
                warn!("resolving log target for {}: {error:#}", def.name);
                writer.set_error(format!("{error:#}"));
                return;
            }
        };

        let reader = match gateway
            .stream_pod_logs(&namespace, &pod_name, def.container.as_deref())
            .await
        {
            Ok(reader) => reader,
            Err(error) => {
                warn!("opening log stream for {}: {error:#}", def.name);
                writer.set_error(format!("{error:#}"));
                return;
            }
        };

        let mut lines = reader.lines();
        loop {
            match lines.try_next().await {
                Ok(Some(line)) => writer.add_content(&line),
                Ok(None) => break,
                Err(error) => {
                    warn!("log stream error for {}: {error}", def.name);
                    writer.set_error(format!("log stream error: {error}"));
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{ItemResync, TableResync, apply_item_event, apply_table_event, table_watch_config};
    use crate::config::{ColumnDef, ItemDef, ObjectKey, TableDef};
    use crate::item::ItemPanel;
    use crate::table::TablePanel;
    use kube::core::DynamicObject;
    use kube::runtime::watcher::Event;
    use serde_json::json;

    fn object(name: &str, uid: &str) -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"namespace": "ns", "name": name, "uid": uid},
            "status": {"phase": "Running"}
        }))
        .expect("test object should deserialize")
    }

    fn table_def(labels: &[(&str, &str)]) -> TableDef {
        TableDef {
            name: "pods".to_string(),
            group: String::new(),
            version: "v1".to_string(),
            kind: "Pod".to_string(),
            namespace: "ns".to_string(),
            label_selector: labels
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            columns: vec![ColumnDef {
                header: "Name".to_string(),
                width: 20,
                path: "metadata.name".to_string(),
            }],
            page_size: 0,
        }
    }

    #[test]
    fn apply_and_delete_events_drive_the_row_set() {
        let panel = TablePanel::new(table_def(&[]));
        let writer = panel.writer();
        let mut resync = TableResync::default();

        apply_table_event(&writer, &mut resync, Event::Apply(object("a", "uid-a")));
        apply_table_event(&writer, &mut resync, Event::Apply(object("b", "uid-b")));
        apply_table_event(&writer, &mut resync, Event::Delete(object("a", "uid-a")));

        let (rows, _) = panel.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].uid, "uid-b");
    }

    #[test]
    fn relist_drops_rows_missing_from_the_init_set() {
        let panel = TablePanel::new(table_def(&[]));
        let writer = panel.writer();
        let mut resync = TableResync::default();

        apply_table_event(&writer, &mut resync, Event::Apply(object("a", "uid-a")));
        apply_table_event(&writer, &mut resync, Event::Apply(object("b", "uid-b")));

        apply_table_event(&writer, &mut resync, Event::Init);
        apply_table_event(&writer, &mut resync, Event::InitApply(object("b", "uid-b")));
        apply_table_event(&writer, &mut resync, Event::InitDone);

        let (rows, _) = panel.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].uid, "uid-b");
    }

    #[test]
    fn watch_config_carries_the_label_selector() {
        let config = table_watch_config(&table_def(&[("app", "web")]));
        assert_eq!(config.label_selector.as_deref(), Some("app=web"));

        let config = table_watch_config(&table_def(&[]));
        assert_eq!(config.label_selector, None);
    }

    fn item_panel() -> ItemPanel {
        ItemPanel::new(ItemDef {
            name: "cm".to_string(),
            group: String::new(),
            version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            key: ObjectKey {
                namespace: "ns".to_string(),
                name: "settings".to_string(),
            },
        })
    }

    #[test]
    fn item_apply_renders_yaml_and_delete_clears_it() {
        let panel = item_panel();
        let writer = panel.writer();
        let mut resync = ItemResync::default();

        apply_item_event(&writer, &mut resync, Event::Apply(object("settings", "uid-s")));
        assert!(panel.display_text().contains("name: settings"));

        apply_item_event(&writer, &mut resync, Event::Delete(object("settings", "uid-s")));
        assert!(panel.display_text().is_empty());
    }

    #[test]
    fn item_relist_without_the_object_clears_stale_content() {
        let panel = item_panel();
        let writer = panel.writer();
        let mut resync = ItemResync::default();

        apply_item_event(&writer, &mut resync, Event::Apply(object("settings", "uid-s")));
        assert!(panel.display_text().contains("name: settings"));

        apply_item_event(&writer, &mut resync, Event::Init);
        apply_item_event(&writer, &mut resync, Event::InitDone);
        assert!(panel.display_text().is_empty());
    }

    #[test]
    fn item_relist_that_redelivers_the_object_keeps_it() {
        let panel = item_panel();
        let writer = panel.writer();
        let mut resync = ItemResync::default();

        apply_item_event(&writer, &mut resync, Event::Init);
        apply_item_event(&writer, &mut resync, Event::InitApply(object("settings", "uid-s")));
        apply_item_event(&writer, &mut resync, Event::InitDone);
        assert!(panel.display_text().contains("name: settings"));
    }
}
