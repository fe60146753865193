use crate::config::{ColumnDef, TableDef};
use crate::fields;
use crate::k8s::KindBinding;
use crate::panel::lock;
use kube::ResourceExt;
use kube::core::DynamicObject;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_COLUMN_WIDTH: u16 = 20;

/// Namespace + name captured per row for detail-view lookups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RowIdentity {
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RowEntry {
    pub uid: String,
    pub cells: Vec<String>,
    pub identity: RowIdentity,
    /// Position in the rendered table. Recomputed on every structural change;
    /// an index captured before a concurrent mutation may point at a
    /// different row afterwards.
    pub index: usize,
}

/// The shared, lock-guarded core of a table panel. The event router writes,
/// the UI thread reads for rendering.
#[derive(Debug, Default)]
pub struct TableRows {
    rows: HashMap<String, RowEntry>,
    pub last_error: Option<String>,
}

impl TableRows {
    fn renumber(&mut self) {
        let mut ordered = self.rows.values_mut().collect::<Vec<_>>();
        ordered.sort_by(|a, b| a.identity.cmp(&b.identity));
        for (index, row) in ordered.into_iter().enumerate() {
            row.index = index;
        }
    }

    pub fn ordered(&self) -> Vec<RowEntry> {
        let mut rows = self.rows.values().cloned().collect::<Vec<_>>();
        rows.sort_by_key(|row| row.index);
        rows
    }

    pub fn entry_at(&self, index: usize) -> Option<&RowEntry> {
        self.rows.values().find(|row| row.index == index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Router-side mutation handle for one table panel.
#[derive(Clone)]
pub struct TableWriter {
    state: Arc<Mutex<TableRows>>,
    columns: Arc<[ColumnDef]>,
}

impl TableWriter {
    pub fn add_or_update(&self, object: &DynamicObject) {
        let Some(uid) = object.uid() else {
            // one malformed event never disturbs existing rows
            warn!("dropping update without metadata.uid for {}", object.name_any());
            return;
        };
        let body = match serde_json::to_value(object) {
            Ok(body) => body,
            Err(error) => {
                let mut state = lock(&self.state);
                state.last_error = Some(format!(
                    "rendering update for {}: {error}",
                    object.name_any()
                ));
                return;
            }
        };

        let cells = self
            .columns
            .iter()
            .map(|column| fields::render(fields::extract(&body, &column.path)))
            .collect::<Vec<_>>();
        let identity = RowIdentity {
            namespace: object.namespace(),
            name: object.name_any(),
        };

        let mut state = lock(&self.state);
        state.last_error = None;
        state.rows.insert(
            uid.clone(),
            RowEntry {
                uid,
                cells,
                identity,
                index: 0,
            },
        );
        state.renumber();
    }

    /// Drops every row whose uid is not in `keep`. Used after a watch resync
    /// to clear rows deleted while the stream was down.
    pub fn retain_uids(&self, keep: &[String]) {
        let mut state = lock(&self.state);
        state.rows.retain(|uid, _| keep.iter().any(|kept| kept == uid));
        state.renumber();
    }

    pub fn delete_row(&self, uid: &str) {
        let mut state = lock(&self.state);
        state.rows.remove(uid);
        state.renumber();
    }

    pub fn set_error(&self, message: String) {
        lock(&self.state).last_error = Some(message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    Table,
    Detail,
}

/// Table panel: a live row projection of one resource kind, with a toggled
/// detail view over the highlighted row.
pub struct TablePanel {
    def: TableDef,
    state: Arc<Mutex<TableRows>>,
    binding: Option<KindBinding>,
    pub mode: TableMode,
    cursor: usize,
    detail: String,
    pub detail_scroll: u16,
    pub height: u16,
}

impl TablePanel {
    pub fn new(def: TableDef) -> Self {
        Self {
            def,
            state: Arc::new(Mutex::new(TableRows::default())),
            binding: None,
            mode: TableMode::Table,
            cursor: 0,
            detail: String::new(),
            detail_scroll: 0,
            height: 0,
        }
    }

    pub fn writer(&self) -> TableWriter {
        TableWriter {
            state: Arc::clone(&self.state),
            columns: self.def.columns.clone().into(),
        }
    }

    pub fn def(&self) -> &TableDef {
        &self.def
    }

    pub fn page_size(&self) -> usize {
        if self.def.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.def.page_size
        }
    }

    pub fn set_binding(&mut self, binding: KindBinding) {
        self.binding = Some(binding);
    }

    pub fn binding(&self) -> Option<&KindBinding> {
        self.binding.as_ref()
    }

    pub fn resize(&mut self, _width: u16, height: u16) {
        self.height = height / 2;
    }

    pub fn snapshot(&self) -> (Vec<RowEntry>, Option<String>) {
        let state = lock(&self.state);
        (state.ordered(), state.last_error.clone())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let count = lock(&self.state).len();
        if count == 0 {
            self.cursor = 0;
            return;
        }
        let max = count - 1;
        self.cursor = self
            .cursor
            .saturating_add_signed(delta)
            .min(max);
    }

    /// Captures the identity of the highlighted row and switches to detail
    /// mode. The index is read under the lock at toggle time; the actual
    /// object body is fetched afterwards by the scheduler.
    pub fn begin_detail(&mut self) -> Option<RowIdentity> {
        let identity = {
            let state = lock(&self.state);
            state.entry_at(self.cursor).map(|row| row.identity.clone())
        }?;
        self.mode = TableMode::Detail;
        self.detail = String::new();
        self.detail_scroll = 0;
        Some(identity)
    }

    /// Detail fetch outcome, success or error text alike; the panel stays in
    /// detail mode either way so the user can toggle back and retry.
    pub fn set_detail_content(&mut self, content: String) {
        if self.mode == TableMode::Detail {
            self.detail = content;
        }
    }

    pub fn exit_detail(&mut self) {
        self.mode = TableMode::Table;
        self.detail.clear();
        self.detail_scroll = 0;
    }

    pub fn detail_text(&self) -> &str {
        &self.detail
    }

    pub fn scroll_detail(&mut self, delta: i32) {
        let lines = self.detail.lines().count() as u16;
        let max = lines.saturating_sub(self.height.max(1));
        self.detail_scroll = self
            .detail_scroll
            .saturating_add_signed(delta as i16)
            .min(max);
    }
}
