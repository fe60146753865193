use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::app::App;
use crate::config::ColumnDef;
use crate::item::ItemPanel;
use crate::logs::{LogsMode, LogsPanel};
use crate::panel::Panel;
use crate::table::{DEFAULT_COLUMN_WIDTH, RowEntry, TableMode, TablePanel};
use crate::tabs;
use crate::theme::Theme;

pub fn render(frame: &mut Frame, app: &mut App, theme: &Theme) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tabs(frame, root[0], app, theme);
    render_body(frame, root[1], app, theme);
    render_footer(frame, root[2], app, theme);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let titles = app
        .panels
        .iter()
        .map(|panel| format!(" {} ", panel.name()))
        .collect::<Vec<_>>();
    let widths = titles
        .iter()
        .map(|title| title.chars().count() as u16)
        .collect::<Vec<_>>();
    let pages = tabs::paginate(&widths, area.width);
    if pages.is_empty() {
        return;
    }
    let page_index = tabs::page_for(&pages, app.active);
    let page = pages[page_index];

    let mut spans = Vec::new();
    spans.push(Span::styled(
        if page_index > 0 { "◀ " } else { "  " },
        theme.hint,
    ));
    for index in page.start..page.end {
        let style = if index == app.active {
            theme.tab_selected
        } else {
            theme.tab
        };
        spans.push(Span::styled(titles[index].clone(), style));
    }
    if page_index + 1 < pages.len() {
        spans.push(Span::styled(" ▶", theme.hint));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App, theme: &Theme) {
    let active = app.active;
    match app.panels.get_mut(active) {
        Some(Panel::Table(panel)) => render_table(frame, area, panel, theme),
        Some(Panel::Item(panel)) => render_item(frame, area, panel, theme),
        Some(Panel::Logs(panel)) => render_logs(frame, area, panel, theme),
        None => {}
    }
}

fn panel_block(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .title(Span::styled(title.to_string(), theme.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
}

fn render_table(frame: &mut Frame, area: Rect, panel: &TablePanel, theme: &Theme) {
    if panel.mode == TableMode::Detail {
        let title = format!("{} details", panel.def().name);
        let paragraph = Paragraph::new(Text::from(panel.detail_text().to_string()))
            .block(panel_block(&title, theme))
            .scroll((panel.detail_scroll, 0));
        frame.render_widget(paragraph, area);
        return;
    }

    let (rows, error) = panel.snapshot();
    let title = format!("{} ({})", panel.def().name, rows.len());
    if let Some(error) = error {
        let paragraph = Paragraph::new(Text::from(error))
            .style(theme.error)
            .block(panel_block(&title, theme));
        frame.render_widget(paragraph, area);
        return;
    }

    let page_size = panel.page_size();
    let (window, selected) = page_window(&rows, panel.cursor(), page_size);

    let header = Row::new(panel.def().columns.iter().map(|column| {
        Cell::from(column.header.clone()).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1);

    let body = window
        .iter()
        .map(|row| Row::new(row.cells.iter().map(|cell| Cell::from(cell.clone()))));

    let table = Table::new(body, column_constraints(&panel.def().columns))
        .header(header)
        .block(panel_block(&title, theme))
        .column_spacing(1)
        .row_highlight_style(theme.selected_row);

    let mut state = TableState::default();
    state.select(selected);
    frame.render_stateful_widget(table, area, &mut state);
}

/// Slice of rows for the page containing the cursor, plus the cursor's
/// position within that slice.
fn page_window(rows: &[RowEntry], cursor: usize, page_size: usize) -> (&[RowEntry], Option<usize>) {
    if rows.is_empty() {
        return (rows, None);
    }
    let cursor = cursor.min(rows.len() - 1);
    let start = (cursor / page_size) * page_size;
    let end = (start + page_size).min(rows.len());
    (&rows[start..end], Some(cursor - start))
}

fn column_constraints(columns: &[ColumnDef]) -> Vec<Constraint> {
    columns
        .iter()
        .map(|column| {
            if column.width == 0 {
                Constraint::Min(DEFAULT_COLUMN_WIDTH)
            } else {
                Constraint::Length(column.width)
            }
        })
        .collect()
}

fn render_item(frame: &mut Frame, area: Rect, panel: &ItemPanel, theme: &Theme) {
    let title = format!("{} ({})", panel.def().name, panel.def().key.display());
    let style = if panel.has_error() {
        theme.error
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(Text::from(panel.display_text()))
        .style(style)
        .block(panel_block(&title, theme))
        .scroll((panel.scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_logs(frame: &mut Frame, area: Rect, panel: &LogsPanel, theme: &Theme) {
    let title = format!("{} ({})", panel.def().name, panel.def().key.display());

    if let Some(error) = panel.last_error() {
        let paragraph = Paragraph::new(Text::from(error))
            .style(theme.error)
            .block(panel_block(&title, theme));
        frame.render_widget(paragraph, area);
        return;
    }

    if panel.mode == LogsMode::Streaming {
        let paragraph = Paragraph::new(Text::from(panel.streaming_text().to_string()))
            .block(panel_block(&title, theme))
            .scroll((panel.scroll, 0));
        frame.render_widget(paragraph, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let content = match panel.mode {
        LogsMode::Searched => panel.search_results().clone(),
        _ => Text::from(panel.streaming_text().to_string()),
    };
    let paragraph = Paragraph::new(content)
        .block(panel_block(&title, theme))
        .scroll((panel.scroll, 0));
    frame.render_widget(paragraph, chunks[0]);

    let mode_label = if panel.strict { "strict" } else { "fuzzy" };
    let line = Line::from(vec![
        Span::raw(format!("> {}", panel.term)),
        Span::styled(format!("   search mode: {mode_label}"), theme.search_mode),
    ]);
    frame.render_widget(Paragraph::new(line), chunks[1]);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let hints = match app.active_panel() {
        Some(Panel::Logs(panel)) if panel.mode == LogsMode::Searching => {
            "enter search · esc back · ctrl+s toggle mode"
        }
        Some(Panel::Logs(_)) => "tab next · / search · ctrl+s toggle mode · q quit",
        Some(Panel::Table(panel)) if panel.mode == TableMode::Detail => {
            "v back · up/down scroll · q quit"
        }
        Some(Panel::Table(_)) => "tab next · up/down select · v details · q quit",
        _ => "tab next · up/down scroll · q quit",
    };
    frame.render_widget(Paragraph::new(hints).style(theme.hint), area);
}

#[cfg(test)]
mod tests {
    use super::{column_constraints, page_window};
    use crate::config::ColumnDef;
    use crate::table::{DEFAULT_COLUMN_WIDTH, RowEntry, RowIdentity};
    use ratatui::layout::Constraint;

    fn rows(count: usize) -> Vec<RowEntry> {
        (0..count)
            .map(|index| RowEntry {
                uid: format!("uid-{index}"),
                cells: vec![format!("row-{index}")],
                identity: RowIdentity {
                    namespace: Some("ns".to_string()),
                    name: format!("row-{index}"),
                },
                index,
            })
            .collect()
    }

    #[test]
    fn fixed_and_flex_column_constraints() {
        let columns = vec![
            ColumnDef {
                header: "Name".to_string(),
                width: 30,
                path: "metadata.name".to_string(),
            },
            ColumnDef {
                header: "Phase".to_string(),
                width: 0,
                path: "status.phase".to_string(),
            },
        ];
        assert_eq!(
            column_constraints(&columns),
            vec![
                Constraint::Length(30),
                Constraint::Min(DEFAULT_COLUMN_WIDTH)
            ]
        );
    }

    #[test]
    fn page_window_slices_around_the_cursor() {
        let rows = rows(12);

        let (window, selected) = page_window(&rows, 0, 5);
        assert_eq!(window.len(), 5);
        assert_eq!(selected, Some(0));

        let (window, selected) = page_window(&rows, 7, 5);
        assert_eq!(window[0].uid, "uid-5");
        assert_eq!(selected, Some(2));

        let (window, selected) = page_window(&rows, 11, 5);
        assert_eq!(window.len(), 2);
        assert_eq!(selected, Some(1));
    }

    #[test]
    fn page_window_handles_empty_rows() {
        let (window, selected) = page_window(&[], 3, 5);
        assert!(window.is_empty());
        assert_eq!(selected, None);
    }
}
