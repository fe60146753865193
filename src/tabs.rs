/// Horizontal space held back from the tab row for the pager arrows.
pub const ARROW_RESERVE: u16 = 5;

/// A contiguous run of tab indices that fits on one header row.
/// `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabPage {
    pub start: usize,
    pub end: usize,
}

/// Packs tab titles into pages greedily, left to right. A tab wider than the
/// whole row still gets a page of its own so it stays reachable.
pub fn paginate(widths: &[u16], width: u16) -> Vec<TabPage> {
    let usable = width.saturating_sub(ARROW_RESERVE);
    let mut pages = Vec::new();
    let mut start = 0;
    let mut used: u16 = 0;
    for (index, tab_width) in widths.iter().enumerate() {
        let next = used.saturating_add(*tab_width);
        if index > start && next > usable {
            pages.push(TabPage { start, end: index });
            start = index;
            used = *tab_width;
        } else {
            used = next;
        }
    }
    if start < widths.len() {
        pages.push(TabPage {
            start,
            end: widths.len(),
        });
    }
    pages
}

/// Index of the page containing the selected tab.
pub fn page_for(pages: &[TabPage], selected: usize) -> usize {
    pages
        .iter()
        .position(|page| selected >= page.start && selected < page.end)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{ARROW_RESERVE, TabPage, page_for, paginate};

    #[test]
    fn all_tabs_fit_on_one_page() {
        let pages = paginate(&[10, 10, 10], 40 + ARROW_RESERVE);
        assert_eq!(pages, vec![TabPage { start: 0, end: 3 }]);
    }

    #[test]
    fn overflow_starts_a_new_page() {
        let pages = paginate(&[10, 10, 10], 25 + ARROW_RESERVE);
        assert_eq!(
            pages,
            vec![TabPage { start: 0, end: 2 }, TabPage { start: 2, end: 3 }]
        );
    }

    #[test]
    fn oversized_tab_gets_its_own_page() {
        let pages = paginate(&[100, 10], 20 + ARROW_RESERVE);
        assert_eq!(
            pages,
            vec![TabPage { start: 0, end: 1 }, TabPage { start: 1, end: 2 }]
        );
    }

    #[test]
    fn no_tabs_yields_no_pages() {
        assert!(paginate(&[], 80).is_empty());
    }

    #[test]
    fn page_for_finds_containing_page() {
        let pages = vec![TabPage { start: 0, end: 2 }, TabPage { start: 2, end: 5 }];
        assert_eq!(page_for(&pages, 1), 0);
        assert_eq!(page_for(&pages, 4), 1);
        assert_eq!(page_for(&pages, 9), 0);
    }
}
