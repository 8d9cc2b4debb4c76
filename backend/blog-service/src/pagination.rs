//! Fixed-size paging of ordered feeds.
//!
//! Page numbers are 1-based. Out-of-range requests are clamped to the first
//! or last page instead of failing, and an empty sequence still has one
//! (empty) page.

use serde::{Deserialize, Serialize};

/// One page of an ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next.then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous.then(|| self.number - 1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `?page=N` query parameter. Anything that is not an integer counts as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn index(&self) -> Option<i64> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }
}

/// Slice `items` into the requested page. `page_size` of zero is treated as one.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, page_index: Option<i64>) -> Page<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let num_pages = total.div_ceil(page_size).max(1);

    let requested = page_index.unwrap_or(1);
    let number = if requested < 1 {
        1
    } else {
        usize::try_from(requested).unwrap_or(usize::MAX).min(num_pages)
    };

    let start = (number - 1) * page_size;
    let end = (start + page_size).min(total);
    let page_items = if start < total {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    Page {
        items: page_items,
        number,
        num_pages,
        total,
        has_next: number < num_pages,
        has_previous: number > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eleven() -> Vec<u32> {
        (1..=11).collect()
    }

    #[test]
    fn first_page_is_full_and_has_next() {
        let page = paginate(&eleven(), 10, Some(1));
        assert_eq!(page.len(), 10);
        assert_eq!(page.items[0], 1);
        assert!(page.has_next);
        assert!(!page.has_previous);
        assert_eq!(page.num_pages, 2);
        assert_eq!(page.next_page_number(), Some(2));
    }

    #[test]
    fn second_page_holds_the_remainder() {
        let page = paginate(&eleven(), 10, Some(2));
        assert_eq!(page.items, vec![11]);
        assert!(!page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.previous_page_number(), Some(1));
    }

    #[test]
    fn out_of_range_clamps_to_last_page() {
        let page = paginate(&eleven(), 10, Some(99));
        assert_eq!(page.number, 2);
        assert_eq!(page.items, vec![11]);
    }

    #[test]
    fn below_one_clamps_to_first_page() {
        for index in [0, -5, i64::MIN] {
            let page = paginate(&eleven(), 10, Some(index));
            assert_eq!(page.number, 1);
            assert_eq!(page.len(), 10);
        }
    }

    #[test]
    fn absent_index_means_first_page() {
        assert_eq!(paginate(&eleven(), 10, None).number, 1);
    }

    #[test]
    fn empty_sequence_has_one_empty_page() {
        let page = paginate::<u32>(&[], 10, Some(3));
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let items: Vec<u32> = (0..20).collect();
        let page = paginate(&items, 10, Some(3));
        assert_eq!(page.num_pages, 2);
        assert_eq!(page.number, 2);
        assert_eq!(page.len(), 10);
    }

    #[test]
    fn query_ignores_garbage() {
        let query = PageQuery {
            page: Some("abc".to_string()),
        };
        assert_eq!(query.index(), None);

        let query = PageQuery {
            page: Some(" 2 ".to_string()),
        };
        assert_eq!(query.index(), Some(2));
        assert_eq!(PageQuery::default().index(), None);
    }
}
