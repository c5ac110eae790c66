use serde::Serialize;

/// One bounded slice of an ordered collection plus navigation metadata.
/// Serialized directly into feed responses as the page envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// One-based page number actually served (after clamping).
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

/// A requested page number as it arrives from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    /// No `page` parameter; serve the first page.
    Default,
    Requested(i64),
}

impl PageNumber {
    /// Parses the raw `?page=` value. A missing parameter defaults to the
    /// first page; an unparseable one is treated as out of range and ends
    /// up clamped to the last page.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            None => PageNumber::Default,
            Some(value) => value
                .trim()
                .parse::<i64>()
                .map(PageNumber::Requested)
                .unwrap_or(PageNumber::Requested(i64::MAX)),
        }
    }
}

/// Slices an already-ordered collection into one fixed-size page.
///
/// Out-of-range requests (too high, negative, zero, non-numeric) clamp to
/// the last valid page rather than failing. An empty collection yields a
/// single empty page, never zero pages.
pub fn paginate<T>(items: Vec<T>, requested: PageNumber, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);

    let number = match requested {
        PageNumber::Default => 1,
        PageNumber::Requested(n) if n < 1 => total_pages,
        PageNumber::Requested(n) => (n as usize).min(total_pages),
    };

    let start = (number - 1) * page_size;
    let page_items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();

    Page {
        items: page_items,
        number,
        total_pages,
        total_items,
        has_previous: number > 1,
        has_next: number < total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn concatenating_all_pages_reproduces_the_collection() {
        let source = numbers(25);
        let mut rebuilt = Vec::new();
        let mut page_number = 1;
        loop {
            let page = paginate(source.clone(), PageNumber::Requested(page_number as i64), 10);
            rebuilt.extend(page.items.iter().copied());
            if !page.has_next {
                break;
            }
            page_number += 1;
        }
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn empty_collection_yields_one_empty_page() {
        let page = paginate(Vec::<usize>::new(), PageNumber::Default, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_previous);
        assert!(!page.has_next);
    }

    #[test]
    fn twenty_five_items_split_ten_ten_five() {
        let first = paginate(numbers(25), PageNumber::Requested(1), 10);
        assert_eq!(first.items.len(), 10);
        assert!(!first.has_previous);
        assert!(first.has_next);

        let second = paginate(numbers(25), PageNumber::Requested(2), 10);
        assert_eq!(second.items.len(), 10);
        assert!(second.has_previous);
        assert!(second.has_next);

        let third = paginate(numbers(25), PageNumber::Requested(3), 10);
        assert_eq!(third.items.len(), 5);
        assert_eq!(third.total_pages, 3);
        assert!(third.has_previous);
        assert!(!third.has_next);
    }

    #[test]
    fn out_of_range_requests_clamp_to_the_last_page() {
        let expected = paginate(numbers(25), PageNumber::Requested(3), 10);

        let too_high = paginate(numbers(25), PageNumber::Requested(4), 10);
        assert_eq!(too_high.number, 3);
        assert_eq!(too_high.items, expected.items);

        let negative = paginate(numbers(25), PageNumber::Requested(-2), 10);
        assert_eq!(negative.number, 3);
        assert_eq!(negative.items, expected.items);

        let non_numeric = paginate(numbers(25), PageNumber::from_query(Some("abc")), 10);
        assert_eq!(non_numeric.number, 3);
        assert_eq!(non_numeric.items, expected.items);
    }

    #[test]
    fn missing_page_parameter_defaults_to_first_page() {
        assert_eq!(PageNumber::from_query(None), PageNumber::Default);
        let page = paginate(numbers(25), PageNumber::from_query(None), 10);
        assert_eq!(page.number, 1);
    }

    #[test]
    fn full_final_page_when_remainder_is_zero() {
        let page = paginate(numbers(20), PageNumber::Requested(2), 10);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next);
    }
}
