/// Parse a page-range expression such as `"1-3, 7, 10-12"` into sorted,
/// merged, inclusive spans of 1-based pages.
///
/// - empty / whitespace-only => one span `1..=total`
/// - spans are clamped to `total`; pages below 1 are dropped
/// - unparseable parts are ignored
pub fn page_spans(range: &str, total: u32) -> Vec<(u32, u32)> {
    if total == 0 {
        return Vec::new();
    }
    if range.trim().is_empty() {
        return vec![(1, total)];
    }

    let mut raw = Vec::new();
    for part in range.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (start, end) = match part.split_once('-') {
            Some((a, b)) => match (a.trim().parse::<u32>(), b.trim().parse::<u32>()) {
                (Ok(a), Ok(b)) => (a, b),
                _ => continue,
            },
            None => match part.parse::<u32>() {
                Ok(p) => (p, p),
                Err(_) => continue,
            },
        };
        let (start, end) = (start.max(1), end.min(total));
        if start <= end {
            raw.push((start, end));
        }
    }

    raw.sort_unstable();
    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(raw.len());
    for (start, end) in raw {
        match merged.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Expand a page-range expression into sorted, de-duplicated page numbers.
/// Same rules as [`page_spans`].
pub fn parse_page_range(range: &str, total: u32) -> Vec<u32> {
    page_spans(range, total)
        .into_iter()
        .flat_map(|(start, end)| start..=end)
        .collect()
}

/// Number of pages that will actually be printed for one copy.
pub fn printed_pages(page_count: u32, page_range: Option<&str>) -> u32 {
    match page_range {
        Some(r) if !r.trim().is_empty() => page_spans(r, page_count)
            .iter()
            .map(|(start, end)| end - start + 1)
            .sum(),
        _ => page_count,
    }
}
