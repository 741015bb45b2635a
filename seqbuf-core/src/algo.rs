//! Sequence search helpers, generic over an equality predicate so the
//! buffer can match elements of its own type and callers can search with
//! looser notions of equality.

/// First position at which `needle` occurs in `haystack`. An empty needle
/// occurs at 0.
pub fn search<T, U, F>(haystack: &[T], needle: &[U], mut eq: F) -> Option<usize>
where
    F: FnMut(&T, &U) -> bool,
{
    if needle.is_empty() {
        return Some(0);
    }

    if needle.len() > haystack.len() {
        return None;
    }

    (0..=haystack.len() - needle.len())
        .find(|&start| matches_at(haystack, start, needle, &mut eq))
}

/// Last position at which `needle` occurs in `haystack`. An empty needle
/// is never found.
pub fn find_end<T, U, F>(haystack: &[T], needle: &[U], mut eq: F) -> Option<usize>
where
    F: FnMut(&T, &U) -> bool,
{
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&start| matches_at(haystack, start, needle, &mut eq))
}

pub fn find_first_of<T, U, F>(haystack: &[T], set: &[U], mut eq: F) -> Option<usize>
where
    F: FnMut(&T, &U) -> bool,
{
    haystack.iter().position(|a| set.iter().any(|b| eq(a, b)))
}

pub fn find_first_not_of<T, U, F>(haystack: &[T], set: &[U], mut eq: F) -> Option<usize>
where
    F: FnMut(&T, &U) -> bool,
{
    haystack.iter().position(|a| !set.iter().any(|b| eq(a, b)))
}

pub fn find_last_of<T, U, F>(haystack: &[T], set: &[U], mut eq: F) -> Option<usize>
where
    F: FnMut(&T, &U) -> bool,
{
    haystack.iter().rposition(|a| set.iter().any(|b| eq(a, b)))
}

pub fn find_last_not_of<T, U, F>(haystack: &[T], set: &[U], mut eq: F) -> Option<usize>
where
    F: FnMut(&T, &U) -> bool,
{
    haystack.iter().rposition(|a| !set.iter().any(|b| eq(a, b)))
}

fn matches_at<T, U, F>(haystack: &[T], start: usize, needle: &[U], eq: &mut F) -> bool
where
    F: FnMut(&T, &U) -> bool,
{
    haystack[start..start + needle.len()]
        .iter()
        .zip(needle)
        .all(|(a, b)| eq(a, b))
}
