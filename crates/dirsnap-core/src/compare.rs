//! Digit-aware directory name ordering.

use std::cmp::Ordering;

/// Compares directory names treating runs of digits as numbers, so
/// "Backup-2" sorts before "Backup-10". Case is considered only when the
/// strings are equivalent without regard to case, and then lowercase
/// sorts first.
#[derive(Debug, Clone)]
pub struct LogicalComparer {
    digits: Vec<char>,
    zero: char,
}

impl Default for LogicalComparer {
    fn default() -> Self {
        Self::with_digits("0123456789")
    }
}

impl LogicalComparer {
    /// Build a comparer over the given digit glyphs. The first glyph is the
    /// zero stripped from numeric chunks. An empty set falls back to ASCII
    /// digits so the comparer always has a usable alphabet.
    pub fn with_digits(digits: &str) -> Self {
        let glyphs: Vec<char> = digits.chars().collect();
        match glyphs.first() {
            Some(&zero) => Self {
                digits: glyphs,
                zero,
            },
            None => Self {
                digits: ('0'..='9').collect(),
                zero: '0',
            },
        }
    }

    /// Total order over directory names.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.compare_case(a, b, true)
            .then_with(|| self.compare_case(a, b, false))
    }

    fn compare_case(&self, a: &str, b: &str, ignore_case: bool) -> Ordering {
        let mut ia = 0;
        let mut ib = 0;
        loop {
            match (self.next_chunk(a, &mut ia), self.next_chunk(b, &mut ib)) {
                // Both exhausted together: settle on the whole strings, which
                // separates pairs like "01"/"1" whose chunks compare equal.
                (None, None) => return compare_text(a, b, ignore_case),
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(ca), Some(cb)) => {
                    let ord = self.compare_chunk(ca, cb, ignore_case);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }

    /// Maximal run of digits or of non-digits starting at byte offset `*i`.
    fn next_chunk<'s>(&self, s: &'s str, i: &mut usize) -> Option<&'s str> {
        if *i >= s.len() {
            return None;
        }
        let start = *i;
        let mut chars = s[start..].chars();
        let first = chars.next()?;
        let in_digits = self.is_digit(first);
        let mut end = start + first.len_utf8();
        for c in chars {
            if self.is_digit(c) != in_digits {
                break;
            }
            end += c.len_utf8();
        }
        *i = end;
        Some(&s[start..end])
    }

    fn compare_chunk(&self, a: &str, b: &str, ignore_case: bool) -> Ordering {
        let a_numeric = a.chars().next().is_some_and(|c| self.is_digit(c));
        let b_numeric = b.chars().next().is_some_and(|c| self.is_digit(c));
        match (a_numeric, b_numeric) {
            (true, true) => {
                let a = a.trim_start_matches(self.zero);
                let b = b.trim_start_matches(self.zero);
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            // A numeric chunk sorts before a non-numeric one.
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_text(a, b, ignore_case),
        }
    }

    fn is_digit(&self, c: char) -> bool {
        self.digits.contains(&c)
    }
}

fn compare_text(a: &str, b: &str, ignore_case: bool) -> Ordering {
    let mut xs = a.chars();
    let mut ys = b.chars();
    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = fold(x).cmp(&fold(y));
                if ord != Ordering::Equal {
                    return ord;
                }
                if !ignore_case && x != y {
                    // Same letter in a different case: lowercase first.
                    return case_rank(x).cmp(&case_rank(y)).then_with(|| x.cmp(&y));
                }
            }
        }
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn case_rank(c: char) -> u8 {
    u8::from(!c.is_lowercase())
}
