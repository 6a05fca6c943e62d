//! Best-effort contact inference from résumé text.
//!
//! Email and phone come from the first regex match in the plain text. The
//! name is looked for in the upper-right header region of the first page
//! when positions are available, then in the first few lines of text.

use std::sync::OnceLock;

use regex::Regex;

use super::pdf::PositionedFragment;
use crate::models::ContactInfo;

const MIN_PHONE_DIGITS: usize = 7;
const HEADER_MIN_X_RATIO: f64 = 0.4;
const HEADER_MIN_Y_RATIO: f64 = 0.15;
const MAX_HEADER_CANDIDATES: usize = 20;
const MAX_FRAGMENT_LEN: usize = 30;
const SAME_LINE_DY: f64 = 5.0;
const SAME_LINE_DX: f64 = 200.0;
const MAX_NAME_LEN: usize = 50;
const FALLBACK_LINES: usize = 10;
const NAME_STOPWORDS: [&str; 5] = ["curriculum", "resume", "linkedin", "profile", "contact"];

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+").expect("valid email regex")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\+?\d{1,3}[-.\s]?)?\(?\d{1,4}\)?[-.\s]?\d{1,4}[-.\s]?\d{1,9}")
            .expect("valid phone regex")
    })
}

fn name_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-zÀ-ÿ\s'-]+$").expect("valid name regex"))
}

/// Infers name, email and phone. Never fails; every field may come back empty.
pub fn infer_contact_info(text: &str, positions: Option<&[PositionedFragment]>) -> ContactInfo {
    let name = positions
        .and_then(name_from_positions)
        .or_else(|| name_from_lines(text));

    ContactInfo {
        name,
        email: find_email(text),
        phone: find_phone(text),
    }
}

pub fn find_email(text: &str) -> Option<String> {
    email_re().find(text).map(|m| m.as_str().to_string())
}

/// First phone-shaped match carrying enough digits to be a real number
/// rather than a date or a year range.
pub fn find_phone(text: &str) -> Option<String> {
    phone_re()
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            candidate.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
        })
        .map(str::to_string)
}

fn has_contact_token(text: &str) -> bool {
    email_re().is_match(text) || find_phone(text).is_some()
}

fn is_name_like(text: &str) -> bool {
    name_like_re().is_match(text)
}

fn word_count_ok(text: &str) -> bool {
    (2..=4).contains(&text.split_whitespace().count())
}

fn name_from_positions(positions: &[PositionedFragment]) -> Option<String> {
    let page_width = positions.first()?.page_width;
    let max_y = positions.iter().map(|p| p.y).fold(f64::MIN, f64::max);

    let mut header: Vec<&PositionedFragment> = positions
        .iter()
        .filter(|p| p.x >= page_width * HEADER_MIN_X_RATIO && p.y >= max_y * HEADER_MIN_Y_RATIO)
        .collect();
    // Top of the page first, then rightmost.
    header.sort_by(|a, b| b.y.total_cmp(&a.y).then(b.x.total_cmp(&a.x)));
    header.truncate(MAX_HEADER_CANDIDATES);

    for fragment in &header {
        let text = fragment.text.trim();
        if text.is_empty() || text.chars().count() >= MAX_FRAGMENT_LEN || !is_name_like(text) {
            continue;
        }

        let mut line: Vec<&PositionedFragment> = header
            .iter()
            .copied()
            .filter(|other| {
                (other.y - fragment.y).abs() < SAME_LINE_DY
                    && (other.x - fragment.x).abs() < SAME_LINE_DX
            })
            .collect();
        line.sort_by(|a, b| a.x.total_cmp(&b.x));

        let merged = line
            .iter()
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !merged.is_empty()
            && merged.chars().count() < MAX_NAME_LEN
            && word_count_ok(&merged)
            && !has_contact_token(&merged)
        {
            return Some(merged);
        }
    }

    None
}

fn name_from_lines(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(FALLBACK_LINES)
        .find(|line| {
            if has_contact_token(line) || line.chars().count() > MAX_NAME_LEN {
                return false;
            }
            let lower = line.to_lowercase();
            if NAME_STOPWORDS.iter().any(|w| lower.contains(w)) {
                return false;
            }
            is_name_like(line) && word_count_ok(line)
        })
        .map(str::to_string)
}
