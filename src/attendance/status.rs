//! Status marks used on attendance sheets.

use crate::models::AttendanceStatus;

/// Canonical alias table shared by the prompt and the regex tier.
pub const STATUS_ALIASES: &[(AttendanceStatus, &[&str])] = &[
    (AttendanceStatus::Present, &["✓", "√", "✔", "hadir", "p"]),
    (AttendanceStatus::Sick, &["sakit", "s"]),
    (AttendanceStatus::Permission, &["izin", "i"]),
    (AttendanceStatus::Absent, &["alpa", "a", "✗", "x"]),
];

/// Mark glyphs that may be glued to neighbouring text.
const GLYPHS: &[(char, AttendanceStatus)] = &[
    ('✓', AttendanceStatus::Present),
    ('√', AttendanceStatus::Present),
    ('✔', AttendanceStatus::Present),
    ('✗', AttendanceStatus::Absent),
];

/// Resolve a single token to a status.
pub fn status_from_alias(token: &str) -> Option<AttendanceStatus> {
    let token = token.trim().to_lowercase();
    if token.is_empty() {
        return None;
    }
    if let Some(status) = AttendanceStatus::from_str(&token) {
        return Some(status);
    }
    STATUS_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&token.as_str()))
        .map(|(status, _)| *status)
}

/// Status of a token that carries a mark glyph anywhere inside it.
pub fn status_from_glyph(token: &str) -> Option<AttendanceStatus> {
    token
        .chars()
        .find_map(|c| GLYPHS.iter().find(|(g, _)| *g == c).map(|(_, s)| *s))
}

/// Render the alias table for the prompt.
pub fn alias_table() -> String {
    STATUS_ALIASES
        .iter()
        .map(|(status, aliases)| format!("{}: {}", status.as_str(), aliases.join(",")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(status_from_alias("✓"), Some(AttendanceStatus::Present));
        assert_eq!(status_from_alias("HADIR"), Some(AttendanceStatus::Present));
        assert_eq!(status_from_alias("s"), Some(AttendanceStatus::Sick));
        assert_eq!(status_from_alias("Izin"), Some(AttendanceStatus::Permission));
        assert_eq!(status_from_alias("x"), Some(AttendanceStatus::Absent));
        assert_eq!(status_from_alias("alpa"), Some(AttendanceStatus::Absent));
        assert_eq!(status_from_alias("sick"), Some(AttendanceStatus::Sick));
        assert_eq!(status_from_alias("ahmad"), None);
        assert_eq!(status_from_alias(""), None);
    }

    #[test]
    fn test_glyph_inside_token() {
        assert_eq!(status_from_glyph("Ahmad✓"), Some(AttendanceStatus::Present));
        assert_eq!(status_from_glyph("(✗)"), Some(AttendanceStatus::Absent));
        assert_eq!(status_from_glyph("Ahmad"), None);
    }

    #[test]
    fn test_alias_table_lists_every_status() {
        let table = alias_table();
        assert!(table.contains("present: ✓,√,✔,hadir,p"));
        assert!(table.contains("sick: sakit,s"));
        assert!(table.contains("permission: izin,i"));
        assert!(table.contains("absent: alpa,a,✗,x"));
    }
}
