//! Round-trip filename convention: `{documentId}___{cabinetId}___{title}.pdf`.

use std::sync::LazyLock;

use regex::Regex;

/// Separator between the filename's components.
pub const SEPARATOR: &str = "___";

/// Longest title fragment written by bulk download.
pub const MAX_TITLE_LEN: usize = 50;

static ROUND_TRIP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)___(.+)___(.+)\.pdf$").expect("static regex")
});

/// Identity encoded in an eligible filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTripName {
    pub document_id: String,
    pub cabinet_id: String,
    pub fragment: String,
}

/// Parse a filename; `None` means the file is not part of the round trip.
pub fn parse_round_trip_name(file_name: &str) -> Option<RoundTripName> {
    let caps = ROUND_TRIP_NAME.captures(file_name)?;
    Some(RoundTripName {
        document_id: caps[1].to_string(),
        cabinet_id: caps[2].to_string(),
        fragment: caps[3].to_string(),
    })
}

/// Replace every non-alphanumeric character with `_` and cap the length.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_TITLE_LEN)
        .collect()
}

/// Filename under which bulk download stores a document.
pub fn download_filename(document_id: &str, cabinet_id: &str, title: &str) -> String {
    let mut safe = sanitize_title(title);
    if safe.is_empty() {
        safe = sanitize_title(document_id);
    }
    format!(
        "{}{sep}{}{sep}{}.pdf",
        document_id,
        cabinet_id,
        safe,
        sep = SEPARATOR
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let name = download_filename("123", "abc", "Invoice #9");
        assert_eq!(name, "123___abc___Invoice__9.pdf");
        assert_eq!(
            parse_round_trip_name(&name),
            Some(RoundTripName {
                document_id: "123".into(),
                cabinet_id: "abc".into(),
                fragment: "Invoice__9".into(),
            })
        );
    }

    #[test]
    fn test_guid_cabinet_and_upper_extension() {
        let parsed =
            parse_round_trip_name("77___b3a1c2d4-1111-2222-3333-444455556666___Scan.PDF").unwrap();
        assert_eq!(parsed.document_id, "77");
        assert_eq!(parsed.cabinet_id, "b3a1c2d4-1111-2222-3333-444455556666");
    }

    #[test]
    fn test_non_matching_names() {
        for name in [
            "notes.txt",
            "abc___cab___title.pdf",
            "123___cab.pdf",
            "123___cab___title.pdf.bak",
            "123______.pdf",
        ] {
            assert_eq!(parse_round_trip_name(name), None, "{}", name);
        }
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(80);
        assert_eq!(sanitize_title(&long).len(), MAX_TITLE_LEN);
        assert_eq!(sanitize_title("Relatório 2024"), "Relat_rio_2024");
    }

    #[test]
    fn test_empty_title_falls_back_to_id() {
        assert_eq!(download_filename("5", "c", ""), "5___c___5.pdf");
    }
}
