use chrono::{DateTime, Utc};

const FALLBACK_NAME: &str = "Character";

/// Filesystem-safe stem: whitespace runs become `_`, anything else that is
/// not alphanumeric, `-` or `_` is dropped.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_gap = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            pending_gap = true;
            continue;
        }
        if !(c.is_alphanumeric() || c == '-' || c == '_') {
            continue;
        }
        if pending_gap && !out.is_empty() {
            out.push('_');
        }
        pending_gap = false;
        out.push(c);
    }
    if out.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        out
    }
}

/// `{name}_Sheet_{date}_{time}.{extension}`.
pub fn artifact_filename(name: &str, at: DateTime<Utc>, extension: &str) -> String {
    format!(
        "{}_Sheet_{}.{extension}",
        sanitize_name(name),
        at.format("%Y-%m-%d_%H-%M-%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn names_become_safe_stems() {
        assert_eq!(sanitize_name("Filroden the Bold"), "Filroden_the_Bold");
        assert_eq!(sanitize_name("  Ælfric / \"Ash\"  Arm "), "Ælfric_Ash_Arm");
        assert_eq!(sanitize_name("../../etc"), "etc");
        assert_eq!(sanitize_name("***"), "Character");
        assert_eq!(sanitize_name(""), "Character");
    }

    #[test]
    fn filename_carries_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(
            artifact_filename("Filroden the Bold", at, "html"),
            "Filroden_the_Bold_Sheet_2026-03-14_09-26-53.html"
        );
    }
}
