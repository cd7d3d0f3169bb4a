//! Signal name normalization

/// Canonicalize a signal name into a comparison key
///
/// Lower-cases the name and drops underscores, hyphens, periods and
/// whitespace. The key is only ever compared, never displayed.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | '.') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize("A_B-C.D"), normalize("abcd"));
        assert_eq!(normalize("BMS_HVNetwork Voltage__BLMS"), "bmshvnetworkvoltageblms");
        assert_eq!(normalize("  -_. "), "");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        for name in ["Foo_BLMS", "ME_InverterCurrent_BLMS_v2", "Endo-Réveil", "a.b c\td", "ÉTAT"] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once);
        }
    }
}
