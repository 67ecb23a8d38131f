//! Fixed domain knowledge about the report series: jurisdiction names,
//! filename abbreviations, first publication years and years in which a
//! jurisdiction is known to have published no report.

/// The federal jurisdiction; also the fallback when a filename carries
/// no recognized abbreviation.
pub const FEDERAL: &str = "Bund";

/// Two-letter filename codes for the regional jurisdictions.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("BW", "Baden-Württemberg"),
    ("BY", "Bayern"),
    ("BE", "Berlin"),
    ("BB", "Brandenburg"),
    ("HB", "Bremen"),
    ("HH", "Hamburg"),
    ("HE", "Hessen"),
    ("MV", "Mecklenburg-Vorpommern"),
    ("NI", "Niedersachsen"),
    ("NW", "Nordrhein-Westfalen"),
    ("RP", "Rheinland-Pfalz"),
    ("SL", "Saarland"),
    ("SN", "Sachsen"),
    ("ST", "Sachsen-Anhalt"),
    ("SH", "Schleswig-Holstein"),
    ("TH", "Thüringen"),
];

/// Year each jurisdiction first published a report.
pub const START_YEARS: &[(&str, i32)] = &[
    ("Sachsen-Anhalt", 1992),
    ("Thüringen", 1992),
    ("Niedersachsen", 1984),
    ("Hamburg", 1993),
    ("Bremen", 2002),
    ("Berlin", 1990),
    ("Bund", 1968),
    ("Baden-Württemberg", 1973),
    ("Bayern", 1976),
    ("Brandenburg", 1993),
    ("Hessen", 1977),
    ("Mecklenburg-Vorpommern", 1992),
    ("Saarland", 2013),
    ("Schleswig-Holstein", 1976),
    ("Nordrhein-Westfalen", 1950),
    ("Sachsen", 1993),
    ("Rheinland-Pfalz", 1984),
];

/// Years after the start year in which no report was published.
pub const NO_REPORTS: &[(&str, &[i32])] = &[
    ("Thüringen", &[2014]),
    ("Bund", &[1969]),
    ("Baden-Württemberg", &[1977]),
    (
        "Hessen",
        &[1991, 1992, 1993, 1994, 1995, 1996, 1997, 1998, 1999],
    ),
    ("Schleswig-Holstein", &[1986]),
];

/// Resolve a filename abbreviation to a jurisdiction name.
///
/// Matching is case-insensitive; unknown codes fall back to [`FEDERAL`].
pub fn jurisdiction_for_code(code: &str) -> &'static str {
    ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or(FEDERAL)
}

/// All jurisdictions in display order: the federal report first, the
/// regional ones sorted by name.
pub fn all_jurisdictions() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = ABBREVIATIONS.iter().map(|(_, name)| *name).collect();
    names.sort_unstable();
    let mut all = vec![FEDERAL];
    all.extend(names);
    all
}

/// Title-case a jurisdiction as it arrives from user input, so that
/// `bund` or `baden-württemberg` match the stored names.
pub fn normalize_jurisdiction(input: &str) -> String {
    input
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_lookup_is_case_insensitive() {
        assert_eq!(jurisdiction_for_code("bw"), "Baden-Württemberg");
        assert_eq!(jurisdiction_for_code("BW"), "Baden-Württemberg");
    }

    #[test]
    fn test_unknown_code_falls_back_to_federal() {
        assert_eq!(jurisdiction_for_code("xx"), FEDERAL);
        assert_eq!(jurisdiction_for_code(""), FEDERAL);
    }

    #[test]
    fn test_all_jurisdictions_order() {
        let all = all_jurisdictions();
        assert_eq!(all[0], "Bund");
        assert_eq!(all.len(), 17);
        let mut sorted = all[1..].to_vec();
        sorted.sort_unstable();
        assert_eq!(&all[1..], &sorted[..]);
    }

    #[test]
    fn test_normalize_jurisdiction() {
        assert_eq!(normalize_jurisdiction("bund"), "Bund");
        assert_eq!(
            normalize_jurisdiction("baden-württemberg"),
            "Baden-Württemberg"
        );
        assert_eq!(
            normalize_jurisdiction("Mecklenburg-vorpommern"),
            "Mecklenburg-Vorpommern"
        );
    }
}
