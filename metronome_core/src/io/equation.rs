//! Parsing of reaction equation strings such as `2 C00001 + C00002 <=> C00003`
use indexmap::IndexMap;
use regex::Regex;

/// Split an equation into its left and right hand sides at the first direction marker
///
/// # Returns
/// `None` if the marker doesn't occur in the equation
pub fn split_sides<'e>(equation: &'e str, marker: &str) -> Option<(&'e str, &'e str)> {
    equation.split_once(marker)
}

/// Metabolite ids matching `pattern` on one side of an equation, in order of appearance
pub fn metabolite_ids(side: &str, pattern: &Regex) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for found in pattern.find_iter(side) {
        let id = found.as_str().to_string();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Stoichiometric coefficients of the given metabolites
///
/// The equation is stripped of whitespace, and the coefficient of a metabolite is the single
/// digit directly in front of its first occurrence; anything else (or no character at all)
/// means a coefficient of 1. Coefficients of 10 or more can't be represented this way, `12 A`
/// reads as 2. A metabolite on both sides (`1 A@in = 2 A@out`) gets the coefficient of its
/// first occurrence, the substrate one.
///
/// # Examples
/// ```rust
/// use metronome_core::io::equation::stoichiometry;
/// let ids = vec!["C00001".to_string(), "C00002".to_string(), "C00003".to_string()];
/// let coefficients = stoichiometry("2 C00001 + C00002 <=> C00003", &ids);
/// assert_eq!(coefficients["C00001"], 2);
/// assert_eq!(coefficients["C00002"], 1);
/// assert_eq!(coefficients["C00003"], 1);
/// ```
pub fn stoichiometry(equation: &str, metabolite_ids: &[String]) -> IndexMap<String, u32> {
    let compact: String = equation.chars().filter(|c| !c.is_whitespace()).collect();
    let mut coefficients = IndexMap::new();
    for id in metabolite_ids {
        let coefficient = find_token(&compact, id)
            .and_then(|index| compact[..index].chars().next_back())
            .and_then(|c| c.to_digit(10))
            .filter(|digit| *digit > 0)
            .unwrap_or(1);
        coefficients.insert(id.clone(), coefficient);
    }
    coefficients
}

/// Position of the first occurrence of `id` that isn't the prefix of a longer id
/// (so `MNXM1` is not found inside `MNXM10`)
fn find_token(compact: &str, id: &str) -> Option<usize> {
    compact
        .match_indices(id)
        .map(|(index, _)| index)
        .find(|index| {
            !compact[index + id.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;

    static KEGG_COMPOUND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[CG]\d{5}").unwrap());
    static MNX_METABOLITE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"MNXM[0-9]+").unwrap());

    #[test]
    fn kegg_equation() {
        let equation = "2 C00001 + C00002 <=> C00003";
        let (left, right) = split_sides(equation, "<=>").unwrap();
        let substrates = metabolite_ids(left, &KEGG_COMPOUND);
        let products = metabolite_ids(right, &KEGG_COMPOUND);
        assert_eq!(substrates, vec!["C00001", "C00002"]);
        assert_eq!(products, vec!["C00003"]);
        let ids: Vec<String> = substrates.into_iter().chain(products).collect();
        let coefficients = stoichiometry(equation, &ids);
        assert_eq!(
            coefficients,
            IndexMap::from([
                ("C00001".to_string(), 2),
                ("C00002".to_string(), 1),
                ("C00003".to_string(), 1),
            ])
        );
    }

    #[test]
    fn metanetx_equation() {
        let equation = "1 MNXM10@MNXD1 + 2 MNXM1@MNXD1 = 1 MNXM8@MNXD1";
        let (left, right) = split_sides(equation, "=").unwrap();
        assert_eq!(metabolite_ids(left, &MNX_METABOLITE), vec!["MNXM10", "MNXM1"]);
        assert_eq!(metabolite_ids(right, &MNX_METABOLITE), vec!["MNXM8"]);
        let ids = vec!["MNXM10".to_string(), "MNXM1".to_string(), "MNXM8".to_string()];
        let coefficients = stoichiometry(equation, &ids);
        assert_eq!(coefficients["MNXM10"], 1);
        assert_eq!(coefficients["MNXM1"], 2);
        assert_eq!(coefficients["MNXM8"], 1);
    }

    #[test]
    fn single_digit_limitation() {
        let ids = vec!["C00001".to_string()];
        assert_eq!(stoichiometry("12 C00001 <=> C00002", &ids)["C00001"], 2);
        assert_eq!(stoichiometry("C00001 <=> C00002", &ids)["C00001"], 1);
        assert_eq!(stoichiometry("n C00001 <=> C00002", &ids)["C00001"], 1);

        // Transport across compartments: only the substrate coefficient is kept
        let ids = vec!["MNXM1".to_string()];
        assert_eq!(stoichiometry("1 MNXM1@MNXD1 = 2 MNXM1@MNXD2", &ids)["MNXM1"], 1);
    }

    #[test]
    fn missing_marker() {
        assert_eq!(split_sides("C00001 + C00002", "<=>"), None);
    }
}
