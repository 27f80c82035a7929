//! Font face resolution policy.
//!
//! Selection rules live here, not in outline extraction:
//! - Named families are tried in the order given.
//! - Generic names (`serif`, `sans-serif`/`sans`, `monospace`/`mono`) map to fontdb's
//!   generic families.
//! - The final fallbacks (serif, then "any face") are applied by `FontSystem::resolve`.

use fontdb::Family;

use crate::font::FontQuery;

/// Translate the family list of a query into fontdb families, preserving order.
///
/// Empty and whitespace-only names are dropped.
pub fn query_families(query: &FontQuery) -> Vec<Family<'_>> {
    let mut families = Vec::with_capacity(query.families.len());
    for f in &query.families {
        let s = f.trim();
        if s.eq_ignore_ascii_case("serif") {
            families.push(Family::Serif);
        } else if s.eq_ignore_ascii_case("sans-serif") || s.eq_ignore_ascii_case("sans") {
            families.push(Family::SansSerif);
        } else if s.eq_ignore_ascii_case("monospace") || s.eq_ignore_ascii_case("mono") {
            families.push(Family::Monospace);
        } else if !s.is_empty() {
            families.push(Family::Name(s));
        }
    }
    families
}

/// Default query for ring lettering: a plain sans face, regular weight.
pub fn default_ring_query() -> FontQuery {
    FontQuery {
        families: vec![
            "Helvetica".to_string(),
            "Arial".to_string(),
            "Liberation Sans".to_string(),
            "DejaVu Sans".to_string(),
            "sans-serif".to_string(),
        ],
        weight: 400,
        italic: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_names_map_to_generic_families() {
        let q = FontQuery {
            families: vec![
                " Sans ".to_string(),
                "".to_string(),
                "MONO".to_string(),
                "Noto Serif".to_string(),
                "serif".to_string(),
            ],
            weight: 400,
            italic: false,
        };
        let fams = query_families(&q);
        assert_eq!(
            fams,
            vec![
                Family::SansSerif,
                Family::Monospace,
                Family::Name("Noto Serif"),
                Family::Serif,
            ]
        );
    }

    #[test]
    fn test_default_query_ends_with_generic() {
        let q = default_ring_query();
        assert_eq!(q.families.last().map(String::as_str), Some("sans-serif"));
        assert_eq!(q.weight, 400);
    }
}
