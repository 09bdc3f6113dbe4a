//! Query composer for record listings.
//!
//! [`compose_record_query`] turns loosely-typed list parameters into a
//! [`RecordQuery`]: a set of optional substring filters, an allowlisted sort
//! column with a direction, and an optional page window. Stores render the
//! query themselves (SQL in `reel-db`, in-process in
//! [`MemoryStore`](crate::memory::MemoryStore)).
//!
//! Rules:
//!
//! - filters are case-insensitive substring matches, combined with AND;
//!   blank values are ignored and `%` / `_` match literally
//! - unknown or absent sort fields fall back to the creation timestamp
//! - the direction is ascending only for a case-insensitive `"asc"`
//! - pagination applies only when `page >= 0` and `size > 0`
//! - ties are broken by ascending identity so pages are stable

use serde::Deserialize;

/// Raw list parameters as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Zero-based page index.
    pub page: Option<i64>,
    /// Page size.
    pub size: Option<i64>,
    /// Sort field name (camelCase or `snake_case`).
    pub sort_by: Option<String>,
    /// `"asc"` or anything else for descending.
    pub sort_order: Option<String>,
    /// Record name substring.
    pub name: Option<String>,
    /// Genre text substring.
    pub genre: Option<String>,
    /// Rating text substring.
    pub mpaa: Option<String>,
    /// Operator name substring.
    pub operator: Option<String>,
    /// Director name substring.
    pub director: Option<String>,
    /// Screenwriter name substring.
    pub screenwriter: Option<String>,
}

/// Sortable record columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    /// Identity.
    Id,
    /// Name.
    Name,
    /// Creation timestamp (the fallback).
    #[default]
    CreationDate,
    /// Oscar count.
    OscarsCount,
    /// Budget.
    Budget,
    /// Total box office.
    TotalBoxOffice,
    /// Length.
    Length,
    /// Golden palm count.
    GoldenPalmCount,
    /// Rating text.
    MpaaRating,
    /// Genre text.
    Genre,
}

impl SortField {
    /// Resolve a client-supplied field name. Accepts camelCase and
    /// `snake_case` spellings in any letter case.
    pub fn parse(raw: &str) -> Option<Self> {
        let folded: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match folded.as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "creationdate" => Some(Self::CreationDate),
            "oscarscount" => Some(Self::OscarsCount),
            "budget" => Some(Self::Budget),
            "totalboxoffice" => Some(Self::TotalBoxOffice),
            "length" => Some(Self::Length),
            "goldenpalmcount" => Some(Self::GoldenPalmCount),
            "mpaarating" => Some(Self::MpaaRating),
            "genre" => Some(Self::Genre),
            _ => None,
        }
    }

    /// Column name in the `records` table.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::CreationDate => "creation_date",
            Self::OscarsCount => "oscars_count",
            Self::Budget => "budget",
            Self::TotalBoxOffice => "total_box_office",
            Self::Length => "length",
            Self::GoldenPalmCount => "golden_palm_count",
            Self::MpaaRating => "mpaa_rating",
            Self::Genre => "genre",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortDirection {
    /// `Asc` for a case-insensitive `"asc"`, `Desc` otherwise.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(text) if text.trim().eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    /// SQL keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Rows to skip and rows to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Rows to skip.
    pub offset: i64,
    /// Maximum rows to return.
    pub limit: i64,
}

/// Non-blank substring filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilters {
    /// Record name.
    pub name: Option<String>,
    /// Genre text.
    pub genre: Option<String>,
    /// Rating text.
    pub mpaa: Option<String>,
    /// Operator name.
    pub operator: Option<String>,
    /// Director name.
    pub director: Option<String>,
    /// Screenwriter name.
    pub screenwriter: Option<String>,
}

impl RecordFilters {
    /// Whether any filter is set.
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.genre.is_none()
            && self.mpaa.is_none()
            && self.operator.is_none()
            && self.director.is_none()
            && self.screenwriter.is_none()
    }
}

/// A composed record listing query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// Filters, AND-combined.
    pub filters: RecordFilters,
    /// Primary sort column.
    pub sort: SortField,
    /// Direction of the primary sort.
    pub direction: SortDirection,
    /// Page window, when paginating.
    pub window: Option<PageWindow>,
}

/// Compose a record query from raw list parameters.
pub fn compose_record_query(params: &ListParams) -> RecordQuery {
    let filters = RecordFilters {
        name: non_blank(params.name.as_deref()),
        genre: non_blank(params.genre.as_deref()),
        mpaa: non_blank(params.mpaa.as_deref()),
        operator: non_blank(params.operator.as_deref()),
        director: non_blank(params.director.as_deref()),
        screenwriter: non_blank(params.screenwriter.as_deref()),
    };

    let sort = params
        .sort_by
        .as_deref()
        .and_then(SortField::parse)
        .unwrap_or_default();

    let window = match (params.page, params.size) {
        (Some(page), Some(size)) if page >= 0 && size > 0 => Some(PageWindow {
            offset: page.saturating_mul(size),
            limit: size,
        }),
        _ => None,
    };

    RecordQuery {
        filters,
        sort,
        direction: SortDirection::parse(params.sort_order.as_deref()),
        window,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(str::to_owned)
}

/// Build a `LIKE` pattern that matches `needle` as a literal substring.
///
/// Backslash is the escape character; `%`, `_` and `\` in the needle are
/// escaped. Use with `ESCAPE '\'`.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len().saturating_add(2));
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive literal substring test used for in-process filtering.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_creation_date_descending_without_window() {
        let query = compose_record_query(&ListParams::default());
        assert_eq!(query.sort, SortField::CreationDate);
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(query.window, None);
        assert!(query.filters.is_empty());
    }

    #[test]
    fn sort_field_accepts_both_spellings() {
        assert_eq!(SortField::parse("oscarsCount"), Some(SortField::OscarsCount));
        assert_eq!(SortField::parse("oscars_count"), Some(SortField::OscarsCount));
        assert_eq!(SortField::parse("GOLDEN_PALM_COUNT"), Some(SortField::GoldenPalmCount));
        assert_eq!(SortField::parse("name; DROP TABLE records"), None);
    }

    #[test]
    fn unknown_sort_field_falls_back() {
        let query = compose_record_query(&ListParams {
            sort_by: Some(String::from("popularity")),
            sort_order: Some(String::from("ASC")),
            ..ListParams::default()
        });
        assert_eq!(query.sort, SortField::CreationDate);
        assert_eq!(query.direction, SortDirection::Asc);
    }

    #[test]
    fn window_requires_valid_page_and_size() {
        let paged = |page, size| {
            compose_record_query(&ListParams {
                page,
                size,
                ..ListParams::default()
            })
            .window
        };

        assert_eq!(paged(Some(1), Some(10)), Some(PageWindow { offset: 10, limit: 10 }));
        assert_eq!(paged(Some(-1), Some(10)), None);
        assert_eq!(paged(Some(0), Some(0)), None);
        assert_eq!(paged(None, Some(10)), None);
        assert_eq!(
            paged(Some(i64::MAX), Some(2)),
            Some(PageWindow { offset: i64::MAX, limit: 2 })
        );
    }

    #[test]
    fn blank_filters_are_absent() {
        let query = compose_record_query(&ListParams {
            name: Some(String::from("   ")),
            director: Some(String::from("Mann")),
            ..ListParams::default()
        });
        assert_eq!(query.filters.name, None);
        assert_eq!(query.filters.director.as_deref(), Some("Mann"));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn substring_match_ignores_case() {
        assert!(contains_ignore_case("Michael Mann", "mANN"));
        assert!(!contains_ignore_case("Heat", "50%"));
    }
}
