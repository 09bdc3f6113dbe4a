//! Rendering of composed record queries to parameterized SQL.
//!
//! Person tables are joined only when their name filter is present, each
//! under its own alias (`op`, `dir`, `scr`). Every user value is bound,
//! never spliced; the sort column comes from the composer's allowlist.

use reel_catalog::{RecordQuery, like_pattern};
use sqlx::{Postgres, QueryBuilder};

use crate::rows::RECORD_COLUMNS_QUALIFIED;

/// Person joins: alias, foreign-key column.
const JOINS: [(&str, &str); 3] = [
    ("op", "operator_id"),
    ("dir", "director_id"),
    ("scr", "screenwriter_id"),
];

struct Filters<'q> {
    qb: &'q mut QueryBuilder<'static, Postgres>,
    first: bool,
}

impl Filters<'_> {
    fn like(&mut self, column: &str, needle: Option<&String>) {
        let Some(needle) = needle else {
            return;
        };
        self.qb.push(if self.first { " WHERE " } else { " AND " });
        self.first = false;
        self.qb
            .push("LOWER(")
            .push(column)
            .push(") LIKE LOWER(")
            .push_bind(like_pattern(needle))
            .push(") ESCAPE '\\'");
    }
}

/// Build the `SELECT` for a composed record query.
pub fn record_query(query: &RecordQuery) -> QueryBuilder<'static, Postgres> {
    let filters = &query.filters;
    let person_filters = [
        filters.operator.as_ref(),
        filters.director.as_ref(),
        filters.screenwriter.as_ref(),
    ];

    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(RECORD_COLUMNS_QUALIFIED).push(" FROM records m");

    for ((alias, fk), needle) in JOINS.iter().zip(person_filters) {
        if needle.is_some() {
            qb.push(format!(" LEFT JOIN persons {alias} ON {alias}.id = m.{fk}"));
        }
    }

    let mut where_clause = Filters {
        qb: &mut qb,
        first: true,
    };
    where_clause.like("m.name", filters.name.as_ref());
    where_clause.like("m.genre", filters.genre.as_ref());
    where_clause.like("m.mpaa_rating", filters.mpaa.as_ref());
    for ((alias, _), needle) in JOINS.iter().zip(person_filters) {
        where_clause.like(&format!("{alias}.name"), needle);
    }

    qb.push(" ORDER BY m.")
        .push(query.sort.column())
        .push(" ")
        .push(query.direction.keyword())
        .push(", m.id ASC");

    if let Some(window) = query.window {
        qb.push(" LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);
    }

    qb
}
