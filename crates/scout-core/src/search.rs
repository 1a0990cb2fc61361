//! Compiles a search request (phrase + index scope + metadata filters +
//! ordering + ranking) into a ranked, ordered SQL query and executes it.

use crate::error::{Error, Result};
use crate::model::{Ranking, ScoredDocument};
use crate::schema::Pool;
use rusqlite::types::Value as SqlValue;
use rusqlite::ToSql;
use std::collections::BTreeMap;

/// Keys never treated as metadata filter input; stripped by the validator
/// before the filters map reaches `Engine::search`.
pub const PROTECTED_KEYS: &[&str] = &["page", "q", "key", "ranking", "identifier", "index", "ordering"];

/// One metadata filter: `key[__op]=value` or `key[__op]=v1,v2,...` (list
/// values are OR'd, same key, any matching value).
#[derive(Debug, Clone)]
pub struct Filter {
    pub key: String,
    pub op: FilterOp,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    In,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
}

impl FilterOp {
    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "eq" => FilterOp::Eq,
            "ne" => FilterOp::Ne,
            "ge" => FilterOp::Ge,
            "gt" => FilterOp::Gt,
            "le" => FilterOp::Le,
            "lt" => FilterOp::Lt,
            "in" => FilterOp::In,
            "contains" => FilterOp::Contains,
            "startswith" => FilterOp::StartsWith,
            "endswith" => FilterOp::EndsWith,
            "regex" => FilterOp::Regex,
            _ => return None,
        })
    }

    fn all_names_sorted() -> Vec<&'static str> {
        let mut names = vec![
            "contains",
            "endswith",
            "eq",
            "ge",
            "gt",
            "in",
            "le",
            "lt",
            "ne",
            "regex",
            "startswith",
        ];
        names.sort_unstable();
        names
    }
}

/// Splits a raw query-string key like `city__in` into `(key, op)`, defaulting
/// to `eq` when there is no `__` suffix. Returns `Validation` when a suffix
/// is present but not a recognized operator.
pub fn parse_filter_key(raw_key: &str) -> Result<(String, FilterOp)> {
    if let Some(idx) = raw_key.rfind("__") {
        let (key, op) = raw_key.split_at(idx);
        let op = &op[2..];
        match FilterOp::parse(op) {
            Some(parsed) => Ok((key.to_string(), parsed)),
            None => Err(Error::Validation(format!(
                "Unrecognized operation: {op}. Supported operations are:\n{}",
                FilterOp::all_names_sorted().join("\n")
            ))),
        }
    } else {
        Ok((raw_key.to_string(), FilterOp::Eq))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Score,
    Id,
    Identifier,
    Content,
}

impl SortKey {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "score" => Some(SortKey::Score),
            "id" => Some(SortKey::Id),
            "identifier" => Some(SortKey::Identifier),
            "content" => Some(SortKey::Content),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortKey::Score => "score",
            SortKey::Id => "rowid",
            SortKey::Identifier => "identifier",
            SortKey::Content => "content",
        }
    }
}

/// A single `ordering=` token: a recognized sort key plus direction.
#[derive(Debug, Clone, Copy)]
pub struct OrderTerm {
    pub key: SortKey,
    pub descending: bool,
}

/// Parses the `ordering` list, dropping unknown keys silently. Keys
/// prefixed with `-` sort descending.
fn parse_ordering(ordering: &[String], ranked: bool) -> Vec<OrderTerm> {
    let mut terms = Vec::new();
    for raw in ordering {
        let trimmed = raw.trim();
        let (descending, name) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if let Some(key) = SortKey::parse(name) {
            if key == SortKey::Score && !ranked {
                continue;
            }
            terms.push(OrderTerm { key, descending });
        }
    }
    terms
}

/// A fully-parsed search request, ready to compile to SQL.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub phrase: String,
    pub index_ids: Option<Vec<i64>>,
    pub ranking: Ranking,
    pub ordering: Vec<String>,
    pub filters: BTreeMap<String, Vec<String>>,
    pub star_all: bool,
}

pub struct SearchResults {
    pub documents: Vec<ScoredDocument>,
    pub filtered_count: i64,
}

pub struct Engine {
    pool: Pool,
}

impl Engine {
    pub fn new(pool: Pool) -> Self {
        Engine { pool }
    }

    pub fn search(&self, request: &SearchRequest, limit: i64, offset: i64) -> Result<SearchResults> {
        let phrase = request.phrase.trim();
        if phrase.is_empty() {
            return Err(Error::InvalidSearch("Must provide a search query.".into()));
        }

        let is_wildcard = phrase == "*";
        if is_wildcard && !request.star_all {
            return Err(Error::InvalidSearch(
                "Wildcard search is not enabled (STAR_ALL=false).".into(),
            ));
        }

        let ranking = if is_wildcard {
            Ranking::None
        } else {
            request.ranking
        };
        let ranked = ranking != Ranking::None;

        let mut filters = Vec::new();
        for (raw_key, values) in &request.filters {
            let (key, op) = parse_filter_key(raw_key)?;
            filters.push(Filter {
                key,
                op,
                values: values.clone(),
            });
        }

        let order_terms = parse_ordering(&request.ordering, ranked);

        let (select_sql, where_sql, mut params): (String, String, Vec<SqlValue>) =
            build_query(phrase, is_wildcard, &request.index_ids, &filters, ranking)?;

        let order_sql = build_order_by(&order_terms, ranked);

        let count_sql = format!(
            "SELECT COUNT(*) FROM main_document d {where_sql}",
            where_sql = where_sql
        );
        let conn = self.pool.get()?;
        let count_params: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
        let filtered_count: i64 =
            conn.query_row(&count_sql, count_params.as_slice(), |row| row.get(0))?;

        let full_sql = format!(
            "{select_sql} {where_sql} {order_sql} LIMIT ?{next} OFFSET ?{next_plus}",
            select_sql = select_sql,
            where_sql = where_sql,
            order_sql = order_sql,
            next = params.len() + 1,
            next_plus = params.len() + 2,
        );
        params.push(SqlValue::Integer(limit));
        params.push(SqlValue::Integer(offset));

        let mut stmt = conn.prepare(&full_sql)?;
        let all_params: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
        let documents = stmt
            .query_map(all_params.as_slice(), |row| {
                Ok(ScoredDocument {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    identifier: row.get(2)?,
                    score: if ranked { row.get(3).ok() } else { None },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(SearchResults {
            documents,
            filtered_count,
        })
    }
}

fn rank_expression(ranking: Ranking) -> &'static str {
    match ranking {
        // Content weighted 1.0, identifier weighted 0.0: ranking searches
        // the content column only.
        Ranking::Bm25 => "bm25(d, 1.0, 0.0)",
        Ranking::Simple => "rank",
        Ranking::None => "NULL",
    }
}

fn build_query(
    phrase: &str,
    is_wildcard: bool,
    index_ids: &Option<Vec<i64>>,
    filters: &[Filter],
    ranking: Ranking,
) -> Result<(String, String, Vec<SqlValue>)> {
    let ranked = ranking != Ranking::None;
    let select_sql = if ranked {
        format!(
            "SELECT d.rowid, d.content, d.identifier, {rank} AS score FROM main_document d",
            rank = rank_expression(ranking)
        )
    } else {
        "SELECT d.rowid, d.content, d.identifier FROM main_document d".to_string()
    };

    let mut conditions = Vec::new();
    let mut params: Vec<SqlValue> = Vec::new();

    if !is_wildcard {
        conditions.push("d MATCH ?".to_string());
        params.push(SqlValue::Text(phrase.to_string()));
    }

    if let Some(ids) = index_ids {
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        conditions.push(format!(
            "d.rowid IN (SELECT document_id FROM main_index_document WHERE index_id IN ({placeholders}))"
        ));
        for id in ids {
            params.push(SqlValue::Integer(*id));
        }
    }

    for filter in filters {
        let (clause, mut filter_params) = compile_filter(filter)?;
        conditions.push(clause);
        params.append(&mut filter_params);
    }

    let where_sql = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    Ok((select_sql, where_sql, params))
}

fn compile_filter(filter: &Filter) -> Result<(String, Vec<SqlValue>)> {
    let mut or_clauses = Vec::new();
    let mut params = Vec::new();

    for value in &filter.values {
        let (predicate, mut value_params) = op_predicate(filter.op, value)?;
        or_clauses.push(format!(
            "(m.key = ? AND {predicate})",
        ));
        params.push(SqlValue::Text(filter.key.clone()));
        params.append(&mut value_params);
    }

    let exists = format!(
        "EXISTS (SELECT 1 FROM main_metadata m WHERE m.document_id = d.rowid AND ({}))",
        or_clauses.join(" OR ")
    );
    Ok((exists, params))
}

fn op_predicate(op: FilterOp, value: &str) -> Result<(String, Vec<SqlValue>)> {
    Ok(match op {
        FilterOp::Eq => ("m.value = ?".to_string(), vec![SqlValue::Text(value.to_string())]),
        FilterOp::Ne => ("m.value != ?".to_string(), vec![SqlValue::Text(value.to_string())]),
        FilterOp::Ge => ("m.value >= ?".to_string(), vec![SqlValue::Text(value.to_string())]),
        FilterOp::Gt => ("m.value > ?".to_string(), vec![SqlValue::Text(value.to_string())]),
        FilterOp::Le => ("m.value <= ?".to_string(), vec![SqlValue::Text(value.to_string())]),
        FilterOp::Lt => ("m.value < ?".to_string(), vec![SqlValue::Text(value.to_string())]),
        FilterOp::In => {
            let items: Vec<&str> = value.split(',').map(|s| s.trim()).collect();
            let placeholders = items.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            (
                format!("m.value IN ({placeholders})"),
                items
                    .into_iter()
                    .map(|s| SqlValue::Text(s.to_string()))
                    .collect(),
            )
        }
        FilterOp::Contains => (
            "m.value LIKE ?".to_string(),
            vec![SqlValue::Text(format!("%{value}%"))],
        ),
        FilterOp::StartsWith => (
            "m.value LIKE ?".to_string(),
            vec![SqlValue::Text(format!("{value}%"))],
        ),
        FilterOp::EndsWith => (
            "m.value LIKE ?".to_string(),
            vec![SqlValue::Text(format!("%{value}"))],
        ),
        FilterOp::Regex => (
            "regexp(?, m.value)".to_string(),
            vec![SqlValue::Text(value.to_string())],
        ),
    })
}

fn build_order_by(terms: &[OrderTerm], ranked: bool) -> String {
    let mut accum: Vec<String> = terms
        .iter()
        .map(|t| {
            format!(
                "{} {}",
                t.key.column(),
                if t.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();

    if accum.is_empty() {
        accum.push(if ranked {
            "score ASC".to_string()
        } else {
            "rowid ASC".to_string()
        });
    }

    format!("ORDER BY {}", accum.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repository;
    use crate::schema::{open_pool, EngineConfig};
    use std::collections::BTreeMap as Map;
    use std::path::PathBuf;

    fn engine_and_repo() -> (Engine, Repository) {
        let pool = open_pool(&PathBuf::from(":memory:"), &EngineConfig::default()).unwrap();
        (Engine::new(pool.clone()), Repository::new(pool))
    }

    #[test]
    fn empty_phrase_is_invalid_search() {
        let (engine, _repo) = engine_and_repo();
        let req = SearchRequest {
            phrase: "   ".into(),
            index_ids: None,
            ranking: Ranking::Bm25,
            ordering: vec![],
            filters: Map::new(),
            star_all: true,
        };
        let err = engine.search(&req, 50, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidSearch(_)));
    }

    #[test]
    fn wildcard_without_star_all_is_invalid() {
        let (engine, _repo) = engine_and_repo();
        let req = SearchRequest {
            phrase: "*".into(),
            index_ids: None,
            ranking: Ranking::Bm25,
            ordering: vec![],
            filters: Map::new(),
            star_all: false,
        };
        assert!(engine.search(&req, 50, 0).is_err());
    }

    #[test]
    fn wildcard_with_metadata_filter_matches_by_metadata_only() {
        let (engine, repo) = engine_and_repo();
        let doc1 = repo.create_document("alpha", None).unwrap();
        let doc2 = repo.create_document("beta", None).unwrap();
        let mut m1 = Map::new();
        m1.insert("state".to_string(), "KS".to_string());
        repo.set_metadata(doc1.id, &m1).unwrap();
        let mut m2 = Map::new();
        m2.insert("state".to_string(), "MO".to_string());
        repo.set_metadata(doc2.id, &m2).unwrap();

        let mut filters = Map::new();
        filters.insert("state".to_string(), vec!["KS".to_string()]);
        let req = SearchRequest {
            phrase: "*".into(),
            index_ids: None,
            ranking: Ranking::Bm25,
            ordering: vec![],
            filters,
            star_all: true,
        };
        let results = engine.search(&req, 50, 0).unwrap();
        assert_eq!(results.documents.len(), 1);
        assert_eq!(results.documents[0].id, doc1.id);
    }

    #[test]
    fn unrecognized_filter_op_is_validation_error() {
        let (engine, _repo) = engine_and_repo();
        let mut filters = Map::new();
        filters.insert("city__bogus".to_string(), vec!["x".to_string()]);
        let req = SearchRequest {
            phrase: "*".into(),
            index_ids: None,
            ranking: Ranking::Bm25,
            ordering: vec![],
            filters,
            star_all: true,
        };
        let err = engine.search(&req, 50, 0).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn phrase_match_finds_content() {
        let (engine, repo) = engine_and_repo();
        repo.create_document("the quick brown fox", None).unwrap();
        repo.create_document("a lazy dog", None).unwrap();
        let req = SearchRequest {
            phrase: "fox".into(),
            index_ids: None,
            ranking: Ranking::Bm25,
            ordering: vec![],
            filters: Map::new(),
            star_all: true,
        };
        let results = engine.search(&req, 50, 0).unwrap();
        assert_eq!(results.documents.len(), 1);
        assert_eq!(results.documents[0].content, "the quick brown fox");
    }
}
