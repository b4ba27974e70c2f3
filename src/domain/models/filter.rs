use std::ops::Not;

use bson::Bson;
use uuid::Uuid;

/// Ordered comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Gt => "$gt",
            Comparison::Gte => "$gte",
            Comparison::Lt => "$lt",
            Comparison::Lte => "$lte",
        }
    }
}

/// Declarative predicate over the fields of a document.
///
/// Field paths may be dotted (`"address.city"`) to reach nested documents.
/// Store adapters translate a filter into their native query form.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    Eq(String, Bson),
    Ne(String, Bson),
    Compare(String, Comparison, Bson),
    In(String, Vec<Bson>),
    Exists(String, bool),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn all() -> Self {
        Filter::All
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Compare(field.into(), Comparison::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Compare(field.into(), Comparison::Gte, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Compare(field.into(), Comparison::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Compare(field.into(), Comparison::Lte, value.into())
    }

    pub fn is_in<V>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Bson>,
    {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn exists(field: impl Into<String>, exists: bool) -> Self {
        Filter::Exists(field.into(), exists)
    }

    pub fn all_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn any_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Equality on an identifier field, compared in hyphenated string form.
    pub fn by_id(field: impl Into<String>, id: Uuid) -> Self {
        Filter::eq(field, id.hyphenated().to_string())
    }

    /// Conjunction with `other`. `All` is the identity element and nested
    /// conjunctions are flattened.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (left, right) => Filter::And(vec![left, right]),
        }
    }

    /// Disjunction with `other`. Nested disjunctions are flattened.
    pub fn or(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, _) | (_, Filter::All) => Filter::All,
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), f) => {
                left.push(f);
                Filter::Or(left)
            }
            (left, right) => Filter::Or(vec![left, right]),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }
}

impl Not for Filter {
    type Output = Filter;

    fn not(self) -> Self::Output {
        match self {
            Filter::Not(inner) => *inner,
            other => Filter::Not(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_with_all_is_identity() {
        let f = Filter::eq("name", "Zeus");
        assert_eq!(Filter::all().and(f.clone()), f);
        assert_eq!(f.clone().and(Filter::all()), f);
    }

    #[test]
    fn and_flattens_nested_conjunctions() {
        let f = Filter::eq("a", 1)
            .and(Filter::gt("b", 2))
            .and(Filter::lt("c", 3));

        match f {
            Filter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected conjunction, got {:?}", other),
        }
    }

    #[test]
    fn or_with_all_matches_everything() {
        assert!(Filter::eq("a", 1).or(Filter::all()).is_all());
    }

    #[test]
    fn double_negation_cancels() {
        let f = Filter::exists("price", true);
        assert_eq!(!!f.clone(), f);
    }

    #[test]
    fn by_id_compares_hyphenated_string() {
        let id = Uuid::new_v4();
        assert_eq!(
            Filter::by_id("_id", id),
            Filter::Eq("_id".to_string(), Bson::String(id.to_string()))
        );
    }
}
