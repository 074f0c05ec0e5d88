//! Resolution of paired sub-fields (source/destination) into boolean clauses
//!
//! A mixed field carries two values, each with its own `=` / `!=` operator,
//! joined by a single `And` / `Or`. When both values are present the
//! `(primary, join, secondary)` signature selects one of eight clause shapes.
//! An OR between a positive and a negative match wraps each side in its own
//! bool sub-query before placing it under `should`.

use crate::search::error::{QueryError, QueryResult};
use crate::search::fields::is_blank;
use crate::search::query::{BoolQuery, Clause};
use serde_json::Value;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Per-side comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum MatchOperator {
    #[strum(serialize = "=")]
    Eq,
    #[strum(serialize = "!=")]
    Neq,
}

/// Logical join between the two sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum JoinOperator {
    And,
    Or,
}

/// Names of the two sub-fields making up a mixed field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixedPair {
    pub primary: &'static str,
    pub secondary: &'static str,
}

impl MixedPair {
    pub const fn new(primary: &'static str, secondary: &'static str) -> Self {
        Self { primary, secondary }
    }
}

/// The eight canonical shapes, keyed by `(primary, join, secondary)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixedShape {
    EqAndEq,
    NeqAndEq,
    EqAndNeq,
    NeqAndNeq,
    EqOrEq,
    EqOrNeq,
    NeqOrEq,
    NeqOrNeq,
}

impl MixedShape {
    pub fn from_signature(
        primary: MatchOperator,
        join: JoinOperator,
        secondary: MatchOperator,
    ) -> Self {
        use JoinOperator::*;
        use MatchOperator::*;

        match (primary, join, secondary) {
            (Eq, And, Eq) => MixedShape::EqAndEq,
            (Neq, And, Eq) => MixedShape::NeqAndEq,
            (Eq, And, Neq) => MixedShape::EqAndNeq,
            (Neq, And, Neq) => MixedShape::NeqAndNeq,
            (Eq, Or, Eq) => MixedShape::EqOrEq,
            (Eq, Or, Neq) => MixedShape::EqOrNeq,
            (Neq, Or, Eq) => MixedShape::NeqOrEq,
            (Neq, Or, Neq) => MixedShape::NeqOrNeq,
        }
    }
}

/// One side of a mixed field, already mapped to its engine field
#[derive(Debug, Clone, PartialEq)]
pub struct SideMatch {
    pub field: String,
    pub value: Value,
    pub operator: MatchOperator,
}

impl SideMatch {
    fn clause(&self) -> Clause {
        Clause::matching(self.field.clone(), self.value.clone())
    }
}

/// Outcome of resolving one mixed field
#[derive(Debug, Clone, PartialEq)]
pub enum MixedResolution {
    /// Both values blank
    Skip,
    /// Only one value present: its own operator applies, the join is dropped
    Single(SideMatch),
    /// Both values present
    Pair {
        shape: MixedShape,
        primary: SideMatch,
        secondary: SideMatch,
    },
}

impl MixedResolution {
    /// Emit the resolved clauses into `query`
    pub fn apply(self, query: &mut BoolQuery) {
        match self {
            MixedResolution::Skip => {}
            MixedResolution::Single(side) => match side.operator {
                MatchOperator::Eq => query.push_must(side.clause()),
                MatchOperator::Neq => query.push_must_not(side.clause()),
            },
            MixedResolution::Pair {
                shape,
                primary,
                secondary,
            } => {
                let (p, s) = (primary.clause(), secondary.clause());
                match shape {
                    MixedShape::EqAndEq => {
                        query.push_must(p);
                        query.push_must(s);
                    }
                    MixedShape::NeqAndEq => {
                        query.push_must_not(p);
                        query.push_must(s);
                    }
                    MixedShape::EqAndNeq => {
                        query.push_must_not(s);
                        query.push_must(p);
                    }
                    MixedShape::NeqAndNeq => {
                        query.push_must_not(p);
                        query.push_must_not(s);
                    }
                    MixedShape::EqOrEq => {
                        query.push_should(p);
                        query.push_should(s);
                    }
                    MixedShape::EqOrNeq => {
                        query.push_should(BoolQuery::new().must(p).into());
                        query.push_should(BoolQuery::new().must_not(s).into());
                    }
                    MixedShape::NeqOrEq => {
                        query.push_should(BoolQuery::new().must(s).into());
                        query.push_should(BoolQuery::new().must_not(p).into());
                    }
                    // One should entry negating both sides together. This is not
                    // the De Morgan form of "P != x OR S != y".
                    MixedShape::NeqOrNeq => {
                        query.push_should(BoolQuery::new().must_not(p).must_not(s).into());
                    }
                }
            }
        }
    }
}

/// Resolves a mixed field's raw sub-object, mapping sub-field names through `engine_field`
pub struct MixedFieldResolver<F> {
    engine_field: F,
}

impl<F> MixedFieldResolver<F>
where
    F: Fn(&str) -> String,
{
    pub fn new(engine_field: F) -> Self {
        Self { engine_field }
    }

    pub fn resolve(&self, field: &str, pair: &MixedPair, raw: &Value) -> QueryResult<MixedResolution> {
        let primary_value = raw.get(pair.primary);
        let secondary_value = raw.get(pair.secondary);

        match (is_blank(primary_value), is_blank(secondary_value)) {
            (true, true) => Ok(MixedResolution::Skip),
            (false, true) => Ok(MixedResolution::Single(self.side(field, pair.primary, raw)?)),
            (true, false) => Ok(MixedResolution::Single(self.side(field, pair.secondary, raw)?)),
            (false, false) => {
                let primary = self.side(field, pair.primary, raw)?;
                let secondary = self.side(field, pair.secondary, raw)?;
                let join: JoinOperator = parse_token(field, raw.get("join_option"), JoinOperator::And)?;
                Ok(MixedResolution::Pair {
                    shape: MixedShape::from_signature(primary.operator, join, secondary.operator),
                    primary,
                    secondary,
                })
            }
        }
    }

    fn side(&self, field: &str, sub_field: &str, raw: &Value) -> QueryResult<SideMatch> {
        let operator = parse_token(
            field,
            raw.get(format!("{}_option", sub_field).as_str()),
            MatchOperator::Eq,
        )?;

        Ok(SideMatch {
            field: (self.engine_field)(sub_field),
            value: raw.get(sub_field).cloned().unwrap_or(Value::Null),
            operator,
        })
    }
}

/// Absent or null tokens take the form's initial value
fn parse_token<T: FromStr>(field: &str, raw: Option<&Value>, default: T) -> QueryResult<T> {
    let invalid = |token: String| QueryError::InvalidOperator {
        field: field.to_string(),
        token,
    };

    match raw {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(token)) => token.trim().parse().map_err(|_| invalid(token.clone())),
        Some(other) => Err(invalid(other.to_string())),
    }
}
