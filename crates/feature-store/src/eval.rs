//! Filter evaluation against a single feature.
//!
//! Spatial predicates only apply to the layer's geometry property; naming
//! any other property, or testing a feature without geometry, never
//! matches. Attribute comparisons are typed: numbers compare numerically,
//! strings lexically and booleans by equality. A string compared with a
//! number is read as a number when it parses as one. A null or missing
//! operand makes every comparison false; only `IS NULL` observes it.

use std::borrow::Cow;
use std::cmp::Ordering;

use geo::Intersects;
use gsr_protocol::{ComparisonOp, Envelope, Expression, Filter, Literal};
use serde_json::Value;

use crate::feature::Feature;

/// Whether `feature` satisfies `filter`.
pub fn matches(filter: &Filter, feature: &Feature, geometry_property: &str) -> bool {
    match filter {
        Filter::Include => true,
        Filter::Exclude => false,
        Filter::BBox {
            property,
            min_x,
            min_y,
            max_x,
            max_y,
            ..
        } => {
            if property != geometry_property {
                return false;
            }
            let rect = Envelope::from_bounds(*min_x, *min_y, *max_x, *max_y).to_rect();
            feature
                .geometry
                .as_ref()
                .map_or(false, |g| g.intersects(&rect))
        }
        Filter::Intersects { property, geometry } => {
            if property != geometry_property {
                return false;
            }
            feature
                .geometry
                .as_ref()
                .map_or(false, |g| g.intersects(geometry))
        }
        Filter::Compare { left, op, right } => {
            let ordering = compare(&resolve(left, feature), &resolve(right, feature));
            match (op, ordering) {
                (_, None) => false,
                (ComparisonOp::Eq, Some(o)) => o == Ordering::Equal,
                (ComparisonOp::NotEq, Some(o)) => o != Ordering::Equal,
                (ComparisonOp::Lt, Some(o)) => o == Ordering::Less,
                (ComparisonOp::LtEq, Some(o)) => o != Ordering::Greater,
                (ComparisonOp::Gt, Some(o)) => o == Ordering::Greater,
                (ComparisonOp::GtEq, Some(o)) => o != Ordering::Less,
            }
        }
        Filter::Like {
            expr,
            pattern,
            case_insensitive,
        } => match resolve(expr, feature).as_text() {
            Some(text) if *case_insensitive => {
                like(&text.to_lowercase(), &pattern.to_lowercase())
            }
            Some(text) => like(&text, pattern),
            None => false,
        },
        Filter::IsNull(expr) => matches!(resolve(expr, feature), Operand::Null),
        Filter::Between { expr, lower, upper } => {
            let value = resolve(expr, feature);
            let above = compare(&value, &resolve(lower, feature));
            let below = compare(&value, &resolve(upper, feature));
            matches!(above, Some(Ordering::Greater | Ordering::Equal))
                && matches!(below, Some(Ordering::Less | Ordering::Equal))
        }
        Filter::In { expr, values } => {
            let value = resolve(expr, feature);
            values
                .iter()
                .any(|candidate| compare(&value, &resolve(candidate, feature)) == Some(Ordering::Equal))
        }
        Filter::And(children) => children
            .iter()
            .all(|child| matches(child, feature, geometry_property)),
        Filter::Or(children) => children
            .iter()
            .any(|child| matches(child, feature, geometry_property)),
        Filter::Not(inner) => !matches(inner, feature, geometry_property),
    }
}

/// A resolved comparison operand.
#[derive(Debug, Clone, PartialEq)]
enum Operand<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Text(Cow<'a, str>),
    /// Arrays and objects; never comparable.
    Other,
}

impl Operand<'_> {
    fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Operand::Text(s) => Some(Cow::Borrowed(s.as_ref())),
            Operand::Number(n) => Some(Cow::Owned(n.to_string())),
            Operand::Bool(b) => Some(Cow::Owned(b.to_string())),
            Operand::Null | Operand::Other => None,
        }
    }
}

fn resolve<'a>(expr: &'a Expression, feature: &'a Feature) -> Operand<'a> {
    match expr {
        Expression::Property(name) => match feature.attribute(name) {
            None | Some(Value::Null) => Operand::Null,
            Some(Value::Bool(b)) => Operand::Bool(*b),
            Some(Value::Number(n)) => n.as_f64().map_or(Operand::Other, Operand::Number),
            Some(Value::String(s)) => Operand::Text(Cow::Borrowed(s)),
            Some(_) => Operand::Other,
        },
        Expression::Literal(Literal::Bool(b)) => Operand::Bool(*b),
        Expression::Literal(Literal::Number(n)) => Operand::Number(*n),
        Expression::Literal(Literal::String(s)) => Operand::Text(Cow::Borrowed(s)),
    }
}

fn compare(left: &Operand<'_>, right: &Operand<'_>) -> Option<Ordering> {
    match (left, right) {
        (Operand::Number(a), Operand::Number(b)) => a.partial_cmp(b),
        (Operand::Text(a), Operand::Text(b)) => Some(a.as_ref().cmp(b.as_ref())),
        (Operand::Bool(a), Operand::Bool(b)) => Some(a.cmp(b)),
        (Operand::Number(a), Operand::Text(b)) => {
            let b: f64 = b.trim().parse().ok()?;
            a.partial_cmp(&b)
        }
        (Operand::Text(a), Operand::Number(b)) => {
            let a: f64 = a.trim().parse().ok()?;
            a.partial_cmp(b)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PatternToken {
    AnyRun,
    AnyOne,
    Char(char),
}

fn compile_pattern(pattern: &str) -> Vec<PatternToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '%' => PatternToken::AnyRun,
            '_' => PatternToken::AnyOne,
            '\\' => PatternToken::Char(chars.next().unwrap_or('\\')),
            c => PatternToken::Char(c),
        };
        tokens.push(token);
    }
    tokens
}

/// SQL-style wildcard match: `%` any run, `_` exactly one character,
/// `\` escapes the next character.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = compile_pattern(pattern);

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(PatternToken::AnyRun) => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(PatternToken::AnyOne) => {
                t += 1;
                p += 1;
            }
            Some(PatternToken::Char(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p.min(pattern.len())..]
        .iter()
        .all(|token| *token == PatternToken::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_wildcards() {
        assert!(like("New York", "New%"));
        assert!(like("New York", "%York"));
        assert!(like("New York", "N_w York"));
        assert!(like("New York", "%"));
        assert!(like("", "%"));
        assert!(!like("New York", "New"));
        assert!(!like("Newark", "New_York"));
        assert!(like("abcabc", "%abc"));
        assert!(like("a%b", "a\\%b"));
        assert!(!like("axb", "a\\%b"));
    }

    #[test]
    fn test_compare_mixed_number_and_text() {
        assert_eq!(
            compare(&Operand::Number(10.0), &Operand::Text(Cow::Borrowed("10"))),
            Some(Ordering::Equal)
        );
        assert_eq!(
            compare(&Operand::Number(10.0), &Operand::Text(Cow::Borrowed("ten"))),
            None
        );
    }

    #[test]
    fn test_compare_null_is_incomparable() {
        assert_eq!(compare(&Operand::Null, &Operand::Number(1.0)), None);
        assert_eq!(compare(&Operand::Null, &Operand::Null), None);
    }
}
