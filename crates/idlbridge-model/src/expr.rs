use serde::Deserialize;
use serde_json::Value;

/// A compile-time constant expression.
///
/// Expressions are immutable trees. Nodes that could not be understood when
/// the library was loaded are kept as [`Expr::Invalid`] so that a single bad
/// constant does not prevent the rest of the library from loading.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawExpr")]
pub enum Expr {
    /// Wide enough for every `int64` and `uint64` value.
    IntLiteral(i128),
    BooleanLiteral(bool),
    /// A reference to `interface.name`, resolved by name only.
    Constant { interface: String, name: String },
    Negate(Box<Expr>),
    /// Bitwise OR of two or more operands, folded left to right.
    BitwiseOr(Vec<Expr>),
    /// A node with an unrecognized tag or malformed operands.
    Invalid { tag: String, reason: String },
}

impl Expr {
    pub fn int(value: impl Into<i128>) -> Self {
        Expr::IntLiteral(value.into())
    }

    pub fn boolean(value: bool) -> Self {
        Expr::BooleanLiteral(value)
    }

    pub fn constant(interface: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Constant {
            interface: interface.into(),
            name: name.into(),
        }
    }

    pub fn negate(operand: Expr) -> Self {
        Expr::Negate(Box::new(operand))
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Expr::BitwiseOr(vec![lhs, rhs])
    }

    /// The tag this node carries in the library document.
    pub fn tag(&self) -> &str {
        match self {
            Expr::IntLiteral(_) => "int-literal",
            Expr::BooleanLiteral(_) => "boolean-literal",
            Expr::Constant { .. } => "constant",
            Expr::Negate(_) => "-",
            Expr::BitwiseOr(_) => "|",
            Expr::Invalid { tag, .. } => tag,
        }
    }
}

/// The document shape of an expression node, before validation.
#[derive(Debug, Deserialize)]
struct RawExpr {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    interface: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    args: Vec<RawExpr>,
}

impl From<RawExpr> for Expr {
    fn from(raw: RawExpr) -> Self {
        let invalid = |reason: String| Expr::Invalid {
            tag: raw.tag.clone(),
            reason,
        };

        match raw.tag.as_str() {
            "int-literal" => match raw.value.as_ref().and_then(int_value) {
                Some(value) => Expr::IntLiteral(value),
                None => invalid("expected an integer `value`".to_string()),
            },
            "boolean-literal" => match raw.value.as_ref().and_then(Value::as_bool) {
                Some(value) => Expr::BooleanLiteral(value),
                None => invalid("expected a boolean `value`".to_string()),
            },
            "constant" => match (&raw.interface, &raw.name) {
                (Some(interface), Some(name)) => Expr::constant(interface.as_str(), name.as_str()),
                _ => invalid("expected `interface` and `name`".to_string()),
            },
            "-" => {
                let found = raw.args.len();
                let mut args = raw.args.into_iter();
                match (args.next(), args.next()) {
                    (Some(operand), None) => Expr::negate(operand.into()),
                    _ => invalid(format!("expected 1 operand, found {found}")),
                }
            }
            "|" => {
                if raw.args.len() < 2 {
                    return invalid(format!(
                        "expected at least 2 operands, found {}",
                        raw.args.len()
                    ));
                }
                Expr::BitwiseOr(raw.args.into_iter().map(Expr::from).collect())
            }
            _ => invalid("unrecognized expression tag".to_string()),
        }
    }
}

/// Integer payloads may use the full `uint64` range.
fn int_value(value: &Value) -> Option<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Expr {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_nested_tree() {
        let expr = parse(
            r#"{ "type": "|", "args": [
                { "type": "constant", "interface": "Status", "name": "STATE_ERRORS" },
                { "type": "-", "args": [ { "type": "int-literal", "value": 5 } ] }
            ] }"#,
        );
        assert_eq!(
            expr,
            Expr::or(
                Expr::constant("Status", "STATE_ERRORS"),
                Expr::negate(Expr::int(5))
            )
        );
    }

    #[test]
    fn keeps_n_ary_or() {
        let expr = parse(
            r#"{ "type": "|", "args": [
                { "type": "int-literal", "value": 1 },
                { "type": "int-literal", "value": 2 },
                { "type": "int-literal", "value": 4 }
            ] }"#,
        );
        assert_eq!(
            expr,
            Expr::BitwiseOr(vec![Expr::int(1), Expr::int(2), Expr::int(4)])
        );
    }

    #[test]
    fn unknown_tag_loads_as_invalid() {
        let expr = parse(r#"{ "type": "<<", "args": [] }"#);
        assert_eq!(expr.tag(), "<<");
        assert!(matches!(expr, Expr::Invalid { .. }));
    }

    #[test]
    fn wrong_arity_loads_as_invalid() {
        let expr = parse(r#"{ "type": "-", "args": [] }"#);
        assert_eq!(
            expr,
            Expr::Invalid {
                tag: "-".to_string(),
                reason: "expected 1 operand, found 0".to_string()
            }
        );

        let expr = parse(r#"{ "type": "|", "args": [ { "type": "int-literal", "value": 1 } ] }"#);
        assert!(matches!(expr, Expr::Invalid { ref tag, .. } if tag == "|"));
    }

    #[test]
    fn int_literals_cover_the_uint64_range() {
        let expr = parse(r#"{ "type": "int-literal", "value": 18446744073709551615 }"#);
        assert_eq!(expr, Expr::int(u64::MAX));

        let expr = parse(r#"{ "type": "int-literal", "value": -9223372036854775808 }"#);
        assert_eq!(expr, Expr::int(i64::MIN));

        let expr = parse(r#"{ "type": "int-literal", "value": 1.5 }"#);
        assert!(matches!(expr, Expr::Invalid { .. }));
    }

    #[test]
    fn negation_takes_exactly_one_operand() {
        let expr = parse(
            r#"{ "type": "-", "args": [
                { "type": "int-literal", "value": 1 },
                { "type": "int-literal", "value": 2 }
            ] }"#,
        );
        assert_eq!(
            expr,
            Expr::Invalid {
                tag: "-".to_string(),
                reason: "expected 1 operand, found 2".to_string()
            }
        );
    }

    #[test]
    fn literal_without_value_is_invalid() {
        let expr = parse(r#"{ "type": "boolean-literal", "value": 1 }"#);
        assert!(matches!(expr, Expr::Invalid { .. }));
    }
}
