//! Constant expression rendering.
//!
//! Expressions are re-emitted as source text rather than folded, so that
//! references to other interfaces' constants stay symbolic and are resolved
//! by whatever consumes the generated declarations.

use idlbridge_model::{Expr, ModelError, ModelResult};

/// Renders `expr` as an expression in a C-like target language.
///
/// Unary negation and every pairwise OR are parenthesized; a negative
/// operand of a negation gets its own parentheses. OR with more than
/// two operands folds left to right, so `a | b | c` renders as
/// `((a | b) | c)`. Constant references render as `Interface.NAME` without
/// checking that the constant exists.
pub fn render_expr(expr: &Expr) -> ModelResult<String> {
    match expr {
        Expr::IntLiteral(value) => Ok(value.to_string()),
        Expr::BooleanLiteral(value) => Ok(value.to_string()),
        Expr::Constant { interface, name } => Ok(format!("{interface}.{name}")),
        Expr::Negate(operand) => {
            let operand = render_expr(operand)?;
            // `--` would read as a decrement.
            if operand.starts_with('-') {
                Ok(format!("(-({operand}))"))
            } else {
                Ok(format!("(-{operand})"))
            }
        }
        Expr::BitwiseOr(operands) => {
            let mut iter = operands.iter();
            let (Some(first), Some(_)) = (iter.next(), operands.get(1)) else {
                return Err(ModelError::MalformedExpression {
                    tag: expr.tag().to_string(),
                    reason: format!("expected at least 2 operands, found {}", operands.len()),
                });
            };
            let mut rendered = render_expr(first)?;
            for operand in iter {
                rendered = format!("({rendered} | {})", render_expr(operand)?);
            }
            Ok(rendered)
        }
        Expr::Invalid { tag, reason } => Err(ModelError::MalformedExpression {
            tag: tag.clone(),
            reason: reason.clone(),
        }),
    }
}
