//! nom parser for the condition grammar.
//!
//! Produces the module's [`Expr`] AST. Precedence, loosest first:
//! `||`, `&&`, `!`, comparison, primary.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_till};
use nom::character::complete::{alpha1, alphanumeric1, char, digit1, multispace0};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value};
use nom::error::VerboseError;
use nom::multi::{fold_many0, many0};
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;

use super::{BinaryOp, Expr, Literal};

type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Wrap a parser in optional surrounding whitespace.
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse a complete condition expression.
pub(super) fn parse(input: &str) -> Result<Expr, String> {
    match all_consuming(delimited(multispace0, expr, multispace0))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(nom::error::convert_error(input, e))
        }
        Err(nom::Err::Incomplete(_)) => Err("incomplete input".to_string()),
    }
}

fn expr(input: &str) -> PResult<'_, Expr> {
    or_expr(input)
}

fn or_expr(input: &str) -> PResult<'_, Expr> {
    let (input, init) = and_expr(input)?;
    fold_many0(
        preceded(ws(tag("||")), and_expr),
        move || init.clone(),
        |left, right| Expr::binary(BinaryOp::Or, left, right),
    )(input)
}

fn and_expr(input: &str) -> PResult<'_, Expr> {
    let (input, init) = unary(input)?;
    fold_many0(
        preceded(ws(tag("&&")), unary),
        move || init.clone(),
        |left, right| Expr::binary(BinaryOp::And, left, right),
    )(input)
}

fn unary(input: &str) -> PResult<'_, Expr> {
    alt((
        map(preceded(ws(char('!')), unary), |inner| {
            Expr::Not(Box::new(inner))
        }),
        comparison,
    ))(input)
}

fn comparison(input: &str) -> PResult<'_, Expr> {
    let (input, left) = operand(input)?;
    let (input, rest) = opt(pair(ws(cmp_op), operand))(input)?;
    match rest {
        Some((op, right)) => Ok((input, Expr::binary(op, left, right))),
        None => Ok((input, left)),
    }
}

fn cmp_op(input: &str) -> PResult<'_, BinaryOp> {
    alt((
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
    ))(input)
}

fn operand(input: &str) -> PResult<'_, Expr> {
    preceded(
        multispace0,
        alt((
            delimited(
                char('('),
                delimited(multispace0, expr, multispace0),
                char(')'),
            ),
            map(string_literal, |s| Expr::Literal(Literal::String(s))),
            map(number, |n| Expr::Literal(Literal::Number(n))),
            ident_expr,
        )),
    )(input)
}

fn string_literal(input: &str) -> PResult<'_, String> {
    alt((
        map(
            delimited(char('"'), take_till(|c| c == '"'), char('"')),
            str::to_string,
        ),
        map(
            delimited(char('\''), take_till(|c| c == '\''), char('\'')),
            str::to_string,
        ),
    ))(input)
}

fn number(input: &str) -> PResult<'_, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        str::parse::<f64>,
    )(input)
}

fn ident(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// Identifier-led expression: keyword literal, function call, or path.
fn ident_expr(input: &str) -> PResult<'_, Expr> {
    let (input, first) = ident(input)?;

    match first {
        "true" => return Ok((input, Expr::Literal(Literal::Bool(true)))),
        "false" => return Ok((input, Expr::Literal(Literal::Bool(false)))),
        "null" => return Ok((input, Expr::Literal(Literal::Null))),
        _ => {}
    }

    let (input, call) = opt(preceded(
        multispace0,
        delimited(
            char('('),
            delimited(multispace0, expr, multispace0),
            char(')'),
        ),
    ))(input)?;
    if let Some(arg) = call {
        return Ok((
            input,
            Expr::Call {
                func: first.to_string(),
                arg: Box::new(arg),
            },
        ));
    }

    let (input, rest) = many0(preceded(char('.'), ident))(input)?;
    let mut segments = Vec::with_capacity(1 + rest.len());
    segments.push(first.to_string());
    segments.extend(rest.into_iter().map(str::to_string));
    Ok((input, Expr::Path(segments)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_path() {
        let expr = parse("results.fetch_data.status").unwrap();
        assert_eq!(
            expr,
            Expr::Path(vec![
                "results".to_string(),
                "fetch_data".to_string(),
                "status".to_string(),
            ])
        );
    }

    #[test]
    fn test_parses_keyword_literals() {
        assert_eq!(parse("true").unwrap(), Expr::Literal(Literal::Bool(true)));
        assert_eq!(parse("false").unwrap(), Expr::Literal(Literal::Bool(false)));
        assert_eq!(parse("null").unwrap(), Expr::Literal(Literal::Null));
    }

    #[test]
    fn test_keyword_prefix_is_an_identifier() {
        // `truthy` starts with `true` but is a plain identifier
        let expr = parse("truthy").unwrap();
        assert_eq!(expr, Expr::Path(vec!["truthy".to_string()]));
    }

    #[test]
    fn test_parses_numbers() {
        assert_eq!(parse("42").unwrap(), Expr::Literal(Literal::Number(42.0)));
        assert_eq!(
            parse("-3.5").unwrap(),
            Expr::Literal(Literal::Number(-3.5))
        );
    }

    #[test]
    fn test_parses_strings() {
        assert_eq!(
            parse("\"hello\"").unwrap(),
            Expr::Literal(Literal::String("hello".to_string()))
        );
        assert_eq!(
            parse("''").unwrap(),
            Expr::Literal(Literal::String(String::new()))
        );
    }

    #[test]
    fn test_parses_comparison() {
        let expr = parse("results.a == \"ok\"").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Eq,
                Expr::Path(vec!["results".to_string(), "a".to_string()]),
                Expr::Literal(Literal::String("ok".to_string())),
            )
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("a || b && c").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Or,
                right,
                ..
            } => match *right {
                Expr::Binary {
                    op: BinaryOp::And, ..
                } => {}
                other => panic!("expected And on the right, got {other:?}"),
            },
            other => panic!("expected Or at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_parens_override_precedence() {
        let expr = parse("(a || b) && c").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_parses_call() {
        let expr = parse("len(results.items)").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                func: "len".to_string(),
                arg: Box::new(Expr::Path(vec![
                    "results".to_string(),
                    "items".to_string(),
                ])),
            }
        );
    }

    #[test]
    fn test_parses_negation() {
        let expr = parse("!done").unwrap();
        assert!(matches!(expr, Expr::Not(_)));
    }

    #[test]
    fn test_comparison_chain_order() {
        // <= and >= must win over < and >
        assert!(matches!(
            parse("a <= 1").unwrap(),
            Expr::Binary {
                op: BinaryOp::Le,
                ..
            }
        ));
        assert!(matches!(
            parse("a >= 1").unwrap(),
            Expr::Binary {
                op: BinaryOp::Ge,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("results.").is_err());
        assert!(parse("a ==").is_err());
        assert!(parse("(a").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("a & b").is_err());
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        assert!(parse("  results.a   ==   'x'  ").is_ok());
        assert!(parse("len( results.items )>0").is_ok());
    }
}
