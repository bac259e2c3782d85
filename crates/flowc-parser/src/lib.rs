/*! Parse FlowScript source into an AST.
 *
 * The grammar is small: one scalar type, pipelines, bounded loops and functions. The parser
 * keeps faith with the source by recording the line of every node, because everything
 * downstream reports diagnostics as line-annotated one-liners.
 */

use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use std::sync::LazyLock;

pub mod ast;

use ast::{BinaryOp, Node, NodeKind, Program, UnaryOp};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct FlowParser;

pub type ParseResult<T> = Result<T, Box<pest::error::Error<Rule>>>;

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::op_or, Assoc::Left))
        .op(Op::infix(Rule::op_and, Assoc::Left))
        .op(Op::infix(Rule::op_eq, Assoc::Left)
            | Op::infix(Rule::op_ne, Assoc::Left)
            | Op::infix(Rule::op_lt, Assoc::Left)
            | Op::infix(Rule::op_gt, Assoc::Left)
            | Op::infix(Rule::op_le, Assoc::Left)
            | Op::infix(Rule::op_ge, Assoc::Left))
        .op(Op::infix(Rule::op_add, Assoc::Left) | Op::infix(Rule::op_sub, Assoc::Left))
        .op(Op::infix(Rule::op_mul, Assoc::Left) | Op::infix(Rule::op_div, Assoc::Left))
        .op(Op::prefix(Rule::op_neg) | Op::prefix(Rule::op_not))
});

pub fn parse(source: &str) -> ParseResult<Program> {
    let mut pairs = FlowParser::parse(Rule::program, source).map_err(Box::new)?;
    let statements = match pairs.next() {
        Some(program) => program
            .into_inner()
            .filter(|p| p.as_rule() == Rule::statement)
            .map(build_statement)
            .collect(),
        None => Vec::new(),
    };
    Ok(Program { statements })
}

pub fn check(source: &str) -> bool {
    parse(source).is_ok()
}

fn line_of(pair: &Pair<Rule>) -> u32 {
    pair.as_span().start_pos().line_col().0 as u32
}

fn build_statement(pair: Pair<Rule>) -> Node {
    let inner = match pair.into_inner().next() {
        Some(p) => p,
        None => unreachable!("statement always wraps one alternative"),
    };
    match inner.as_rule() {
        Rule::func_def => build_func_def(inner),
        Rule::return_stmt => build_return(inner),
        Rule::if_expr => build_if(inner),
        Rule::for_each => build_for_each(inner),
        Rule::expr_stmt => match inner.into_inner().next() {
            Some(expr) => build_expression(expr),
            None => unreachable!("expression statement always wraps an expression"),
        },
        rule => unreachable!("unexpected statement rule {:?}", rule),
    }
}

fn build_expression(pair: Pair<Rule>) -> Node {
    match pair.as_rule() {
        Rule::expression => match pair.into_inner().next() {
            Some(p) => build_expression(p),
            None => unreachable!("expression always wraps a pipe expression"),
        },
        Rule::pipe_expr => build_pipe_expr(pair),
        Rule::simple_expr => build_simple_expr(pair),
        rule => unreachable!("unexpected expression rule {:?}", rule),
    }
}

fn build_pipe_expr(pair: Pair<Rule>) -> Node {
    let mut inner = pair.into_inner();
    let mut node = match inner.next() {
        Some(first) => build_simple_expr(first),
        None => unreachable!("pipe expression always starts with an operand"),
    };
    // `a |> b |> c` folds left: `(a |> b) |> c`.
    for target in inner {
        let line = line_of(&target);
        let right = build_pipe_target(target);
        node = Node::new(
            NodeKind::Pipeline {
                left: Box::new(node),
                right: Box::new(right),
            },
            line,
        );
    }
    node
}

fn build_pipe_target(pair: Pair<Rule>) -> Node {
    let inner = match pair.into_inner().next() {
        Some(p) => p,
        None => unreachable!("pipe target always wraps one operator"),
    };
    match inner.as_rule() {
        Rule::if_expr => build_if(inner),
        Rule::for_each => build_for_each(inner),
        Rule::print_call => build_print(inner),
        Rule::func_call => build_func_call(inner),
        rule => unreachable!("unexpected pipe target rule {:?}", rule),
    }
}

fn build_simple_expr(pair: Pair<Rule>) -> Node {
    PRATT
        .map_primary(build_primary)
        .map_prefix(|op, operand| {
            let line = line_of(&op);
            let unary = match op.as_rule() {
                Rule::op_not => UnaryOp::Not,
                Rule::op_neg => UnaryOp::Neg,
                rule => unreachable!("unexpected prefix rule {:?}", rule),
            };
            Node::new(
                NodeKind::Unary {
                    op: unary,
                    operand: Box::new(operand),
                },
                line,
            )
        })
        .map_infix(|left, op, right| {
            let line = line_of(&op);
            let binary = match op.as_rule() {
                Rule::op_add => BinaryOp::Add,
                Rule::op_sub => BinaryOp::Sub,
                Rule::op_mul => BinaryOp::Mul,
                Rule::op_div => BinaryOp::Div,
                Rule::op_eq => BinaryOp::Eq,
                Rule::op_ne => BinaryOp::Ne,
                Rule::op_lt => BinaryOp::Lt,
                Rule::op_gt => BinaryOp::Gt,
                Rule::op_le => BinaryOp::Le,
                Rule::op_ge => BinaryOp::Ge,
                Rule::op_and => BinaryOp::And,
                Rule::op_or => BinaryOp::Or,
                rule => unreachable!("unexpected infix rule {:?}", rule),
            };
            Node::new(
                NodeKind::Binary {
                    op: binary,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            )
        })
        .parse(pair.into_inner())
}

fn build_primary(pair: Pair<Rule>) -> Node {
    let line = line_of(&pair);
    match pair.as_rule() {
        Rule::number => {
            let value = pair.as_str().parse::<i64>().unwrap_or(0);
            Node::new(NodeKind::Number(value), line)
        }
        Rule::ident => Node::new(NodeKind::Identifier(pair.as_str().to_string()), line),
        Rule::range_expr => build_range(pair),
        Rule::print_call => build_print(pair),
        Rule::func_call => build_func_call(pair),
        Rule::assignment => build_assignment(pair),
        Rule::expression => build_expression(pair),
        rule => unreachable!("unexpected primary rule {:?}", rule),
    }
}

fn build_block(pair: Pair<Rule>) -> Vec<Node> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::statement)
        .map(build_statement)
        .collect()
}

fn build_func_def(pair: Pair<Rule>) -> Node {
    let line = line_of(&pair);
    let mut name = String::new();
    let mut params = Vec::new();
    let mut body = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::ident => name = part.as_str().to_string(),
            Rule::param_list => {
                params = part.into_inner().map(|p| p.as_str().to_string()).collect();
            }
            Rule::block => body = build_block(part),
            _ => {}
        }
    }

    Node::new(NodeKind::FunctionDef { name, params, body }, line)
}

fn build_return(pair: Pair<Rule>) -> Node {
    let line = line_of(&pair);
    let value = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expression)
        .map(|p| Box::new(build_expression(p)));
    Node::new(NodeKind::Return(value), line)
}

fn build_if(pair: Pair<Rule>) -> Node {
    let line = line_of(&pair);
    let mut condition = None;
    let mut blocks = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::expression => condition = Some(build_expression(part)),
            Rule::block => blocks.push(build_block(part)),
            _ => {}
        }
    }

    let condition = match condition {
        Some(c) => Box::new(c),
        None => unreachable!("if always carries a condition"),
    };
    let mut blocks = blocks.into_iter();
    let then_body = blocks.next().unwrap_or_default();
    let else_body = blocks.next();

    Node::new(
        NodeKind::IfElse {
            condition,
            then_body,
            else_body,
        },
        line,
    )
}

fn build_for_each(pair: Pair<Rule>) -> Node {
    let line = line_of(&pair);
    let mut var = None;
    let mut body = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::ident => var = Some(part.as_str().to_string()),
            Rule::block => body = build_block(part),
            _ => {}
        }
    }

    Node::new(
        NodeKind::ForEach {
            range: None,
            var: var.unwrap_or_else(|| "item".to_string()),
            body,
        },
        line,
    )
}

fn build_print(pair: Pair<Rule>) -> Node {
    let line = line_of(&pair);
    let arg = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expression)
        .map(|p| Box::new(build_expression(p)));
    Node::new(NodeKind::Print(arg), line)
}

fn build_func_call(pair: Pair<Rule>) -> Node {
    let line = line_of(&pair);
    let mut name = String::new();
    let mut args = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::ident => name = part.as_str().to_string(),
            Rule::arg_list => {
                args = part.into_inner().map(build_expression).collect();
            }
            _ => {}
        }
    }

    Node::new(NodeKind::Call { name, args }, line)
}

fn build_range(pair: Pair<Rule>) -> Node {
    let line = line_of(&pair);
    let mut bounds = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::expression)
        .map(build_expression);

    let start = match bounds.next() {
        Some(s) => Box::new(s),
        None => unreachable!("range always has a start"),
    };
    let end = match bounds.next() {
        Some(e) => Box::new(e),
        None => unreachable!("range always has an end"),
    };

    Node::new(NodeKind::Range { start, end }, line)
}

fn build_assignment(pair: Pair<Rule>) -> Node {
    let line = line_of(&pair);
    let mut target = String::new();
    let mut value = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::ident => target = part.as_str().to_string(),
            Rule::expression => value = Some(build_expression(part)),
            _ => {}
        }
    }

    let value = match value {
        Some(v) => Box::new(v),
        None => unreachable!("assignment always has a right-hand side"),
    };

    Node::new(NodeKind::Assignment { target, value }, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_program() {
        let program = parse("").unwrap();
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_simple_pipeline() {
        let program = parse("5 |> print();").unwrap();
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0].kind {
            NodeKind::Pipeline { left, right } => {
                assert_eq!(left.kind, NodeKind::Number(5));
                assert_eq!(right.kind, NodeKind::Print(None));
            }
            other => panic!("expected pipeline, got {:?}", other),
        }
    }

    #[test]
    fn test_keywords_are_not_identifiers() {
        assert!(parse("return = 5;").is_err());
        assert!(parse("forx = 5;").is_ok());
    }
}
