use std::fmt::Write;

use crate::fmt::{write_value, FormatError};
use crate::functions::{ArgError, CallError};
use crate::render::context::{BlockDef, Context};
use crate::render::fault;
use crate::render::path::{resolve_indirect, AccessError};
use crate::types::ast;
use crate::types::span::Span;
use crate::value::ValueCow;
use crate::{Error, Result, Value};

/// The template whose content is currently executing.
///
/// Block content registered from another template executes under that
/// template's frame so that errors point at the right source.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame<'a, 'f> {
    pub source: &'a str,
    pub name: &'f str,
}

/// Interprets a compiled AST, writing the output to a formatter.
pub(crate) struct Executor<'w> {
    f: &'w mut dyn Write,
}

impl<'w> Executor<'w> {
    pub fn new(f: &'w mut dyn Write) -> Self {
        Self { f }
    }

    pub fn execute<'a>(
        &mut self,
        ctx: &mut Context<'a>,
        frame: Frame<'a, '_>,
        seq: &'a ast::Sequence,
    ) -> Result<()> {
        self.sequence(ctx, frame, seq)
            .map_err(|err| err.with_template_name(frame.name))
    }

    fn sequence<'a>(
        &mut self,
        ctx: &mut Context<'a>,
        frame: Frame<'a, '_>,
        seq: &'a ast::Sequence,
    ) -> Result<()> {
        for node in &seq.nodes {
            self.node(ctx, frame, node)?;
        }
        Ok(())
    }

    fn node<'a>(
        &mut self,
        ctx: &mut Context<'a>,
        frame: Frame<'a, '_>,
        node: &'a ast::Node,
    ) -> Result<()> {
        match node {
            ast::Node::Text(text) => {
                self.f.write_str(&text.text)?;
            }

            ast::Node::Expr(expr) => {
                let value = eval(ctx, frame, expr)?;
                match write_value(&mut *self.f, &value) {
                    Ok(()) => {}
                    Err(FormatError::Unrenderable(kind)) => {
                        return Err(Error::render(
                            format!("expected renderable value, found {kind}"),
                            frame.source,
                            expr.span(),
                        ));
                    }
                    Err(FormatError::Write(err)) => return Err(err.into()),
                }
            }

            ast::Node::IfElse(if_else) => {
                let cond = eval(ctx, frame, &if_else.cond)?;
                if cond.is_truthy() {
                    self.sequence(ctx, frame, &if_else.then_branch)?;
                } else if let Some(branch) = &if_else.else_branch {
                    self.sequence(ctx, frame, branch)?;
                }
            }

            ast::Node::Range(range) => {
                self.range(ctx, frame, range)?;
            }

            ast::Node::With(with) => {
                let mut ctx = ctx
                    .cd(&with.selector)
                    .map_err(|err| err_access(err, frame, with.selector.span))?;
                self.sequence(&mut ctx, frame, &with.body)?;
            }

            ast::Node::Block(block) => {
                self.block(ctx, frame, block)?;
            }
        }
        Ok(())
    }

    fn range<'a>(
        &mut self,
        ctx: &mut Context<'a>,
        frame: Frame<'a, '_>,
        range: &'a ast::Range,
    ) -> Result<()> {
        let span = range.selector.span;
        let value = ctx
            .value_for(&range.selector)
            .map_err(|err| err_access(err, frame, span))?;
        let value = resolve_indirect(value).map_err(|msg| err_indirect(msg, frame, span))?;

        let items: Vec<(Value, ValueCow<'a>)> = match value {
            ValueCow::Borrowed(Value::List(list)) => list
                .iter()
                .enumerate()
                .map(|(i, v)| (Value::Integer(i as i64), ValueCow::Borrowed(v)))
                .collect(),
            ValueCow::Borrowed(Value::Map(map)) => map
                .iter()
                .map(|(k, v)| (Value::from(k.as_str()), ValueCow::Borrowed(v)))
                .collect(),
            ValueCow::Borrowed(Value::Record(record)) => record
                .fields()
                .map(|(k, v)| (Value::from(k), ValueCow::Borrowed(v)))
                .collect(),
            ValueCow::Owned(Value::List(list)) => list
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Value::Integer(i as i64), ValueCow::Owned(v)))
                .collect(),
            ValueCow::Owned(Value::Map(map)) => map
                .into_iter()
                .map(|(k, v)| (Value::from(k), ValueCow::Owned(v)))
                .collect(),
            ValueCow::Owned(Value::Record(record)) => record
                .fields()
                .map(|(k, v)| (Value::from(k), ValueCow::Owned(v.clone())))
                .collect(),
            value => {
                return Err(Error::render(
                    format!("expected iterable, found {}", value.type_name()),
                    frame.source,
                    span,
                ));
            }
        };

        for (key, value) in items {
            let bindings = match &range.vars {
                ast::LoopVars::Item(item) => {
                    vec![(ctx.path().string_with(&[&item.name]), value)]
                }
                ast::LoopVars::KeyValue(kv) => vec![
                    (
                        ctx.path().string_with(&[&kv.key.name]),
                        ValueCow::Owned(key),
                    ),
                    (ctx.path().string_with(&[&kv.value.name]), value),
                ],
            };
            let mut ctx = ctx.bind(bindings);
            self.sequence(&mut ctx, frame, &range.body)?;
        }
        Ok(())
    }

    fn block<'a>(
        &mut self,
        ctx: &mut Context<'a>,
        frame: Frame<'a, '_>,
        block: &'a ast::Block,
    ) -> Result<()> {
        let name = block.name.name.as_str();
        match ctx.block(name).cloned() {
            Some(def) => {
                let inner = Frame {
                    source: def.source,
                    name: &def.file,
                };
                self.execute(ctx, inner, def.content)
            }
            None => {
                ctx.register_block(
                    name,
                    BlockDef {
                        content: &block.body,
                        source: frame.source,
                        file: frame.name.to_owned(),
                    },
                );
                self.sequence(ctx, frame, &block.body)
            }
        }
    }
}

fn eval<'a>(ctx: &Context<'a>, frame: Frame<'a, '_>, expr: &'a ast::Expr) -> Result<ValueCow<'a>> {
    match expr {
        ast::Expr::Integer(i, _) => Ok(ValueCow::Owned(Value::Integer(*i))),
        ast::Expr::Float(f, _) => Ok(ValueCow::Owned(Value::Float(*f))),
        ast::Expr::String(s, _) => Ok(ValueCow::Owned(Value::String(s.clone()))),
        ast::Expr::Selector(sel) => {
            let value = ctx
                .value_for(sel)
                .map_err(|err| err_access(err, frame, sel.span))?;
            resolve_indirect(value).map_err(|msg| err_indirect(msg, frame, sel.span))
        }
        ast::Expr::Call(call) => eval_call(ctx, frame, call).map(ValueCow::Owned),
    }
}

fn eval_call<'a>(ctx: &Context<'a>, frame: Frame<'a, '_>, call: &'a ast::Call) -> Result<Value> {
    let name = call.name.name.as_str();
    let func = ctx.function(name).ok_or_else(|| {
        Error::call(
            format!("unknown function `{name}`"),
            frame.source,
            call.name.span,
        )
    })?;

    let args = call
        .args
        .iter()
        .map(|arg| eval(ctx, frame, arg).map(ValueCow::into_owned))
        .collect::<Result<Vec<_>>>()?;

    let result = fault::guard(|| func(args)).map_err(|msg| {
        Error::call(
            format!("call {name}: panicked: {msg}"),
            frame.source,
            call.span,
        )
    })?;

    result.map_err(|err| {
        let arg_span = |i: usize| call.args.get(i).map_or(call.span, ast::Expr::span);
        match err {
            CallError::Arity(exp, got) => Error::call(
                format!("function `{name}` expected {exp} arguments, found {got}"),
                frame.source,
                call.span,
            ),
            CallError::Arg(i, ArgError::Type(exp, got)) => Error::call(
                format!("function `{name}` expected {exp} argument, found {got}"),
                frame.source,
                arg_span(i),
            ),
            CallError::Arg(i, ArgError::TryFromInt(ty, v)) => Error::call(
                format!("function `{name}` expected {ty} argument, but `{v}` is out of range"),
                frame.source,
                arg_span(i),
            ),
            CallError::Failed(msg) => {
                Error::call(format!("call {name}: {msg}"), frame.source, call.span)
            }
        }
    })
}

fn err_access(err: AccessError, frame: Frame<'_, '_>, span: Span) -> Error {
    Error::render(err.to_string(), frame.source, span)
}

fn err_indirect(msg: String, frame: Frame<'_, '_>, span: Span) -> Error {
    Error::render(format!("field access panicked: {msg}"), frame.source, span)
}
