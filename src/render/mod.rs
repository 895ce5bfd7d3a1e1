//! Execute a compiled template against host data.

mod context;
mod core;
pub(crate) mod fault;
mod path;

use std::io;

pub use crate::render::context::{BlockScope, Context};
pub(crate) use crate::render::context::Functions;
pub use crate::render::path::Path;

use crate::fmt::Writer;
use crate::render::core::{Executor, Frame};
use crate::{Error, Result, Template};

pub(crate) fn to_string<'a>(template: &'a Template<'_>, ctx: &mut Context<'a>) -> Result<String> {
    let mut s = String::with_capacity(template.source.len());
    execute(template, &mut s, ctx)?;
    Ok(s)
}

pub(crate) fn to_writer<'a, W>(
    template: &'a Template<'_>,
    writer: W,
    ctx: &mut Context<'a>,
) -> Result<()>
where
    W: io::Write,
{
    let mut w = Writer::new(writer);
    execute(template, &mut w, ctx).map_err(|err| w.take_err().map(Error::from).unwrap_or(err))
}

fn execute<'a>(
    template: &'a Template<'_>,
    f: &mut dyn std::fmt::Write,
    ctx: &mut Context<'a>,
) -> Result<()> {
    let frame = Frame {
        source: &template.source,
        name: &template.name,
    };
    Executor::new(f)
        .execute(ctx, frame, &template.root)
        .map_err(|err| {
            tracing::debug!(template = %template.name, error = %err, "render failed");
            err
        })
}
