//! Typed value + descriptor to compact JSON text.

use crate::descriptor::{
    Category, FieldDescriptor, Peek, RecordDescriptor, Reflect, SequenceDescriptor,
    TypeDescriptor,
};
use crate::parallel::Context;
use crate::primitive::encode_primitive;
use crate::text::string::write_quoted;
use crate::{Error, Result};

pub(crate) fn encode_root(
    ctx: &Context<'_>,
    value: &dyn Reflect,
    descriptor: &TypeDescriptor,
) -> Result<String> {
    let mut out = String::new();
    ctx.checkpoint()?;
    encode_peek(ctx, value.peek(), descriptor, &mut out)?;
    Ok(out)
}

fn encode_node(
    ctx: &Context<'_>,
    value: &dyn Reflect,
    descriptor: &TypeDescriptor,
    out: &mut String,
) -> Result<()> {
    ctx.checkpoint()?;
    encode_peek(ctx, value.peek(), descriptor, out)
}

fn encode_peek(
    ctx: &Context<'_>,
    peek: Peek<'_>,
    descriptor: &TypeDescriptor,
    out: &mut String,
) -> Result<()> {
    match descriptor {
        TypeDescriptor::Optional(opt) => {
            if let Peek::Null = peek {
                out.push_str("null");
                return Ok(());
            }
            encode_peek(ctx, peek, opt.inner().resolve()?, out)
        }
        TypeDescriptor::Primitive(kind) => encode_primitive(&peek, *kind, out),
        TypeDescriptor::Sequence(seq) => match peek {
            Peek::Sequence(items) => encode_sequence(&ctx.descend()?, &items, seq, out),
            other => Err(Error::type_mismatch("sequence", other.kind_name())),
        },
        TypeDescriptor::Record(record) => match peek {
            Peek::Record(values) => encode_record(&ctx.descend()?, &values, record, out),
            other => Err(Error::type_mismatch(record.type_name(), other.kind_name())),
        },
    }
}

fn encode_sequence(
    ctx: &Context<'_>,
    items: &[&dyn Reflect],
    seq: &SequenceDescriptor,
    out: &mut String,
) -> Result<()> {
    if items.is_empty() {
        out.push_str("[]");
        return Ok(());
    }
    let element = seq.element();
    let descriptor = element.resolve()?;

    let batches = ctx.map_chunks(items, ctx.batch_size(), |start, batch| {
        let mut buf = String::new();
        for (offset, item) in batch.iter().enumerate() {
            let idx = start + offset;
            if offset > 0 {
                buf.push(',');
            }
            encode_element(ctx, *item, descriptor, element.type_name(), &mut buf)
                .map_err(|err| err.at_index(idx))?;
        }
        Ok(buf)
    })?;

    out.push('[');
    for (idx, batch) in batches.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(batch);
    }
    out.push(']');
    Ok(())
}

fn encode_element(
    ctx: &Context<'_>,
    item: &dyn Reflect,
    descriptor: &TypeDescriptor,
    element_type: &'static str,
    out: &mut String,
) -> Result<()> {
    ctx.checkpoint()?;
    let peek = item.peek();
    if !same_shape(&peek, descriptor)? {
        return Err(Error::unsupported_type(
            element_type,
            format!("sequence element is a {}", peek.kind_name()),
        ));
    }
    encode_peek(ctx, peek, descriptor, out)
}

/// Whether `peek` has the structure `descriptor` describes. Null is left for
/// the optional/primitive rules to judge.
fn same_shape(peek: &Peek<'_>, descriptor: &TypeDescriptor) -> Result<bool> {
    Ok(match (descriptor, peek) {
        (_, Peek::Null) => true,
        (TypeDescriptor::Optional(opt), _) => same_shape(peek, opt.inner().resolve()?)?,
        (TypeDescriptor::Primitive(kind), _) => matches!(
            (kind.category(), peek),
            (Category::Boolean, Peek::Bool(_))
                | (Category::Integer, Peek::Int(_) | Peek::UInt(_))
                | (Category::Float, Peek::F32(_) | Peek::F64(_))
                | (Category::String, Peek::Str(_))
        ),
        (TypeDescriptor::Sequence(_), Peek::Sequence(_)) => true,
        (TypeDescriptor::Record(record), Peek::Record(values)) => {
            values.len() == record.fields().len()
        }
        _ => false,
    })
}

fn encode_record(
    ctx: &Context<'_>,
    values: &[&dyn Reflect],
    record: &RecordDescriptor,
    out: &mut String,
) -> Result<()> {
    let fields = record.fields();
    if values.len() != fields.len() {
        return Err(Error::type_mismatch(
            format!("{} with {} fields", record.type_name(), fields.len()),
            format!("record with {} fields", values.len()),
        ));
    }
    if fields.is_empty() {
        out.push_str("{}");
        return Ok(());
    }

    let pairs: Vec<(&FieldDescriptor, &dyn Reflect)> =
        fields.iter().zip(values.iter().copied()).collect();
    let parts = ctx.map_chunks(&pairs, ctx.batch_size(), |_, batch| {
        let mut buf = String::new();
        for (offset, (field, value)) in batch.iter().enumerate() {
            if offset > 0 {
                buf.push(',');
            }
            write_quoted(&mut buf, field.name());
            buf.push(':');
            let descriptor = field.ty().resolve().map_err(|err| err.at_field(field.name()))?;
            encode_node(ctx, *value, descriptor, &mut buf)
                .map_err(|err| err.at_field(field.name()))?;
        }
        Ok(buf)
    })?;

    out.push('{');
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(part);
    }
    out.push('}');
    Ok(())
}
