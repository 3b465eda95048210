//! Parsed value + descriptor back to a typed value.

pub mod parser;

pub use parser::{parse, parse_with_depth};

use crate::descriptor::{Erased, FieldDescriptor, RecordDescriptor, SequenceDescriptor, TypeDescriptor};
use crate::parallel::Context;
use crate::primitive::decode_primitive;
use crate::value::{Map, Value};
use crate::{Error, Result};

pub(crate) fn decode_node(
    ctx: &Context<'_>,
    value: &Value,
    descriptor: &TypeDescriptor,
) -> Result<Erased> {
    ctx.checkpoint()?;
    match descriptor {
        TypeDescriptor::Optional(opt) => {
            if value.is_null() {
                return opt.wrap(None);
            }
            let inner = decode_node(ctx, value, opt.inner().resolve()?)?;
            opt.wrap(Some(inner))
        }
        TypeDescriptor::Primitive(kind) => decode_primitive(value, *kind),
        TypeDescriptor::Sequence(seq) => match value {
            Value::Array(items) => decode_sequence(&ctx.descend()?, items, seq),
            other => Err(Error::type_mismatch("array", other.kind_name())),
        },
        TypeDescriptor::Record(record) => match value {
            Value::Object(map) => decode_record(&ctx.descend()?, map, record),
            other => Err(Error::type_mismatch(
                format!("object for {}", record.type_name()),
                other.kind_name(),
            )),
        },
    }
}

fn decode_sequence(ctx: &Context<'_>, items: &[Value], seq: &SequenceDescriptor) -> Result<Erased> {
    if items.is_empty() {
        return seq.collect(Vec::new());
    }
    let element = seq.element().resolve()?;
    let batches = ctx.map_chunks(items, ctx.batch_size(), |start, batch| {
        batch
            .iter()
            .enumerate()
            .map(|(offset, item)| {
                decode_node(ctx, item, element).map_err(|err| err.at_index(start + offset))
            })
            .collect::<Result<Vec<Erased>>>()
    })?;
    seq.collect(batches.into_iter().flatten().collect())
}

fn decode_record(ctx: &Context<'_>, map: &Map, record: &RecordDescriptor) -> Result<Erased> {
    // keys naming no declared field are ignored
    let batches = ctx.map_chunks(record.fields(), ctx.batch_size(), |_, batch| {
        batch
            .iter()
            .map(|field| decode_field(ctx, map, field))
            .collect::<Result<Vec<Erased>>>()
    })?;
    record.construct(batches.into_iter().flatten().collect())
}

fn decode_field(ctx: &Context<'_>, map: &Map, field: &FieldDescriptor) -> Result<Erased> {
    let descriptor = field.ty().resolve().map_err(|err| err.at_field(field.name()))?;
    match map.get(field.name()) {
        Some(value) => {
            decode_node(ctx, value, descriptor).map_err(|err| err.at_field(field.name()))
        }
        None => match descriptor {
            TypeDescriptor::Optional(opt) if !field.is_required() => opt.wrap(None),
            _ => Err(Error::missing_field(field.name())),
        },
    }
}
