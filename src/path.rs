//! Dotted paths with bracketed array indices, e.g. `object.array[2][0]`.
//!
//! A path is split on `.` into steps; each step is `key ("[" integer "]")*`. There is no escaping,
//! so keys that contain `.` or `[` cannot be reached through a path.

use chumsky::prelude::*;
use tracing::trace;

use crate::document::Document;
use crate::error::{Error, LookupError, Result};
use crate::node::{NodeId, NodeRef};
use crate::spanned::Spanned;

/// One dot-separated segment of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub key: String,
    pub indices: Vec<i64>,
}

type Extra<'a> = extra::Err<Rich<'a, char>>;

fn key<'a>() -> impl Parser<'a, &'a str, String, Extra<'a>> + Clone {
    none_of(".[")
        .repeated()
        .to_slice()
        .map(ToString::to_string)
        .labelled("key")
}

/// An optionally signed decimal; leading zeros are allowed, so `[01]` and `[+1]` both read 1.
fn index<'a>() -> impl Parser<'a, &'a str, i64, Extra<'a>> + Clone {
    one_of("+-")
        .or_not()
        .then(text::digits(10))
        .to_slice()
        .try_map(|digits: &str, span| {
            digits
                .parse::<i64>()
                .map_err(|e| Rich::custom(span, format!("invalid index: {e}")))
        })
        .delimited_by(just('['), just(']'))
        .labelled("index")
}

/// A step must be fully consumed by its key and indices.
pub fn step_parser<'a>() -> impl Parser<'a, &'a str, Step, Extra<'a>> {
    key()
        .then(index().repeated().collect::<Vec<_>>())
        .then_ignore(end())
        .map(|(key, indices)| Step { key, indices })
}

/// Text between brackets is skipped and a malformed bracket ends the step: the key and indices
/// collected so far are kept and the remainder is ignored.
pub fn lenient_step_parser<'a>() -> impl Parser<'a, &'a str, Step, Extra<'a>> {
    let skipped = none_of("[").repeated();
    key()
        .then(skipped.ignore_then(index()).repeated().collect::<Vec<_>>())
        .then_ignore(any().repeated())
        .map(|(key, indices)| Step { key, indices })
}

/// Splits `path` into steps, each spanning its segment of the path text.
pub fn parse_path(path: &str, lenient: bool) -> Result<Vec<Spanned<Step>>> {
    let mut steps = Vec::new();
    let mut offset = 0;
    for segment in path.split('.') {
        let span = SimpleSpan::new(offset, offset + segment.len());
        let (step, errors) = if lenient {
            lenient_step_parser().parse(segment).into_output_errors()
        } else {
            step_parser().parse(segment).into_output_errors()
        };

        if let Some(err) = errors.into_iter().next() {
            let local = err.span();
            return Err(Error::MalformedPath {
                path: path.to_owned(),
                span: SimpleSpan::new(offset + local.start, offset + local.end),
                reason: err.to_string(),
            });
        }
        let Some(step) = step else {
            return Err(Error::MalformedPath {
                path: path.to_owned(),
                span,
                reason: "unparseable step".to_owned(),
            });
        };

        steps.push(Spanned { span, val: step });
        offset += segment.len() + 1;
    }
    Ok(steps)
}

/// Applies one step. An empty key on the first step means "stay on the start node"; anywhere
/// else it is a lookup of the key `""`.
fn walk_step<'a>(node: NodeRef<'a>, step: &Step, first: bool) -> Result<NodeRef<'a>, LookupError> {
    let mut node = if first && step.key.is_empty() {
        node
    } else {
        node.lookup(&step.key)?
    };
    for &index in &step.indices {
        node = node.at(index)?;
    }
    Ok(node)
}

impl Document {
    /// Resolves `path` starting at `start`.
    ///
    /// Any failing step aborts the whole resolution with [`Error::PathNotFound`], whose span
    /// points at the failing step. The empty path resolves to `start` itself.
    pub fn resolve(&self, start: NodeId, path: &str) -> Result<NodeId> {
        let steps = parse_path(path, self.config.lenient_paths)?;
        let mut current = self.node(start).ok_or(Error::InvalidNode)?;

        for (i, Spanned { span, val: step }) in steps.iter().enumerate() {
            current = walk_step(current, step, i == 0).map_err(|reason| {
                trace!(path, %reason, "path resolution failed");
                Error::PathNotFound {
                    path: path.to_owned(),
                    span: *span,
                    reason,
                }
            })?;
        }
        Ok(current.id())
    }
}
