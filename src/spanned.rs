use chumsky::span::SimpleSpan;

/// A value together with the byte range of the path text it was parsed from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Spanned<T> {
    pub span: SimpleSpan<usize>,
    pub val: T,
}
