/// Segment-local document id. Ids are dense and start at 0; a cursor that has
/// not been positioned yet reports -1.
pub type DocId = i32;

/// Sentinel returned by exhausted doc-id cursors. Greater than every valid id,
/// so `doc_id() >= target` checks keep working at end of stream.
pub const NO_MORE_DOCS: DocId = i32::MAX;
