use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("no free slot in page")]
    PageFull,

    #[error("slot {0} is out of range")]
    InvalidSlot(usize),

    #[error("slot {0} is empty")]
    EmptySlot(usize),

    #[error("tuple does not match the table schema")]
    SchemaMismatch,
}
