pub mod loaders;
pub mod record;

pub use loaders::load_rows_file;
pub use record::{Credentials, InvalidRow, UpdateOutcome, UpdateRequest};
