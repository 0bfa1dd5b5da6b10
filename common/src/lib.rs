pub mod codec;
pub mod record;

pub use codec::{CodecError, CodecResult};
pub use record::Record;
