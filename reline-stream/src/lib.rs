mod decode;
mod encoding;
mod error;
mod source;
mod stream;

pub use decode::{DecodedLine, LineDecoder, LineEnding};
pub use encoding::TextEncoding;
pub use error::{ReplaceError, RewriteError};
pub use source::{ByteSource, FixedBuffer};
pub use stream::{ReplaceFn, RewriteStream};
