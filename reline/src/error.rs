use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open file `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read stdin")]
    ReadStdin {
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create output file `{}`", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid filter")]
    Filter {
        #[source]
        source: reline_stream::RewriteError,
    },

    #[error("Cannot write filtered output")]
    WriteOutput {
        #[source]
        source: std::io::Error,
    },
}
