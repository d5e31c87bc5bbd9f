//! Fatal startup errors.
//!
//! Everything past a successful bind is recovered locally: regeneration
//! failures are logged and the request is served anyway, and missing files
//! are the delegate's ordinary not-found responses.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("dashboard directory {path} is not usable: {source}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dashboard path {path} is not a directory")]
    RootNotADirectory { path: PathBuf },

    #[error("cannot change working directory to {path}: {source}")]
    Chdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}
