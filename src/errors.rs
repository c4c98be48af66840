// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Error management module
//!
//! Provides the error returned by the render entry points

use std::path::PathBuf;

use crate::xlsx::XlsxError;

/// A struct to handle any error and a message
#[derive(Debug)]
pub enum Error {
    /// IO error
    Io(std::io::Error),
    /// xlsx specific error
    Xlsx(XlsxError),
    /// The document path does not exist
    FileNotFound(PathBuf),
    /// Invalid compact option code
    Options(String),
}

from_err!(std::io::Error, Error, Io);
from_err!(XlsxError, Error, Xlsx);

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Xlsx(e) => write!(f, "Xlsx error: {e}"),
            Error::FileNotFound(p) => write!(f, "File not found '{}'", p.display()),
            Error::Options(o) => write!(f, "Invalid options '{o}'"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Xlsx(e) => Some(e),
            Error::FileNotFound(_) | Error::Options(_) => None,
        }
    }
}
