// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! A streaming, stack-based writer for JUnit-flavored XML.
//!
//! [`XmlWriter`] never builds a DOM: it appends text fragments as elements are opened and closed,
//! and keeps a stack of open element names so that [`XmlWriter::get_string`] can always produce a
//! well-formed document.

mod escape;
mod writer;

pub use escape::escape;
pub use writer::*;
