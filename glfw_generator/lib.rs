////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! A GLFW bindings generator. GLFW ships no machine readable registry, so the API is scraped from
//! the Doxygen HTML reference: declarations are lexed and parsed out of the reference tables and
//! turned into raw bindings, newtype enums and safe wrappers.
//!
//! # Example
//!
//! ```no_run
//! extern crate glfw_generator;
//!
//! use glfw_generator::{BindingsGenerator, DirCorpus, DirectorySink, GenContext, ModelProvider};
//! use std::path::Path;
//!
//! fn main() {
//!     let api = ModelProvider::new(DirCorpus::from_checkout(Path::new("glfw"))).get_api().unwrap();
//!     let mut sink = DirectorySink::create("src/glfw").unwrap();
//!     let ctx = GenContext::new("https://www.glfw.org/docs/latest", "zlib License");
//!
//!     api.write_bindings(BindingsGenerator, &ctx, &mut sink).unwrap();
//! }
//! ```
//!
//! The output directory holds a `mod.rs`; the crate it is placed in must depend on
//! `glfw_runtime` for the closure callbacks, and install a symbol loader with
//! `set_loader` or `load_with` before calling into GLFW.

extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate xml;

#[cfg(feature = "unstable_generator_utils")]
pub mod generators;
#[cfg(not(feature = "unstable_generator_utils"))]
mod generators;

mod error;
pub mod lexer;
pub mod parsing;
mod registry;
pub mod scrape;
mod typemap;

pub use error::{Error, Result};
pub use generators::{
    enum_gen::EnumGenerator, native_gen::NativeGenerator, wrapper_gen::WrapperGenerator, BindingsGenerator,
    DirectorySink, GenContext, Generator, MemorySink, SourceSink,
};
pub use scrape::{DirCorpus, DocCorpus, MemoryCorpus, ModelProvider};

pub use registry::*;
