////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Runtime support for bindings produced by `glfw_generator`.
//!
//! GLFW callbacks are plain C function pointers. The generated `callbacks` module registers a
//! trampoline with GLFW and keeps the user's closure in [`callbacks`], keyed by handle and
//! callback kind.

#[macro_use]
extern crate log;

pub mod callbacks;

pub use callbacks::CallbackKey;
