////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

/// Source of documentation pages, addressed by their path relative to the HTML root
/// (`glfw3_8h.html`, `group__keys.html`, ...).
pub trait DocCorpus {
    fn read_page(&self, relative: &str) -> Result<String>;
}

/// Pages read from a directory, usually `<glfw checkout>/docs/html`.
#[derive(Clone, Debug)]
pub struct DirCorpus {
    root: PathBuf,
}

impl DirCorpus {
    pub fn new(root: impl Into<PathBuf>) -> DirCorpus {
        DirCorpus { root: root.into() }
    }

    /// The generated HTML reference inside a GLFW source checkout.
    pub fn from_checkout(checkout: &Path) -> DirCorpus {
        DirCorpus::new(checkout.join("docs").join("html"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocCorpus for DirCorpus {
    fn read_page(&self, relative: &str) -> Result<String> {
        let path = self.root.join(relative);
        fs::read_to_string(&path).map_err(|source| Error::Io { path, source })
    }
}

/// Pages held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryCorpus {
    pages: BTreeMap<String, String>,
}

impl MemoryCorpus {
    pub fn new() -> MemoryCorpus {
        MemoryCorpus::default()
    }

    pub fn with_page(mut self, name: impl Into<String>, html: impl Into<String>) -> MemoryCorpus {
        self.insert(name, html);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(name.into(), html.into());
    }
}

impl DocCorpus for MemoryCorpus {
    fn read_page(&self, relative: &str) -> Result<String> {
        self.pages.get(relative).cloned().ok_or_else(|| Error::Io {
            path: PathBuf::from(relative),
            source: io::Error::new(io::ErrorKind::NotFound, "no such page"),
        })
    }
}

impl<'a, C: DocCorpus + ?Sized> DocCorpus for &'a C {
    fn read_page(&self, relative: &str) -> Result<String> {
        (**self).read_page(relative)
    }
}
