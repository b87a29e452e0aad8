////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! The in-memory model of the scraped GLFW API.

use std::{fmt, io};

use crate::generators::{GenContext, Generator, SourceSink};

/// A C type as written in a declaration.
///
/// Pointer depth is kept as trailing `*` characters of `name` (`"const char**"`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CType {
    pub name: String,
    pub is_array: bool,
    /// `-1` when the array has no explicit size.
    pub array_size: i64,
}

impl CType {
    pub fn new(name: impl Into<String>) -> CType {
        CType {
            name: name.into(),
            is_array: false,
            array_size: -1,
        }
    }

    pub fn array(name: impl Into<String>, size: i64) -> CType {
        CType {
            name: name.into(),
            is_array: true,
            array_size: size,
        }
    }

    pub fn is_pointer(&self) -> bool {
        self.name.ends_with('*')
    }

    pub fn pointer_depth(&self) -> usize {
        self.name.len() - self.name.trim_end_matches('*').len()
    }

    pub fn is_const(&self) -> bool {
        self.qualifiers().any(|q| q == "const")
    }

    pub fn is_unsigned(&self) -> bool {
        self.qualifiers().any(|q| q == "unsigned")
    }

    /// The type name without qualifiers or pointer stars.
    pub fn base(&self) -> &str {
        let unstarred = self.name.trim_end_matches('*');
        unstarred.rsplit(' ').next().unwrap_or(unstarred)
    }

    fn qualifiers(&self) -> impl Iterator<Item = &str> {
        let mut words: Vec<&str> = self.name.trim_end_matches('*').split(' ').collect();
        words.pop();
        words.into_iter()
    }

    pub fn is_void(&self) -> bool {
        self.name == "void"
    }

    pub fn has_fixed_size(&self) -> bool {
        self.is_array && self.array_size >= 0
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, if self.is_array { "[]" } else { "" })
    }
}

/// One block of long-form documentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocBlock {
    Paragraph(String),
    Code(Vec<String>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Documentation {
    /// The one-line description from the declaration table.
    pub summary: Option<String>,
    /// The detailed description from the item's own documentation section.
    pub blocks: Vec<DocBlock>,
    /// `page.html#anchor` the detailed description was read from.
    pub reference: Option<String>,
}

impl Documentation {
    pub fn summary(text: impl Into<String>) -> Documentation {
        Documentation {
            summary: Some(text.into()),
            ..Documentation::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.blocks.is_empty() && self.reference.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Macro {
    pub name: String,
    pub documentation: Documentation,
    pub ty: CType,
    /// Source text of the right-hand side; `None` for macros like include guards.
    pub value: Option<String>,
}

/// A closed set of macros read from one group page, projected as an enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroCollection {
    pub name: String,
    pub macros: Vec<Macro>,
    pub prefix_to_remove: String,
    pub suffix_to_remove: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    /// Empty for anonymous parameters.
    pub name: String,
    pub ty: CType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: CType) -> Parameter {
        Parameter { name: name.into(), ty }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub ty: CType,
    pub documentation: Documentation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDef {
    /// A C function pointer typedef.
    Delegate {
        name: String,
        documentation: Documentation,
        return_type: CType,
        parameters: Vec<Parameter>,
    },
    /// A struct typedef; without fields it is an opaque handle.
    Struct {
        name: String,
        documentation: Documentation,
        fields: Vec<StructField>,
    },
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Delegate { name, .. } | TypeDef::Struct { name, .. } => name,
        }
    }

    pub fn documentation(&self) -> &Documentation {
        match self {
            TypeDef::Delegate { documentation, .. } | TypeDef::Struct { documentation, .. } => documentation,
        }
    }

    pub fn is_opaque(&self) -> bool {
        match self {
            TypeDef::Struct { fields, .. } => fields.is_empty(),
            TypeDef::Delegate { .. } => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub documentation: Documentation,
    pub return_type: CType,
    pub parameters: Vec<Parameter>,
}

/// Everything one scrape produced. Names are unique within each list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedApi {
    pub macro_collections: Vec<MacroCollection>,
    pub macros: Vec<Macro>,
    pub type_defs: Vec<TypeDef>,
    pub functions: Vec<Function>,
}

impl ParsedApi {
    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.type_defs.iter().find(|t| t.name() == name)
    }

    pub fn macro_named(&self, name: &str) -> Option<&Macro> {
        self.macros.iter().find(|m| m.name == name)
    }

    pub fn is_opaque_handle(&self, name: &str) -> bool {
        self.type_def(name).map_or(false, TypeDef::is_opaque)
    }

    pub fn is_delegate(&self, name: &str) -> bool {
        match self.type_def(name) {
            Some(TypeDef::Delegate { .. }) => true,
            _ => false,
        }
    }

    pub fn opaque_structs(&self) -> impl Iterator<Item = &TypeDef> {
        self.type_defs.iter().filter(|t| t.is_opaque())
    }

    /// Struct typedefs with at least one field, in scrape order.
    pub fn data_structs(&self) -> impl Iterator<Item = &TypeDef> {
        self.type_defs.iter().filter(|t| match t {
            TypeDef::Struct { fields, .. } => !fields.is_empty(),
            TypeDef::Delegate { .. } => false,
        })
    }

    /// Runs `generator` over this API, handing every produced file to `sink`.
    pub fn write_bindings<G, S>(&self, generator: G, ctx: &GenContext, sink: &mut S) -> io::Result<()>
    where
        G: Generator,
        S: SourceSink,
    {
        generator.write(self, ctx, sink)
    }
}
