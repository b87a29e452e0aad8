////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::registry::{DocBlock, Documentation, MacroCollection, Parameter, ParsedApi, TypeDef};
use crate::typemap::{native_type, parameter_name, snake_case, wrapper_name};

pub mod enum_gen;
pub mod native_gen;
pub mod wrapper_gen;

/// Trait for a bindings generator.
///
/// A generator may produce any number of files; each is handed to the sink whole.
pub trait Generator {
    /// Builds the bindings for `api`.
    fn write<S>(&self, api: &ParsedApi, ctx: &GenContext, sink: &mut S) -> io::Result<()>
    where S: SourceSink;
}

/// Receives generated files.
pub trait SourceSink {
    fn write_file(&mut self, name: &str, contents: &str) -> io::Result<()>;
}

/// Writes files into one directory, which is emptied when the sink is created.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn create(root: impl Into<PathBuf>) -> io::Result<DirectorySink> {
        let root = root.into();
        if root.exists() {
            info!("Removing previous output in {}", root.display());
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;
        Ok(DirectorySink { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceSink for DirectorySink {
    fn write_file(&mut self, name: &str, contents: &str) -> io::Result<()> {
        debug!("Writing {}", name);
        fs::write(self.root.join(name), contents)
    }
}

/// Keeps generated files in memory, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemorySink {
    pub files: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

impl SourceSink for MemorySink {
    fn write_file(&mut self, name: &str, contents: &str) -> io::Result<()> {
        self.files.insert(name.to_string(), contents.to_string());
        Ok(())
    }
}

/// Run-wide inputs that end up in every generated file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenContext {
    /// Base URL of the online reference, used for `See ...` links.
    pub doc_url: String,
    /// License text copied into every file header.
    pub license: String,
    pub tool: String,
}

impl GenContext {
    pub fn new(doc_url: impl Into<String>, license: impl Into<String>) -> GenContext {
        GenContext {
            doc_url: doc_url.into(),
            license: license.into(),
            tool: format!("glfw_generator {}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn doc_link(&self, reference: &str) -> String {
        format!("{}/{}", self.doc_url.trim_end_matches('/'), reference)
    }
}

/// Runs the native, enum and wrapper generators and ties their files together with a `mod.rs`.
#[allow(missing_copy_implementations)]
pub struct BindingsGenerator;

impl Generator for BindingsGenerator {
    fn write<S>(&self, api: &ParsedApi, ctx: &GenContext, sink: &mut S) -> io::Result<()>
    where S: SourceSink {
        native_gen::NativeGenerator.write(api, ctx, sink)?;
        enum_gen::EnumGenerator.write(api, ctx, sink)?;
        wrapper_gen::WrapperGenerator.write(api, ctx, sink)?;
        write_mod_file(api, ctx, sink)
    }
}

fn write_mod_file<S>(api: &ParsedApi, ctx: &GenContext, sink: &mut S) -> io::Result<()>
where S: SourceSink {
    let mut dest = Vec::new();
    write_header(ctx, &mut dest)?;

    let mut exports = Vec::new();
    for module in native_gen::MODULES {
        writeln!(dest, "pub mod {};", module)?;
        exports.push(format!("pub use self::{}::*;", module));
    }
    for collection in &api.macro_collections {
        writeln!(dest, "pub mod {};", enum_module(collection))?;
        exports.push(format!("pub use self::{}::{};", enum_module(collection), collection.name));
    }
    for type_def in api.opaque_structs().chain(api.data_structs()) {
        writeln!(dest, "pub mod {};", struct_module(type_def))?;
        exports.push(format!("pub use self::{}::{};", struct_module(type_def), wrapper_name(type_def.name())));
    }

    writeln!(dest)?;
    for export in exports {
        writeln!(dest, "{}", export)?;
    }

    finish(sink, "mod.rs", dest)
}

/// `enum_<snake name>`
pub fn enum_module(collection: &MacroCollection) -> String {
    format!("enum_{}", snake_case(&collection.name))
}

/// `struct_<snake wrapper name>`
pub fn struct_module(type_def: &TypeDef) -> String {
    format!("struct_{}", snake_case(&wrapper_name(type_def.name())))
}

/// Hands a finished file to the sink.
pub fn finish<S>(sink: &mut S, name: &str, dest: Vec<u8>) -> io::Result<()>
where S: SourceSink {
    let contents = String::from_utf8(dest).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    sink.write_file(name, &contents)
}

/// The do-not-edit banner every generated file starts with.
pub fn write_header<W>(ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(dest, "// This file was generated by {}. Do not edit it by hand.", ctx.tool)?;
    writeln!(dest, "// Source: {}", ctx.doc_url)?;
    writeln!(dest, "//")?;
    for line in ctx.license.lines() {
        if line.trim().is_empty() {
            writeln!(dest, "//")?;
        } else {
            writeln!(dest, "// {}", line.trim_end())?;
        }
    }
    writeln!(dest)
}

fn escape_doc(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Writes `docs` as `///` comments indented by `indent`. Writes nothing for empty docs.
pub fn write_docs<W>(docs: &Documentation, indent: &str, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    let mut first = true;
    let mut separate = |dest: &mut W| -> io::Result<()> {
        if !first {
            writeln!(dest, "{}///", indent)?;
        }
        first = false;
        Ok(())
    };

    if let Some(summary) = &docs.summary {
        separate(&mut *dest)?;
        writeln!(dest, "{}/// {}", indent, escape_doc(summary))?;
    }

    for block in &docs.blocks {
        // the summary usually repeats as the first paragraph
        if let (DocBlock::Paragraph(text), Some(summary)) = (block, &docs.summary) {
            if text == summary {
                continue;
            }
        }
        separate(&mut *dest)?;
        match block {
            DocBlock::Paragraph(text) => writeln!(dest, "{}/// {}", indent, escape_doc(text))?,
            DocBlock::Code(lines) => {
                writeln!(dest, "{}/// ```text", indent)?;
                for line in lines {
                    writeln!(dest, "{}/// {}", indent, line)?;
                }
                writeln!(dest, "{}/// ```", indent)?;
            },
        }
    }

    if let Some(reference) = &docs.reference {
        separate(&mut *dest)?;
        writeln!(dest, "{}/// See <{}>", indent, ctx.doc_link(reference))?;
    }

    Ok(())
}

/// Generates the list of Rust parameters of a C parameter list.
pub fn gen_parameters(params: &[Parameter], api: &ParsedApi, with_idents: bool, with_types: bool) -> Vec<String> {
    params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            let ident = parameter_name(&param.name, i);
            let ty = native_type(&param.ty, api);
            match (with_idents, with_types) {
                (true, true) => format!("{}: {}", ident, ty),
                (false, true) => ty,
                _ => ident,
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::registry::*;

    fn int_macro(name: &str, value: Option<&str>) -> Macro {
        Macro {
            name: name.to_string(),
            documentation: Documentation::default(),
            ty: CType::new("int"),
            value: value.map(str::to_string),
        }
    }

    fn delegate(name: &str, return_type: &str, parameters: Vec<Parameter>) -> TypeDef {
        TypeDef::Delegate {
            name: name.to_string(),
            documentation: Documentation::default(),
            return_type: CType::new(return_type),
            parameters,
        }
    }

    fn data_struct(name: &str, fields: Vec<(&str, CType)>) -> TypeDef {
        TypeDef::Struct {
            name: name.to_string(),
            documentation: Documentation::default(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| StructField {
                    name: name.to_string(),
                    ty,
                    documentation: Documentation::default(),
                })
                .collect(),
        }
    }

    fn function(name: &str, return_type: &str, parameters: Vec<Parameter>) -> Function {
        Function {
            name: name.to_string(),
            documentation: Documentation::default(),
            return_type: CType::new(return_type),
            parameters,
        }
    }

    fn param(name: &str, ty: &str) -> Parameter {
        Parameter::new(name, CType::new(ty))
    }

    /// A small slice of GLFW covering every kind of declaration.
    pub fn sample_api() -> ParsedApi {
        let mut version = int_macro("GLFW_VERSION_MAJOR", Some("3"));
        version.documentation = Documentation::summary("The major version number of the GLFW header.");
        let keys = vec![
            int_macro("GLFW_KEY_0", Some("48")),
            int_macro("GLFW_KEY_ESCAPE", Some("256")),
            int_macro("GLFW_KEY_MENU", Some("348")),
            int_macro("GLFW_KEY_LAST", Some("GLFW_KEY_MENU")),
        ];
        let actions = vec![int_macro("GLFW_RELEASE", Some("0")), int_macro("GLFW_PRESS", Some("1"))];

        let mut macros = vec![version, int_macro("GLFW_APIENTRY_DEFINED", None)];
        macros.extend(actions.iter().cloned());
        macros.extend(keys.iter().cloned());

        let mut collection_actions = actions;
        collection_actions.push(int_macro("GLFW_REPEAT", Some("2")));

        ParsedApi {
            macro_collections: vec![
                MacroCollection {
                    name: "Action".to_string(),
                    macros: collection_actions,
                    prefix_to_remove: "GLFW_".to_string(),
                    suffix_to_remove: String::new(),
                },
                MacroCollection {
                    name: "Key".to_string(),
                    macros: keys,
                    prefix_to_remove: "GLFW_KEY_".to_string(),
                    suffix_to_remove: String::new(),
                },
            ],
            macros,
            type_defs: vec![
                data_struct("GLFWmonitor", vec![]),
                data_struct("GLFWwindow", vec![]),
                delegate("GLFWerrorfun", "void", vec![param("error_code", "int"), param("description", "const char*")]),
                delegate("GLFWkeyfun", "void", vec![
                    param("window", "GLFWwindow*"),
                    param("key", "int"),
                    param("scancode", "int"),
                    param("action", "int"),
                    param("mods", "int"),
                ]),
                data_struct("GLFWvidmode", vec![
                    ("width", CType::new("int")),
                    ("height", CType::new("int")),
                    ("refreshRate", CType::new("int")),
                ]),
                data_struct("GLFWimage", vec![
                    ("width", CType::new("int")),
                    ("height", CType::new("int")),
                    ("pixels", CType::new("unsigned char*")),
                ]),
                data_struct("GLFWgamepadstate", vec![
                    ("buttons", CType::array("unsigned char", 15)),
                    ("axes", CType::array("float", 6)),
                ]),
            ],
            functions: vec![
                function("glfwInit", "int", vec![]),
                function("glfwTerminate", "void", vec![]),
                function("glfwCreateWindow", "GLFWwindow*", vec![
                    param("width", "int"),
                    param("height", "int"),
                    param("title", "const char*"),
                    param("monitor", "GLFWmonitor*"),
                    param("share", "GLFWwindow*"),
                ]),
                function("glfwSetErrorCallback", "GLFWerrorfun", vec![param("callback", "GLFWerrorfun")]),
                function("glfwSetKeyCallback", "GLFWkeyfun", vec![
                    param("window", "GLFWwindow*"),
                    param("callback", "GLFWkeyfun"),
                ]),
            ],
        }
    }
}
