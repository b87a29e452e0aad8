////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::collections::BTreeSet;
use std::io;

use super::{finish, struct_module, write_docs, write_header, GenContext, SourceSink};
use crate::registry::{ParsedApi, StructField, TypeDef};
use crate::typemap::{sanitize_identifier, snake_case, wrapper_name, SafeField};

/// Safe types over the GLFW structs: handle newtypes for opaque structs and owned copies of
/// data structs.
#[allow(missing_copy_implementations)]
pub struct WrapperGenerator;

impl super::Generator for WrapperGenerator {
    fn write<S>(&self, api: &ParsedApi, ctx: &GenContext, sink: &mut S) -> io::Result<()>
    where S: SourceSink {
        for handle in api.opaque_structs() {
            let mut dest = Vec::new();
            write_handle(handle, ctx, &mut dest)?;
            finish(sink, &format!("{}.rs", struct_module(handle)), dest)?;
        }

        for data in api.data_structs() {
            if let TypeDef::Struct { fields, .. } = data {
                let mut dest = Vec::new();
                write_data(data, fields, api, ctx, &mut dest)?;
                finish(sink, &format!("{}.rs", struct_module(data)), dest)?;
            }
        }

        Ok(())
    }
}

fn write_handle<W>(handle: &TypeDef, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    let native = handle.name();
    let wrapper = wrapper_name(native);

    write_header(ctx, dest)?;
    writeln!(dest, "use std::ptr;")?;
    writeln!(dest)?;
    writeln!(dest, "use super::native_types::{};", native)?;
    writeln!(dest)?;
    write_docs(handle.documentation(), "", ctx, dest)?;
    writeln!(
        dest,
        "#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct {wrapper}(*mut {native});

impl {wrapper} {{
    pub const NULL: {wrapper} = {wrapper}(ptr::null_mut());

    /// Wraps a handle returned by GLFW.
    pub fn from_raw(raw: *mut {native}) -> {wrapper} {{
        {wrapper}(raw)
    }}

    pub fn as_raw(self) -> *mut {native} {{
        self.0
    }}

    pub fn is_null(self) -> bool {{
        self.0.is_null()
    }}
}}

impl Default for {wrapper} {{
    fn default() -> {wrapper} {{
        {wrapper}::NULL
    }}
}}

impl From<{wrapper}> for *mut {native} {{
    fn from(handle: {wrapper}) -> *mut {native} {{
        handle.0
    }}
}}",
        wrapper = wrapper,
        native = native
    )
}

/// Expression converting `native.<field>` for [`write_data`].
fn convert_field(field: &StructField, safe: &SafeField) -> String {
    let source = format!("native.{}", sanitize_identifier(&field.name));
    match safe {
        SafeField::Scalar(ty) => format!("{} as {}", source, ty),
        SafeField::Text => format!(
            "if {source}.is_null() {{
                String::new()
            }} else {{
                CStr::from_ptr({source}).to_string_lossy().into_owned()
            }}",
            source = source
        ),
        SafeField::Handle(wrapper) => format!("{}::from_raw({} as *mut _)", wrapper, source),
        SafeField::FixedArray(..) | SafeField::Native(_) => source,
        SafeField::Slice(_) => format!(
            "if {source}.is_null() {{
                Vec::new()
            }} else {{
                slice::from_raw_parts({source} as *const _, len).to_vec()
            }}",
            source = source
        ),
    }
}

fn write_data<W>(data: &TypeDef, fields: &[StructField], api: &ParsedApi, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    let native = data.name();
    let wrapper = wrapper_name(native);
    let safe: Vec<SafeField> = fields.iter().map(|f| SafeField::of(&f.ty, api)).collect();
    let has_slice = safe.iter().any(|s| matches!(s, SafeField::Slice(_)));
    let has_text = safe.iter().any(|s| *s == SafeField::Text);

    let mut imports = BTreeSet::new();
    if has_text {
        imports.insert("use std::ffi::CStr;".to_string());
    }
    if has_slice {
        imports.insert("use std::slice;".to_string());
    }
    if safe.iter().any(|s| matches!(s, SafeField::Native(_))) {
        imports.insert("use std::os::raw::*;".to_string());
        imports.insert("use super::native_types::*;".to_string());
    } else {
        imports.insert(format!("use super::native_types::{};", native));
    }
    for s in &safe {
        if let SafeField::Handle(handle) = s {
            imports.insert(format!("use super::struct_{}::{};", snake_case(handle), handle));
        }
    }

    write_header(ctx, dest)?;
    writeln!(dest, "#![allow(unused_unsafe)]")?;
    writeln!(dest)?;
    for import in &imports {
        writeln!(dest, "{}", import)?;
    }
    writeln!(dest)?;

    write_docs(data.documentation(), "", ctx, dest)?;
    writeln!(dest, "#[derive(Clone, Debug)]")?;
    writeln!(dest, "pub struct {} {{", wrapper)?;
    for (field, safe) in fields.iter().zip(&safe) {
        write_docs(&field.documentation, "    ", ctx, dest)?;
        writeln!(dest, "    pub {}: {},", sanitize_identifier(&snake_case(&field.name)), safe.rust_type())?;
    }
    writeln!(dest, "}}")?;

    writeln!(dest)?;
    writeln!(dest, "impl {} {{", wrapper)?;
    writeln!(dest, "    /// Copies a struct GLFW handed out.")?;
    writeln!(dest, "    ///")?;
    writeln!(dest, "    /// # Safety")?;
    writeln!(dest, "    ///")?;
    if has_slice {
        writeln!(
            dest,
            "    /// Every pointer in `native` must be null or valid for reads; array pointers must \
             point at\n    /// `len` elements."
        )?;
        writeln!(dest, "    pub unsafe fn from_native(native: &{}, len: usize) -> {} {{", native, wrapper)?;
    } else {
        writeln!(dest, "    /// Every pointer in `native` must be null or valid for reads.")?;
        writeln!(dest, "    pub unsafe fn from_native(native: &{}) -> {} {{", native, wrapper)?;
    }
    writeln!(dest, "        unsafe {{")?;
    writeln!(dest, "            {} {{", wrapper)?;
    for (field, safe) in fields.iter().zip(&safe) {
        writeln!(
            dest,
            "                {}: {},",
            sanitize_identifier(&snake_case(&field.name)),
            convert_field(field, safe).replace("\n", "\n        ")
        )?;
    }
    writeln!(dest, "            }}")?;
    writeln!(dest, "        }}")?;
    writeln!(dest, "    }}")?;
    writeln!(dest, "}}")
}
