////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! The raw 1:1 binding: constants, type definitions and lazily loaded functions.

use std::io;

use super::{finish, gen_parameters, struct_module, write_docs, write_header, GenContext, SourceSink};
use crate::registry::{CType, Function, Parameter, ParsedApi, TypeDef};
use crate::typemap::{native_return, native_type, parameter_name, sanitize_identifier, scalar_name, snake_case, wrapper_name};

/// Modules written by [`NativeGenerator`], in declaration order.
pub const MODULES: &[&str] = &["native_constants", "native_types", "native_functions"];

#[allow(missing_copy_implementations)]
pub struct NativeGenerator;

impl super::Generator for NativeGenerator {
    fn write<S>(&self, api: &ParsedApi, ctx: &GenContext, sink: &mut S) -> io::Result<()>
    where S: SourceSink {
        let mut dest = Vec::new();
        write_constants(api, ctx, &mut dest)?;
        finish(sink, "native_constants.rs", dest)?;

        let mut dest = Vec::new();
        write_types(api, ctx, &mut dest)?;
        finish(sink, "native_types.rs", dest)?;

        let mut dest = Vec::new();
        write_functions(api, ctx, &mut dest)?;
        finish(sink, "native_functions.rs", dest)
    }
}

/// Rust spelling of a macro value. Hex literals above `i32::MAX` go through `u32`.
pub fn constant_value(value: &str) -> String {
    if let Some(digits) = value.strip_prefix("0x") {
        if let Ok(number) = u64::from_str_radix(digits, 16) {
            if number > i32::max_value() as u64 {
                return format!("{}_u32 as c_int", value);
            }
        }
    }
    value.to_string()
}

/// Creates one `pub const` per macro that has a value.
fn write_constants<W>(api: &ParsedApi, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    write_header(ctx, dest)?;
    writeln!(dest, "#![allow(dead_code, non_upper_case_globals, unused_parens)]")?;
    writeln!(dest)?;
    writeln!(dest, "use std::os::raw::c_int;")?;

    for m in &api.macros {
        let value = match &m.value {
            Some(value) => value,
            None => continue,
        };
        writeln!(dest)?;
        write_docs(&m.documentation, "", ctx, dest)?;
        writeln!(
            dest,
            "pub const {name}: {ty} = {value};",
            name = m.name,
            ty = native_type(&m.ty, api),
            value = constant_value(value)
        )?;
    }

    Ok(())
}

/// Declares the Vulkan types GLFW refers to without defining.
fn write_vulkan_preamble<W>(dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        "
pub type VkInstance = *mut c_void;
pub type VkPhysicalDevice = *mut c_void;
pub type VkSurfaceKHR = u64;
pub type VkResult = c_int;

#[repr(C)]
pub struct VkAllocationCallbacks {{
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}}"
    )
}

/// Creates the function pointer aliases and the struct layouts.
fn write_types<W>(api: &ParsedApi, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    write_header(ctx, dest)?;
    writeln!(dest, "#![allow(non_camel_case_types, non_snake_case, dead_code, missing_copy_implementations)]")?;
    writeln!(dest)?;
    writeln!(dest, "use std::marker::{{PhantomData, PhantomPinned}};")?;
    writeln!(dest, "use std::os::raw::*;")?;
    write_vulkan_preamble(dest)?;

    for type_def in &api.type_defs {
        writeln!(dest)?;
        write_docs(type_def.documentation(), "", ctx, dest)?;
        match type_def {
            TypeDef::Delegate {
                name,
                return_type,
                parameters,
                ..
            } => {
                writeln!(
                    dest,
                    "pub type {name} = Option<unsafe extern \"C\" fn({params}){ret}>;",
                    name = sanitize_identifier(name),
                    params = gen_parameters(parameters, api, true, true).join(", "),
                    ret = native_return(return_type, api)
                )?;
            },
            TypeDef::Struct { name, fields, .. } if fields.is_empty() => {
                writeln!(
                    dest,
                    "#[repr(C)]
pub struct {name} {{
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}}",
                    name = sanitize_identifier(name)
                )?;
            },
            TypeDef::Struct { name, fields, .. } => {
                writeln!(dest, "#[repr(C)]")?;
                writeln!(dest, "#[derive(Debug, Clone, Copy)]")?;
                writeln!(dest, "pub struct {} {{", sanitize_identifier(name))?;
                for field in fields {
                    write_docs(&field.documentation, "    ", ctx, dest)?;
                    writeln!(dest, "    pub {}: {},", sanitize_identifier(&field.name), native_type(&field.ty, api))?;
                }
                writeln!(dest, "}}")?;
            },
        }
    }

    Ok(())
}

/// A `glfwSet*Callback` function together with the function pointer type it registers.
pub struct CallbackSetter<'a> {
    pub function: &'a Function,
    /// Index of the function pointer parameter.
    pub slot: usize,
    pub delegate_return: &'a CType,
    pub delegate_parameters: &'a [Parameter],
    /// Whether the closure is stored per handle (first parameter of both the setter and the
    /// callback is the same opaque handle) rather than once globally.
    pub per_handle: bool,
}

impl<'a> CallbackSetter<'a> {
    pub fn of(function: &'a Function, api: &'a ParsedApi) -> Option<CallbackSetter<'a>> {
        if !function.name.ends_with("Callback") {
            return None;
        }

        let slot = function
            .parameters
            .iter()
            .rposition(|p| !p.ty.is_pointer() && !p.ty.is_array && api.is_delegate(&p.ty.name))?;

        let (delegate_return, delegate_parameters) = match api.type_def(&function.parameters[slot].ty.name)? {
            TypeDef::Delegate {
                return_type,
                parameters,
                ..
            } => (return_type, parameters.as_slice()),
            TypeDef::Struct { .. } => return None,
        };

        let per_handle = match (function.parameters.first(), delegate_parameters.first()) {
            (Some(owner), Some(first)) => {
                slot != 0 && is_handle(&owner.ty, api) && owner.ty.name == first.ty.name
            },
            _ => false,
        };

        Some(CallbackSetter {
            function,
            slot,
            delegate_return,
            delegate_parameters,
            per_handle,
        })
    }

    /// `glfwSetKeyCallback` → `KeyCallback`
    pub fn alias(&self) -> String {
        let name = &self.function.name;
        let short = name.strip_prefix("glfwSet").or_else(|| name.strip_prefix("glfw")).unwrap_or(name);
        wrapper_name(short)
    }

    /// `glfwSetKeyCallback` → `set_key_callback`
    pub fn setter_name(&self) -> String {
        let name = &self.function.name;
        sanitize_identifier(&snake_case(name.strip_prefix("glfw").unwrap_or(name)))
    }

    fn trampoline_name(&self) -> String {
        format!("{}_trampoline", self.function.name)
    }
}

fn is_handle(ty: &CType, api: &ParsedApi) -> bool {
    ty.pointer_depth() == 1 && !ty.is_array && api.is_opaque_handle(&scalar_name(ty))
}

/// Creates the `storage` module with one atomic function pointer per GLFW function.
fn write_ptrs<W>(api: &ParsedApi, dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        "
mod storage {{
    #![allow(non_upper_case_globals)]
    use std::os::raw::c_void;
    use std::ptr;
    use std::sync::atomic::AtomicPtr;
"
    )?;

    for f in &api.functions {
        writeln!(
            dest,
            "    pub static {name}: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());",
            name = f.name
        )?;
    }

    writeln!(dest, "}}")
}

/// Creates the loader plumbing shared by every function.
fn write_loader<W>(dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        r#"
type Loader = Box<dyn Fn(&str) -> *const c_void + Send + Sync>;

static LOADER: OnceLock<Loader> = OnceLock::new();

/// Installs the symbol lookup used to resolve functions on their first call, e.g. a `dlsym` over
/// the GLFW shared library. Returns `false` if a loader was installed before.
pub fn set_loader<F>(loader: F) -> bool
where F: Fn(&str) -> *const c_void + Send + Sync + 'static {{
    LOADER.set(Box::new(loader)).is_ok()
}}

#[inline(never)]
fn missing_fn_panic(symbol: &str) -> ! {{
    panic!("GLFW function {{}} was not loaded", symbol)
}}

#[inline(never)]
fn resolve(slot: &AtomicPtr<c_void>, symbol: &'static str) -> *mut c_void {{
    let mut ptr = slot.load(Ordering::Acquire);
    if ptr.is_null() {{
        if let Some(loader) = LOADER.get() {{
            ptr = loader(symbol) as *mut c_void;
            slot.store(ptr, Ordering::Release);
        }}
    }}
    if ptr.is_null() {{
        missing_fn_panic(symbol)
    }}
    ptr
}}"#
    )
}

/// Creates the functions corresponding to the GLFW functions.
///
/// Each calls through the pointer in the `storage` module, resolving it first if needed.
fn write_fns<W>(api: &ParsedApi, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    for f in &api.functions {
        writeln!(dest)?;
        write_docs(&f.documentation, "", ctx, dest)?;
        writeln!(
            dest,
            "#[inline]
pub unsafe fn {name}({params}){ret} {{
    unsafe {{
        mem::transmute::<*mut c_void, unsafe extern \"C\" fn({typed_params}){ret}>(resolve(&storage::{name}, \"{name}\"))({idents})
    }}
}}",
            name = f.name,
            params = gen_parameters(&f.parameters, api, true, true).join(", "),
            typed_params = gen_parameters(&f.parameters, api, false, true).join(", "),
            ret = native_return(&f.return_type, api),
            idents = gen_parameters(&f.parameters, api, true, false).join(", "),
        )?;
    }

    Ok(())
}

/// Creates one module per function with its own `is_loaded` and `load_with`.
fn write_fn_mods<W>(api: &ParsedApi, dest: &mut W) -> io::Result<()>
where W: io::Write {
    for f in &api.functions {
        writeln!(
            dest,
            r#"
pub mod {name} {{
    use super::storage;
    use std::os::raw::c_void;
    use std::sync::atomic::Ordering;

    #[inline]
    pub fn is_loaded() -> bool {{
        !storage::{name}.load(Ordering::Acquire).is_null()
    }}

    pub fn load_with<F>(mut loadfn: F)
    where F: FnMut(&'static str) -> *const c_void {{
        storage::{name}.store(loadfn("{name}") as *mut c_void, Ordering::Release);
    }}
}}"#,
            name = f.name
        )?;
    }

    Ok(())
}

/// Creates the `load_with` function that resolves every function at once.
fn write_load_fn<W>(api: &ParsedApi, dest: &mut W) -> io::Result<()>
where W: io::Write {
    writeln!(
        dest,
        "
/// Resolves every GLFW function now with `loadfn`. Symbols it cannot find are left unresolved
/// and will panic when called.
pub fn load_with<F>(mut loadfn: F)
where F: FnMut(&'static str) -> *const c_void {{"
    )?;

    for f in &api.functions {
        writeln!(dest, "    {}::load_with(&mut loadfn);", f.name)?;
    }

    writeln!(dest, "}}")
}

/// Creates the `callbacks` module: a trampoline and a closure-taking setter per callback setter.
fn write_callbacks<W>(api: &ParsedApi, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    let setters: Vec<CallbackSetter> = api.functions.iter().filter_map(|f| CallbackSetter::of(f, api)).collect();

    writeln!(
        dest,
        "
/// Closure based callback registration.
///
/// Closures live in the `glfw_runtime` callback registry of the calling thread until they are
/// replaced, cleared or their handle is released.
pub mod callbacks {{
    use std::mem;
    use std::os::raw::*;

    use glfw_runtime::callbacks::{{self as registry, CallbackKey}};

    use super::super::native_types::*;"
    )?;

    let mut handles: Vec<&TypeDef> = api.opaque_structs().collect();
    handles.retain(|h| {
        setters
            .iter()
            .any(|s| s.function.parameters.iter().any(|p| is_handle(&p.ty, api) && scalar_name(&p.ty) == h.name()))
    });
    for handle in &handles {
        writeln!(dest, "    use super::super::{}::{};", struct_module(handle), wrapper_name(handle.name()))?;
    }

    for setter in &setters {
        write_callback(setter, api, ctx, dest)?;
    }

    for handle in &handles {
        let wrapper = wrapper_name(handle.name());
        writeln!(
            dest,
            "
    /// Drops every closure registered for `handle`. Call this after destroying it.
    pub fn release_{snake}(handle: {wrapper}) {{
        registry::release(handle.as_raw() as usize);
    }}",
            snake = snake_case(&wrapper),
            wrapper = wrapper
        )?;
    }

    writeln!(dest, "}}")
}

fn write_callback<W>(setter: &CallbackSetter, api: &ParsedApi, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    let alias = setter.alias();
    let name = &setter.function.name;
    let closure_params = gen_parameters(setter.delegate_parameters, api, false, true).join(", ");
    let closure_ret = native_return(setter.delegate_return, api);

    writeln!(dest)?;
    writeln!(dest, "    /// Closure registered by [`{}`].", setter.setter_name())?;
    writeln!(dest, "    pub type {} = Box<dyn FnMut({}){}>;", alias, closure_params, closure_ret)?;

    // trampoline
    let trampoline_key = match (setter.per_handle, setter.delegate_parameters.first()) {
        (true, Some(first)) => format!("{} as usize", parameter_name(&first.name, 0)),
        _ => "0".to_string(),
    };
    let fallback = if setter.delegate_return.is_void() {
        ";"
    } else {
        "\n            .unwrap_or_else(|| unsafe { mem::zeroed() })"
    };
    writeln!(
        dest,
        "
    unsafe extern \"C\" fn {trampoline}({params}){ret} {{
        registry::invoke(CallbackKey::new({key}, \"{name}\"), |registered: &mut {alias}| registered({idents})){fallback}
    }}",
        trampoline = setter.trampoline_name(),
        params = gen_parameters(setter.delegate_parameters, api, true, true).join(", "),
        ret = closure_ret,
        key = trampoline_key,
        name = name,
        alias = alias,
        idents = gen_parameters(setter.delegate_parameters, api, true, false).join(", "),
        fallback = fallback,
    )?;

    // setter
    let mut params = Vec::new();
    let mut args = Vec::new();
    for (i, param) in setter.function.parameters.iter().enumerate() {
        if i == setter.slot {
            params.push(format!("callback: Option<{}>", alias));
            args.push("trampoline".to_string());
            continue;
        }
        let ident = parameter_name(&param.name, i);
        if is_handle(&param.ty, api) {
            params.push(format!("{}: {}", ident, wrapper_name(&scalar_name(&param.ty))));
            args.push(format!("{}.as_raw()", ident));
        } else {
            params.push(format!("{}: {}", ident, native_type(&param.ty, api)));
            args.push(ident);
        }
    }
    let takes_handle = setter.function.parameters.iter().enumerate().any(|(i, p)| i != setter.slot && is_handle(&p.ty, api));
    let owner = if setter.per_handle {
        format!("{}.as_raw() as usize", parameter_name(&setter.function.parameters[0].name, 0))
    } else {
        "0".to_string()
    };

    writeln!(dest)?;
    write_docs(&setter.function.documentation, "    ", ctx, dest)?;
    if !setter.function.documentation.is_empty() {
        writeln!(dest, "    ///")?;
    }
    writeln!(dest, "    /// Registers `callback` with `{}` and returns the closure it replaces.", name)?;
    if takes_handle {
        writeln!(dest, "    ///")?;
        writeln!(dest, "    /// # Safety")?;
        writeln!(dest, "    ///")?;
        writeln!(dest, "    /// Every handle passed in must be alive and owned by GLFW.")?;
    }
    writeln!(
        dest,
        "    pub {unsafety}fn {setter}({params}) -> Option<{alias}> {{
        let slot = CallbackKey::new({owner}, \"{name}\");
        let trampoline: {delegate} = match callback {{
            Some(_) => Some({trampoline}),
            None => None,
        }};
        let previous = registry::replace(slot, callback);
        unsafe {{
            super::{name}({args});
        }}
        previous
    }}",
        name = name,
        unsafety = if takes_handle { "unsafe " } else { "" },
        setter = setter.setter_name(),
        params = params.join(", "),
        alias = alias,
        owner = owner,
        delegate = sanitize_identifier(&setter.function.parameters[setter.slot].ty.name),
        trampoline = setter.trampoline_name(),
        args = args.join(", "),
    )
}

/// Creates the whole `native_functions.rs`.
fn write_functions<W>(api: &ParsedApi, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    write_header(ctx, dest)?;
    writeln!(
        dest,
        "#![allow(non_snake_case, dead_code, unused_imports, unused_unsafe, clippy::missing_safety_doc)]

use std::mem;
use std::os::raw::*;
use std::sync::atomic::{{AtomicPtr, Ordering}};
use std::sync::OnceLock;

use super::native_types::*;"
    )?;
    write_loader(dest)?;
    write_ptrs(api, dest)?;
    write_fns(api, ctx, dest)?;
    write_fn_mods(api, dest)?;
    write_load_fn(api, dest)?;
    write_callbacks(api, ctx, dest)
}
