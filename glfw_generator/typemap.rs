////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! C to Rust type and identifier mapping shared by all generators.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::registry::{CType, ParsedApi};

lazy_static! {
    /// C scalar → type usable in `extern "C"` signatures.
    static ref NATIVE_SCALARS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("void", "c_void");
        map.insert("char", "c_char");
        map.insert("unsigned char", "c_uchar");
        map.insert("short", "c_short");
        map.insert("unsigned short", "c_ushort");
        map.insert("int", "c_int");
        map.insert("unsigned int", "c_uint");
        map.insert("long", "c_long");
        map.insert("unsigned long", "c_ulong");
        map.insert("float", "c_float");
        map.insert("double", "c_double");
        map.insert("size_t", "usize");
        map.insert("int8_t", "i8");
        map.insert("uint8_t", "u8");
        map.insert("int16_t", "i16");
        map.insert("uint16_t", "u16");
        map.insert("int32_t", "i32");
        map.insert("uint32_t", "u32");
        map.insert("int64_t", "i64");
        map.insert("uint64_t", "u64");
        for vk in VULKAN_TYPES {
            map.insert(*vk, *vk);
        }
        map
    };

    /// C scalar → plain Rust type for the safe wrappers. Every entry is the same type as its
    /// native counterpart, so values and slices copy over without conversion.
    static ref SAFE_SCALARS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("unsigned char", "u8");
        map.insert("short", "i16");
        map.insert("unsigned short", "u16");
        map.insert("int", "i32");
        map.insert("unsigned int", "u32");
        map.insert("float", "f32");
        map.insert("double", "f64");
        map.insert("size_t", "usize");
        map.insert("int8_t", "i8");
        map.insert("uint8_t", "u8");
        map.insert("int16_t", "i16");
        map.insert("uint16_t", "u16");
        map.insert("int32_t", "i32");
        map.insert("uint32_t", "u32");
        map.insert("int64_t", "i64");
        map.insert("uint64_t", "u64");
        map
    };
}

/// Vulkan types GLFW mentions; the native types file declares them itself.
pub const VULKAN_TYPES: &[&str] = &["VkInstance", "VkPhysicalDevice", "VkSurfaceKHR", "VkResult", "VkAllocationCallbacks"];

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn", "else", "enum",
    "extern", "false", "final", "fn", "for", "if", "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut",
    "override", "priv", "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED_PATH_SEGMENTS: &[&str] = &["self", "Self", "crate", "super"];

/// The type name without `const` and pointer stars, e.g. `unsigned char` for
/// `const unsigned char*`.
pub fn scalar_name(ty: &CType) -> String {
    ty.name
        .trim_end_matches('*')
        .split(' ')
        .filter(|word| !word.is_empty() && *word != "const")
        .collect::<Vec<_>>()
        .join(" ")
}

fn native_base(ty: &CType, api: &ParsedApi) -> String {
    let scalar = scalar_name(ty);
    if api.type_def(&scalar).is_some() {
        return scalar;
    }
    match NATIVE_SCALARS.get(scalar.as_str()) {
        Some(native) => native.to_string(),
        None => {
            warn!("No native mapping for C type `{}`, using it as is", scalar);
            scalar
        },
    }
}

/// Rust spelling of `ty` in the raw binding.
///
/// `const` applies to the innermost pointer; unsized arrays decay to one more pointer level.
pub fn native_type(ty: &CType, api: &ParsedApi) -> String {
    let base = native_base(ty, api);

    if ty.has_fixed_size() && !ty.is_pointer() {
        return format!("[{}; {}]", base, ty.array_size);
    }

    let depth = ty.pointer_depth() + if ty.is_array && !ty.has_fixed_size() { 1 } else { 0 };
    if depth == 0 {
        return base;
    }

    let mut out = format!("{} {}", if ty.is_const() { "*const" } else { "*mut" }, base);
    for _ in 1..depth {
        out = format!("*mut {}", out);
    }
    out
}

/// ` -> T` for a native signature, or nothing for `void`.
pub fn native_return(ty: &CType, api: &ParsedApi) -> String {
    if ty.is_void() {
        String::new()
    } else {
        format!(" -> {}", native_type(ty, api))
    }
}

/// How one data struct field is represented in its safe wrapper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SafeField {
    /// A scalar copied with an `as` cast.
    Scalar(String),
    /// `char*`, copied into a `String`.
    Text,
    /// Pointer to an opaque handle.
    Handle(String),
    /// `T name[N]`, copied as is.
    FixedArray(String, i64),
    /// `T*` pointing at a caller-supplied number of elements.
    Slice(String),
    /// Anything else keeps its native type: function pointers, `void*`, nested pointers.
    Native(String),
}

impl SafeField {
    pub fn of(ty: &CType, api: &ParsedApi) -> SafeField {
        let scalar = scalar_name(ty);
        let safe_scalar = SAFE_SCALARS.get(scalar.as_str());

        if ty.has_fixed_size() && !ty.is_pointer() {
            if let Some(safe) = safe_scalar {
                return SafeField::FixedArray(safe.to_string(), ty.array_size);
            }
        } else if ty.is_array {
            if let (Some(safe), 0) = (safe_scalar, ty.pointer_depth()) {
                return SafeField::Slice(safe.to_string());
            }
        } else {
            match (ty.pointer_depth(), safe_scalar) {
                (0, Some(safe)) => return SafeField::Scalar(safe.to_string()),
                (1, Some(safe)) => return SafeField::Slice(safe.to_string()),
                (1, None) if scalar == "char" => return SafeField::Text,
                (1, None) if api.is_opaque_handle(&scalar) => return SafeField::Handle(wrapper_name(&scalar)),
                _ => {},
            }
        }

        SafeField::Native(native_type(ty, api))
    }

    pub fn rust_type(&self) -> String {
        match self {
            SafeField::Scalar(ty) | SafeField::Handle(ty) | SafeField::Native(ty) => ty.clone(),
            SafeField::Text => "String".to_string(),
            SafeField::FixedArray(ty, size) => format!("[{}; {}]", ty, size),
            SafeField::Slice(ty) => format!("Vec<{}>", ty),
        }
    }
}

/// Makes `name` usable as a Rust identifier.
pub fn sanitize_identifier(name: &str) -> String {
    if RESERVED_PATH_SEGMENTS.contains(&name) {
        format!("{}_", name)
    } else if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// Parameter name, with `arg<index>` for anonymous parameters.
pub fn parameter_name(name: &str, index: usize) -> String {
    if name.is_empty() {
        format!("arg{}", index)
    } else {
        sanitize_identifier(name)
    }
}

/// `camelCase`/`PascalCase` → `snake_case`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let after_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let starts_word = i > 0 && chars[i - 1].is_uppercase() && chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if after_lower || starts_word {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Safe wrapper name of a GLFW struct: `GLFWwindow` → `Window`.
pub fn wrapper_name(c_name: &str) -> String {
    capitalize(c_name.strip_prefix("GLFW").unwrap_or(c_name))
}

/// Short name of a collection member: `GLFW_KEY_ESCAPE` → `Escape`, `GLFW_KEY_0` → `D0`.
///
/// The prefix and suffix are only removed at the start and the end of the name.
pub fn enum_name(macro_name: &str, prefix: &str, suffix: &str) -> String {
    let mut short = macro_name;
    if !prefix.is_empty() {
        short = short.strip_prefix(prefix).unwrap_or(short);
    }
    if !suffix.is_empty() {
        short = short.strip_suffix(suffix).unwrap_or(short);
    }
    if short.is_empty() {
        short = macro_name;
    }

    let name: String = short.split('_').map(|part| capitalize(&part.to_lowercase())).collect();
    match name.chars().next() {
        Some(first) if first.is_ascii_digit() => format!("D{}", name),
        _ => name,
    }
}
