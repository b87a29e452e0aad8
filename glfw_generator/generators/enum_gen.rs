////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! One newtype per macro collection (`Key`, `MouseButton`, ...) with a named constant per member.
//!
//! Collections contain aliases (`GLFW_KEY_LAST`) and GLFW may hand out values outside the
//! collection, so members are associated constants of a `c_int` newtype rather than enum variants.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use super::{enum_module, finish, native_gen::constant_value, write_docs, write_header, GenContext, SourceSink};
use crate::error::Error;
use crate::registry::{Macro, MacroCollection, ParsedApi};
use crate::typemap::enum_name;

#[allow(missing_copy_implementations)]
pub struct EnumGenerator;

impl super::Generator for EnumGenerator {
    fn write<S>(&self, api: &ParsedApi, ctx: &GenContext, sink: &mut S) -> io::Result<()>
    where S: SourceSink {
        for collection in &api.macro_collections {
            let mut dest = Vec::new();
            write_enum(collection, api, ctx, &mut dest)?;
            finish(sink, &format!("{}.rs", enum_module(collection)), dest)?;
        }
        Ok(())
    }
}

/// Member of a collection as it appears in the generated code.
struct Member<'a> {
    short: String,
    /// Either the native constant name or the literal value.
    value: String,
    source: &'a Macro,
}

fn members<'a>(collection: &'a MacroCollection, api: &ParsedApi) -> io::Result<Vec<Member<'a>>> {
    let mut seen = BTreeSet::new();
    // (macro, short name, value text when the header has no constant for it)
    let mut emitted: Vec<(&'a Macro, String, Option<&'a String>)> = Vec::new();

    for m in &collection.macros {
        let literal = if api.macro_named(&m.name).map_or(false, |native| native.value.is_some()) {
            None
        } else {
            match &m.value {
                Some(value) => Some(value),
                None => {
                    debug!("{} has no value, left out of {}", m.name, collection.name);
                    continue;
                },
            }
        };

        let short = enum_name(&m.name, &collection.prefix_to_remove, &collection.suffix_to_remove);
        if !seen.insert(short.clone()) {
            warn!("{} maps to {}::{} a second time, skipping it", m.name, collection.name, short);
            continue;
        }

        emitted.push((m, short, literal));
    }

    let own: BTreeMap<&str, &str> = emitted.iter().map(|(m, short, _)| (m.name.as_str(), short.as_str())).collect();

    let mut members = Vec::new();
    for (m, short, literal) in &emitted {
        let value = match literal {
            None => m.name.clone(),
            Some(text) => {
                let mut visiting = vec![m.name.clone()];
                resolve_value(text, &collection.name, Some(&own), api, &mut visiting)?
            },
        };
        members.push(Member {
            short: short.clone(),
            value,
            source: *m,
        });
    }

    Ok(members)
}

/// Rewrites the names in a member's value text so they refer to something the enum file can see:
/// another member of the same collection, a constant of `native_constants.rs`, or the inlined
/// value of an alias defined nowhere else.
fn resolve_value(
    text: &str,
    collection: &str,
    own: Option<&BTreeMap<&str, &str>>,
    api: &ParsedApi,
    visiting: &mut Vec<String>,
) -> io::Result<String> {
    let whole = text.trim();
    map_words(whole, |word| {
        if word.starts_with(|c: char| c.is_ascii_digit()) {
            let literal = constant_value(word);
            return Ok(if literal != word && word != whole { format!("({})", literal) } else { literal });
        }
        resolve_name(word, collection, own, api, visiting)
    })
}

fn resolve_name(
    word: &str,
    collection: &str,
    own: Option<&BTreeMap<&str, &str>>,
    api: &ParsedApi,
    visiting: &mut Vec<String>,
) -> io::Result<String> {
    if visiting.iter().any(|name| name == word) {
        return Err(unresolved(collection, format!("{} is defined in terms of itself", word)));
    }
    if let Some(short) = own.and_then(|own| own.get(word)) {
        return Ok(format!("Self::{}.0", short));
    }
    if api.macro_named(word).map_or(false, |native| native.value.is_some()) {
        return Ok(word.to_string());
    }

    let alias = api
        .macro_collections
        .iter()
        .flat_map(|c| &c.macros)
        .filter(|m| m.name == word)
        .find_map(|m| m.value.as_ref());
    match alias {
        Some(value) => {
            visiting.push(word.to_string());
            let inlined = resolve_value(value, collection, None, api, visiting)?;
            visiting.pop();
            if inlined.chars().all(|c| c.is_alphanumeric() || c == '_') {
                Ok(inlined)
            } else {
                Ok(format!("({})", inlined))
            }
        },
        None => Err(unresolved(collection, format!("{} is not a known constant", word))),
    }
}

fn unresolved(collection: &str, message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, Error::structure(collection, message))
}

/// Replaces every identifier or number in `text` with `map(word)`, keeping everything else.
fn map_words<F>(text: &str, mut map: F) -> io::Result<String>
where F: FnMut(&str) -> io::Result<String> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(is_word) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail.find(|c: char| !is_word(c)).unwrap_or(tail.len());
        out.push_str(&map(&tail[..end])?);
        rest = &tail[end..];
    }
    out.push_str(rest);

    Ok(out)
}

fn write_enum<W>(collection: &MacroCollection, api: &ParsedApi, ctx: &GenContext, dest: &mut W) -> io::Result<()>
where W: io::Write {
    let name = &collection.name;
    let members = members(collection, api)?;

    write_header(ctx, dest)?;
    writeln!(
        dest,
        "#![allow(non_upper_case_globals)]

use std::fmt;
use std::os::raw::c_int;

#[allow(unused_imports)]
use super::native_constants::*;

#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct {name}(pub c_int);

impl {name} {{",
        name = name
    )?;

    for member in &members {
        write_docs(&member.source.documentation, "    ", ctx, dest)?;
        writeln!(dest, "    pub const {}: {} = {}({});", member.short, name, name, member.value)?;
    }

    writeln!(dest)?;
    writeln!(dest, "    /// Name of the constant this value belongs to, if any.")?;
    writeln!(dest, "    #[allow(unreachable_patterns)]")?;
    writeln!(dest, "    pub fn name(self) -> Option<&'static str> {{")?;
    writeln!(dest, "        match self {{")?;
    for member in &members {
        writeln!(dest, "            {}::{} => Some(\"{}\"),", name, member.short, member.short)?;
    }
    writeln!(dest, "            _ => None,")?;
    writeln!(dest, "        }}")?;
    writeln!(dest, "    }}")?;
    writeln!(dest, "}}")?;

    writeln!(
        dest,
        "
impl fmt::Debug for {name} {{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {{
        match self.name() {{
            Some(member) => write!(f, \"{name}::{{}}\", member),
            None => write!(f, \"{name}({{}})\", self.0),
        }}
    }}
}}

impl From<c_int> for {name} {{
    fn from(value: c_int) -> {name} {{
        {name}(value)
    }}
}}

impl From<{name}> for c_int {{
    fn from(value: {name}) -> c_int {{
        value.0
    }}
}}",
        name = name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{fixtures::sample_api, Generator, MemorySink};
    use pretty_assertions::assert_eq;

    fn generate() -> MemorySink {
        let mut sink = MemorySink::new();
        EnumGenerator.write(&sample_api(), &GenContext::new("https://www.glfw.org/docs/latest", ""), &mut sink).unwrap();
        sink
    }

    #[test]
    fn one_file_per_collection() {
        let sink = generate();
        let names: Vec<&str> = sink.files.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["enum_action.rs", "enum_key.rs"]);
    }

    #[test]
    fn members_use_native_constants() {
        let sink = generate();
        let keys = sink.file("enum_key.rs").unwrap();
        assert!(keys.contains("pub struct Key(pub c_int);"));
        assert!(keys.contains("    pub const D0: Key = Key(GLFW_KEY_0);\n"));
        assert!(keys.contains("    pub const Escape: Key = Key(GLFW_KEY_ESCAPE);\n"));
        assert!(keys.contains("    pub const Last: Key = Key(GLFW_KEY_LAST);\n"));
        assert!(keys.contains("            Key::Escape => Some(\"Escape\"),"));
        assert!(keys.contains("            None => write!(f, \"Key({})\", self.0),"));
    }

    #[test]
    fn members_missing_from_the_header_use_their_literal() {
        let sink = generate();
        let actions = sink.file("enum_action.rs").unwrap();
        assert!(actions.contains("    pub const Press: Action = Action(GLFW_PRESS);\n"));
        assert!(actions.contains("    pub const Repeat: Action = Action(2);\n"));
    }

    #[test]
    fn duplicate_short_names_are_skipped() {
        let mut api = sample_api();
        let mut duplicate = api.macro_collections[1].macros[1].clone();
        duplicate.name = "GLFW_KEY_ESCAPE".to_string();
        api.macro_collections[1].macros.push(duplicate);

        let names: Vec<String> = members(&api.macro_collections[1], &api).unwrap().into_iter().map(|m| m.short).collect();
        assert_eq!(names, vec!["D0", "Escape", "Menu", "Last"]);
    }

    fn member_value(api: &ParsedApi, collection: usize, short: &str) -> String {
        let members = members(&api.macro_collections[collection], api).unwrap();
        members.into_iter().find(|m| m.short == short).unwrap().value
    }

    #[test]
    fn aliases_of_members_refer_to_the_member() {
        let mut api = sample_api();
        api.macros.retain(|m| m.name != "GLFW_KEY_LAST");
        assert_eq!(member_value(&api, 1, "Last"), "Self::Menu.0");

        let mut sink = MemorySink::new();
        EnumGenerator.write(&api, &GenContext::new("https://www.glfw.org/docs/latest", ""), &mut sink).unwrap();
        assert!(sink.file("enum_key.rs").unwrap().contains("    pub const Last: Key = Key(Self::Menu.0);\n"));
    }

    #[test]
    fn aliases_into_other_collections_are_inlined() {
        let mut api = sample_api();
        let mut held = api.macro_collections[1].macros[0].clone();
        held.name = "GLFW_KEY_HELD".to_string();
        held.value = Some("GLFW_REPEAT".to_string());
        let mut pressed = held.clone();
        pressed.name = "GLFW_KEY_PRESSED".to_string();
        pressed.value = Some("(GLFW_PRESS|GLFW_KEY_HELD)".to_string());
        api.macro_collections[1].macros.push(held);
        api.macro_collections[1].macros.push(pressed);

        assert_eq!(member_value(&api, 1, "Held"), "2");
        assert_eq!(member_value(&api, 1, "Pressed"), "(GLFW_PRESS|Self::Held.0)");
    }

    #[test]
    fn unknown_alias_is_an_error() {
        let mut api = sample_api();
        let mut dangling = api.macro_collections[0].macros[2].clone();
        dangling.name = "GLFW_HOLD".to_string();
        dangling.value = Some("GLFW_NOWHERE".to_string());
        api.macro_collections[0].macros.push(dangling);

        let err = members(&api.macro_collections[0], &api).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "Action: GLFW_NOWHERE is not a known constant");
    }

    #[test]
    fn self_referencing_alias_is_an_error() {
        let mut api = sample_api();
        let mut looped = api.macro_collections[0].macros[2].clone();
        looped.name = "GLFW_LOOP".to_string();
        looped.value = Some("GLFW_LOOP".to_string());
        api.macro_collections[0].macros.push(looped);

        let err = members(&api.macro_collections[0], &api).err().unwrap();
        assert!(err.to_string().contains("GLFW_LOOP is defined in terms of itself"), "{}", err);
    }
}
