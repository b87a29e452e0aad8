////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Builds a [`ParsedApi`] from GLFW's Doxygen reference.
//!
//! Declarations are listed in `memberdecls` tables, one row per declaration, optionally followed
//! by a `memdesc` row holding the one-line summary. The last cell of a declaration row links to
//! the detailed description, which may live on another page.

mod corpus;
mod html;

pub use self::corpus::{DirCorpus, DocCorpus, MemoryCorpus};
pub use self::html::{normalize_text, NodeId, Page};

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use crate::error::{Error, Result};
use crate::lexer::tokenize;
use crate::parsing::{parse_function, parse_macro, parse_struct_field, parse_type_def, Cursor};
use crate::registry::{
    CType, Documentation, Function, Macro, MacroCollection, Parameter, ParsedApi, StructField, TypeDef,
};

/// The page listing every macro, typedef and function of `glfw3.h`.
pub const MASTER_PAGE: &str = "glfw3_8h.html";

const EXCLUDED_MACROS: &[&str] = &["GLAPIENTRY"];

/// Where one closed set of macros is documented, and how its names are shortened.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CollectionSource {
    /// Group name; the page is `group__<group>.html`.
    pub group: &'static str,
    pub name: &'static str,
    pub prefix: &'static str,
    pub suffix: &'static str,
}

pub const MACRO_COLLECTIONS: &[CollectionSource] = &[
    CollectionSource { group: "buttons", name: "MouseButton", prefix: "GLFW_MOUSE_", suffix: "" },
    CollectionSource { group: "errors", name: "ErrorCode", prefix: "GLFW_", suffix: "" },
    CollectionSource { group: "gamepad__axes", name: "GamepadAxis", prefix: "GLFW_GAMEPAD_AXIS_", suffix: "" },
    CollectionSource { group: "gamepad__buttons", name: "GamepadButton", prefix: "GLFW_GAMEPAD_BUTTON_", suffix: "" },
    CollectionSource { group: "hat__state", name: "JoystickHat", prefix: "GLFW_HAT_", suffix: "" },
    CollectionSource { group: "joysticks", name: "Joystick", prefix: "GLFW_JOYSTICK_", suffix: "" },
    CollectionSource { group: "keys", name: "Key", prefix: "GLFW_KEY_", suffix: "" },
    CollectionSource { group: "mods", name: "ModifierKey", prefix: "GLFW_MOD_", suffix: "" },
    CollectionSource { group: "shapes", name: "CursorShape", prefix: "GLFW_", suffix: "_CURSOR" },
];

impl CollectionSource {
    pub fn page(&self) -> String {
        format!("group__{}.html", self.group)
    }
}

/// `PFN_vkGetInstanceProcAddr` is used by GLFW's Vulkan functions but declared in `vulkan.h`.
fn vk_get_instance_proc_addr() -> TypeDef {
    TypeDef::Delegate {
        name: "PFN_vkGetInstanceProcAddr".to_string(),
        documentation: Documentation::summary(
            "The function pointer type for the instance-level Vulkan function vkGetInstanceProcAddr.",
        ),
        return_type: CType::new("void*"),
        parameters: vec![
            Parameter::new("instance", CType::new("VkInstance")),
            Parameter::new("pName", CType::new("const char*")),
        ],
    }
}

/// One declaration row with its documentation already resolved.
struct DeclarationRow {
    row: NodeId,
    line: String,
    documentation: Documentation,
}

pub struct ModelProvider<C> {
    corpus: C,
    pages: RefCell<BTreeMap<String, Rc<Page>>>,
}

impl<C: DocCorpus> ModelProvider<C> {
    pub fn new(corpus: C) -> ModelProvider<C> {
        ModelProvider {
            corpus,
            pages: RefCell::new(BTreeMap::new()),
        }
    }

    /// Scrapes the whole API. Any malformed row or page aborts the scrape.
    pub fn get_api(&self) -> Result<ParsedApi> {
        info!("Scraping {}", MASTER_PAGE);

        let macros: Vec<Macro> = self
            .macros(MASTER_PAGE)?
            .into_iter()
            .filter(|m| !EXCLUDED_MACROS.contains(&m.name.as_str()))
            .collect();

        let mut type_defs = self.type_defs(MASTER_PAGE)?;
        type_defs.push(vk_get_instance_proc_addr());

        let functions = self.functions(MASTER_PAGE)?;
        let macro_collections = self.macro_collections()?;

        info!(
            "Scraped {} macros, {} typedefs, {} functions and {} macro collections from {} pages",
            macros.len(),
            type_defs.len(),
            functions.len(),
            macro_collections.len(),
            self.pages.borrow().len()
        );

        Ok(ParsedApi {
            macro_collections,
            macros,
            type_defs,
            functions,
        })
    }

    fn page(&self, name: &str) -> Result<Rc<Page>> {
        if let Some(page) = self.pages.borrow().get(name) {
            return Ok(Rc::clone(page));
        }

        debug!("Loading {}", name);
        let source = self.corpus.read_page(name)?;
        let page = Rc::new(Page::parse(name, &source)?);
        self.pages.borrow_mut().insert(name.to_string(), Rc::clone(&page));
        Ok(page)
    }

    fn macros(&self, page_name: &str) -> Result<Vec<Macro>> {
        let page = self.page(page_name)?;
        self.declaration_rows(&page, "Macros")?
            .into_iter()
            .map(|decl| -> Result<Macro> {
                let tokens = tokenize(&decl.line)?;
                let mut parsed = parse_macro(&mut Cursor::new(&tokens, &decl.line))?;
                parsed.documentation = decl.documentation;
                debug!("macro {} = {:?}", parsed.name, parsed.value);
                Ok(parsed)
            })
            .collect()
    }

    fn type_defs(&self, page_name: &str) -> Result<Vec<TypeDef>> {
        let page = self.page(page_name)?;
        let mut type_defs = Vec::new();

        for decl in self.declaration_rows(&page, "Typedefs")? {
            let tokens = tokenize(&decl.line)?;
            let parsed = parse_type_def(&mut Cursor::new(&tokens, &decl.line))?;

            let type_def = match parsed {
                TypeDef::Struct { name, .. } => {
                    let fields = match self.struct_page_of(&page, decl.row) {
                        Some(struct_page) => self.struct_fields(&struct_page)?,
                        None => Vec::new(),
                    };
                    debug!("struct {} with {} fields", name, fields.len());
                    TypeDef::Struct {
                        name,
                        documentation: decl.documentation,
                        fields,
                    }
                },
                TypeDef::Delegate {
                    name,
                    return_type,
                    parameters,
                    ..
                } => {
                    debug!("delegate {}", name);
                    TypeDef::Delegate {
                        name,
                        documentation: decl.documentation,
                        return_type,
                        parameters,
                    }
                },
            };
            type_defs.push(type_def);
        }

        Ok(type_defs)
    }

    /// The `structX.html` page a struct typedef row links to, if the struct is not opaque.
    fn struct_page_of(&self, page: &Page, row: NodeId) -> Option<String> {
        let first_cell = *page.cells_of(row).first()?;
        let link = *page.descendants_named(first_cell, "a").first()?;
        let href = page.attr(link, "href")?;
        if href.starts_with("struct") {
            Some(href.split('#').next().unwrap_or(href).to_string())
        } else {
            None
        }
    }

    fn struct_fields(&self, page_name: &str) -> Result<Vec<StructField>> {
        let page = self.page(page_name)?;
        self.declaration_rows(&page, "Data Fields")?
            .into_iter()
            .map(|decl| -> Result<StructField> {
                let tokens = tokenize(&decl.line)?;
                let mut field = parse_struct_field(&mut Cursor::new(&tokens, &decl.line))?;
                field.documentation = decl.documentation;
                Ok(field)
            })
            .collect()
    }

    fn functions(&self, page_name: &str) -> Result<Vec<Function>> {
        let page = self.page(page_name)?;
        self.declaration_rows(&page, "Functions")?
            .into_iter()
            .map(|decl| -> Result<Function> {
                let tokens = tokenize(&decl.line)?;
                let mut function = parse_function(&mut Cursor::new(&tokens, &decl.line))?;
                function.documentation = decl.documentation;
                debug!("function {} with {} parameters", function.name, function.parameters.len());
                Ok(function)
            })
            .collect()
    }

    fn macro_collections(&self) -> Result<Vec<MacroCollection>> {
        MACRO_COLLECTIONS
            .iter()
            .map(|source| -> Result<MacroCollection> {
                let macros = self.macros(&source.page())?;
                debug!("collection {} with {} macros", source.name, macros.len());
                Ok(MacroCollection {
                    name: source.name.to_string(),
                    macros,
                    prefix_to_remove: source.prefix.to_string(),
                    suffix_to_remove: source.suffix.to_string(),
                })
            })
            .collect()
    }

    /// Walks the table headed `heading`, pairing every declaration row with the summary row that
    /// may directly follow it.
    fn declaration_rows(&self, page: &Page, heading: &str) -> Result<Vec<DeclarationRow>> {
        let table = page.find_table_by_heading(heading)?;
        let rows = page.rows_of(table);

        let mut declarations = Vec::new();
        let mut index = 0;
        while index < rows.len() {
            let row = rows[index];
            index += 1;

            if is_layout_row(page, row) {
                continue;
            }

            let mut documentation = self.detailed_documentation(page, row)?;
            if let Some(&next) = rows.get(index) {
                if row_class(page, next).starts_with("memdesc") {
                    documentation.summary = summary_of(page, next);
                    index += 1;
                }
            }

            declarations.push(DeclarationRow {
                row,
                line: normalize_text(&page.text(row)),
                documentation,
            });
        }

        Ok(declarations)
    }

    /// Follows the link in the row's last cell to the detailed description.
    fn detailed_documentation(&self, page: &Page, row: NodeId) -> Result<Documentation> {
        let href = page
            .cells_of(row)
            .last()
            .and_then(|&cell| page.descendants_named(cell, "a").first().copied())
            .and_then(|link| page.attr(link, "href"));
        let href = match href {
            Some(href) => href,
            None => return Ok(Documentation::default()),
        };

        let hash = href
            .find('#')
            .ok_or_else(|| Error::structure(page.name(), format!("documentation link `{}` has no anchor", href)))?;
        let (file, anchor) = (&href[..hash], &href[hash + 1..]);
        let file = if file.is_empty() { page.name() } else { file };

        let target = self.page(file)?;
        let memdoc = target.detailed_doc_for(anchor)?;

        Ok(Documentation {
            summary: None,
            blocks: target.doc_blocks(memdoc),
            reference: Some(format!("{}#{}", file, anchor)),
        })
    }
}

fn row_class<'p>(page: &'p Page, row: NodeId) -> &'p str {
    page.attr(row, "class").unwrap_or("")
}

fn is_layout_row(page: &Page, row: NodeId) -> bool {
    let class = row_class(page, row);
    class.starts_with("separator") || class.starts_with("heading") || !page.has_attributes(row)
}

/// The second cell of a `memdesc` row, without Doxygen's trailing "More..." link.
fn summary_of(page: &Page, row: NodeId) -> Option<String> {
    let cell = *page.cells_of(row).get(1)?;
    let text = normalize_text(&page.text(cell));
    let text = text.strip_suffix("More...").unwrap_or(&text).trim_end();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DocBlock;

    fn page(body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<html xmlns=\"http://www.w3.org/1999/xhtml\">\n<body>\n{}\n</body>\n</html>\n",
            body
        )
    }

    fn table(heading: &str, rows: &str) -> String {
        format!(
            "<table class=\"memberdecls\">\n<tr class=\"heading\"><td colspan=\"2\"><h2 class=\"groupheader\">{}</h2></td></tr>\n{}\n</table>",
            heading, rows
        )
    }

    fn details(anchor: &str, text: &str) -> String {
        format!(
            "<a id=\"{a}\" name=\"{a}\"></a>\n<h2 class=\"memtitle\"><span class=\"permalink\"><a href=\"#{a}\">&#9670;&#160;</a></span>x</h2>\n<div class=\"memitem\">\n<div class=\"memproto\">x</div>\n<div class=\"memdoc\">\n<p>{t}</p>\n</div>\n</div>",
            a = anchor,
            t = text
        )
    }

    const SEPARATOR: &str = "<tr class=\"separator:x\"><td class=\"memSeparator\" colspan=\"2\">&#160;</td></tr>";

    fn provider(pages: &[(&str, String)]) -> ModelProvider<MemoryCorpus> {
        let mut corpus = MemoryCorpus::new();
        for (name, html) in pages {
            corpus.insert(*name, html.clone());
        }
        ModelProvider::new(corpus)
    }

    #[test]
    fn pairs_summaries_with_their_declarations() {
        let rows = [
            "<tr class=\"memitem:a\"><td class=\"memItemLeft\">#define&#160;</td><td class=\"memItemRight\"><a class=\"el\" href=\"group__init.html#ga1\">GLFW_TRUE</a>&#160;&#160;&#160;1</td></tr>",
            "<tr class=\"memdesc:a\"><td class=\"mdescLeft\">&#160;</td><td class=\"mdescRight\">One. <a href=\"group__init.html#ga1\">More...</a><br /></td></tr>",
            SEPARATOR,
            "<tr class=\"memitem:b\"><td class=\"memItemLeft\">#define&#160;</td><td class=\"memItemRight\">GLFW_FALSE&#160;&#160;&#160;0</td></tr>",
            SEPARATOR,
            "<tr><td>attribute-less rows are layout</td></tr>",
            "<tr class=\"memitem:c\"><td class=\"memItemLeft\">#define&#160;</td><td class=\"memItemRight\">GLFW_DONT_CARE&#160;&#160;&#160;-1</td></tr>",
            "<tr class=\"memdesc:c\"><td class=\"mdescLeft\">&#160;</td><td class=\"mdescRight\">Any value.</td></tr>",
        ]
        .join("\n");
        let provider = provider(&[
            ("master.html", page(&table("Macros", &rows))),
            ("group__init.html", page(&details("ga1", "The true value."))),
        ]);

        let macros = provider.macros("master.html").unwrap();
        let names: Vec<&str> = macros.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["GLFW_TRUE", "GLFW_FALSE", "GLFW_DONT_CARE"]);

        assert_eq!(macros[0].value.as_deref(), Some("1"));
        assert_eq!(macros[0].documentation, Documentation {
            summary: Some("One.".into()),
            blocks: vec![DocBlock::Paragraph("The true value.".into())],
            reference: Some("group__init.html#ga1".into()),
        });
        assert!(macros[1].documentation.is_empty());
        assert_eq!(macros[2].value.as_deref(), Some("-1"));
        assert_eq!(macros[2].documentation.summary.as_deref(), Some("Any value."));
    }

    #[test]
    fn struct_rows_read_their_fields() {
        let typedefs = [
            "<tr class=\"memitem:a\"><td class=\"memItemLeft\">typedef struct <a class=\"el\" href=\"group__window.html#ga_w\">GLFWwindow</a>&#160;</td><td class=\"memItemRight\"><a class=\"el\" href=\"group__window.html#ga_w\">GLFWwindow</a></td></tr>",
            "<tr class=\"memitem:b\"><td class=\"memItemLeft\">typedef struct <a class=\"el\" href=\"structGLFWvidmode.html\">GLFWvidmode</a>&#160;</td><td class=\"memItemRight\"><a class=\"el\" href=\"group__monitor.html#ga_v\">GLFWvidmode</a></td></tr>",
            "<tr class=\"memdesc:b\"><td class=\"mdescLeft\">&#160;</td><td class=\"mdescRight\">Video mode type. <a href=\"group__monitor.html#ga_v\">More...</a></td></tr>",
            "<tr class=\"memitem:c\"><td class=\"memItemLeft\">typedef void(*&#160;</td><td class=\"memItemRight\">GLFWerrorfun) (int error_code, const char *description)</td></tr>",
        ]
        .join("\n");
        let fields = [
            "<tr class=\"memitem:f1\"><td class=\"memItemLeft\">int&#160;</td><td class=\"memItemRight\"><a class=\"el\" href=\"structGLFWvidmode.html#f1\">width</a></td></tr>",
            "<tr class=\"memdesc:f1\"><td class=\"mdescLeft\">&#160;</td><td class=\"mdescRight\">The width. <a href=\"structGLFWvidmode.html#f1\">More...</a></td></tr>",
            SEPARATOR,
            "<tr class=\"memitem:f2\"><td class=\"memItemLeft\">int&#160;</td><td class=\"memItemRight\">refreshRate</td></tr>",
        ]
        .join("\n");

        let provider = provider(&[
            ("master.html", page(&table("Typedefs", &typedefs))),
            ("group__window.html", page(&details("ga_w", "Opaque window object."))),
            ("group__monitor.html", page(&details("ga_v", "This describes a single video mode."))),
            (
                "structGLFWvidmode.html",
                page(&format!("{}\n{}", table("Data Fields", &fields), details("f1", "Width in screen coordinates."))),
            ),
        ]);

        let type_defs = provider.type_defs("master.html").unwrap();
        assert_eq!(type_defs.len(), 3);
        assert!(type_defs[0].is_opaque());

        match &type_defs[1] {
            TypeDef::Struct { name, documentation, fields } => {
                assert_eq!(name, "GLFWvidmode");
                assert_eq!(documentation.summary.as_deref(), Some("Video mode type."));
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "width");
                assert_eq!(fields[0].documentation.summary.as_deref(), Some("The width."));
                assert_eq!(fields[0].documentation.reference.as_deref(), Some("structGLFWvidmode.html#f1"));
                assert_eq!(fields[1].name, "refreshRate");
            },
            other => panic!("unexpected {:?}", other),
        }

        match &type_defs[2] {
            TypeDef::Delegate { name, parameters, .. } => {
                assert_eq!(name, "GLFWerrorfun");
                assert_eq!(parameters.len(), 2);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn malformed_rows_abort_the_scrape() {
        let rows = "<tr class=\"memitem:a\"><td class=\"memItemLeft\">int&#160;</td><td class=\"memItemRight\">glfwBroken (int a b)</td></tr>";
        let provider = provider(&[("master.html", page(&table("Functions", rows)))]);
        match provider.functions("master.html") {
            Err(Error::Grammar { line, .. }) => assert_eq!(line, "int glfwBroken (int a b)"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn links_must_reference_their_own_anchor() {
        let rows = "<tr class=\"memitem:a\"><td class=\"memItemLeft\">void&#160;</td><td class=\"memItemRight\"><a class=\"el\" href=\"#ga_t\">glfwTerminate</a> (void)</td></tr>";
        let shifted = "<a name=\"ga_t\"></a>\n<h2 class=\"memtitle\"><a href=\"#ga_other\">x</a></h2>\n<div class=\"memitem\"><div class=\"memdoc\"><p>Wrong.</p></div></div>";
        let provider = provider(&[("master.html", page(&format!("{}\n{}", table("Functions", rows), shifted)))]);
        match provider.functions("master.html") {
            Err(Error::Structure { page, message }) => {
                assert_eq!(page, "master.html");
                assert!(message.contains("ga_t"), "{}", message);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pages_are_read_once() {
        let rows = [
            "<tr class=\"memitem:a\"><td class=\"memItemLeft\">#define&#160;</td><td class=\"memItemRight\"><a href=\"group__g.html#a\">A</a>&#160;1</td></tr>",
            "<tr class=\"memitem:b\"><td class=\"memItemLeft\">#define&#160;</td><td class=\"memItemRight\"><a href=\"group__g.html#b\">B</a>&#160;2</td></tr>",
        ]
        .join("\n");
        let provider = provider(&[
            ("master.html", page(&table("Macros", &rows))),
            ("group__g.html", page(&format!("{}\n{}", details("a", "A."), details("b", "B.")))),
        ]);
        provider.macros("master.html").unwrap();
        assert_eq!(provider.pages.borrow().len(), 2);
    }

    #[test]
    fn collection_pages() {
        assert_eq!(MACRO_COLLECTIONS.len(), 9);
        assert_eq!(MACRO_COLLECTIONS[6].page(), "group__keys.html");
        let shapes = MACRO_COLLECTIONS[8];
        assert_eq!((shapes.name, shapes.prefix, shapes.suffix), ("CursorShape", "GLFW_", "_CURSOR"));
    }
}
