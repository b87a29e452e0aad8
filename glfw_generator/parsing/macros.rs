////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use super::Cursor;
use crate::error::Result;
use crate::lexer::TokenKind;
use crate::registry::{CType, Documentation, Macro};

/// `# define name value*`
///
/// The value is kept as source text with comments dropped; nothing is evaluated.
pub fn parse_macro(cursor: &mut Cursor) -> Result<Macro> {
    cursor.consume(TokenKind::Hashtag)?;
    cursor.consume_word("define")?;
    let name = cursor.consume(TokenKind::Identifier)?.text.clone();

    let value: String = cursor
        .remaining()
        .iter()
        .filter(|t| !t.kind.is_comment())
        .map(|t| t.text.as_str())
        .collect();

    Ok(Macro {
        name,
        documentation: Documentation::default(),
        ty: CType::new("int"),
        value: if value.is_empty() { None } else { Some(value) },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lexer::tokenize;

    fn parse(line: &str) -> Result<Macro> {
        let tokens = tokenize(line)?;
        parse_macro(&mut Cursor::new(&tokens, line))
    }

    #[test]
    fn values() {
        let cases = [
            ("#define GLFW_VERSION_MAJOR 3", "GLFW_VERSION_MAJOR", Some("3")),
            ("#define GLFW_DONT_CARE -1", "GLFW_DONT_CARE", Some("-1")),
            ("#define GLFW_FOCUSED 0x00020001", "GLFW_FOCUSED", Some("0x00020001")),
            ("#define GLFW_KEY_LAST GLFW_KEY_MENU", "GLFW_KEY_LAST", Some("GLFW_KEY_MENU")),
            ("#define GLFW_HAT_RIGHT_UP (GLFW_HAT_RIGHT | GLFW_HAT_UP)", "GLFW_HAT_RIGHT_UP", Some("(GLFW_HAT_RIGHT|GLFW_HAT_UP)")),
            ("#define GLFW_TRUE 1 /* boolean */", "GLFW_TRUE", Some("1")),
            ("#define GLFW_INCLUDE_GUARD", "GLFW_INCLUDE_GUARD", None),
            ("#define GLFW_ONLY_COMMENT // nothing", "GLFW_ONLY_COMMENT", None),
        ];
        for (line, name, value) in &cases {
            let parsed = parse(line).unwrap();
            assert_eq!(parsed.name, *name);
            assert_eq!(parsed.value.as_deref(), *value, "{}", line);
            assert_eq!(parsed.ty, CType::new("int"));
        }
    }

    #[test]
    fn requires_define() {
        match parse("#include GLFW_H") {
            Err(Error::Grammar { expected, .. }) => assert_eq!(expected, "'define'"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse("define X 1").is_err());
    }
}
