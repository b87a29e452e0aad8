////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use super::{parse_identifier, parse_parameters, parse_type, Cursor};
use crate::error::Result;
use crate::lexer::TokenKind;
use crate::registry::{Documentation, Function};

/// `ret name ( params )`
pub fn parse_function(cursor: &mut Cursor) -> Result<Function> {
    let return_type = parse_type(cursor)?;
    let name = parse_identifier(cursor)?;
    cursor.consume(TokenKind::LeftParen)?;
    let parameters = parse_parameters(cursor)?;
    cursor.expect_end()?;

    Ok(Function {
        name,
        documentation: Documentation::default(),
        return_type,
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::registry::{CType, Parameter};

    fn function(line: &str) -> Function {
        let tokens = tokenize(line).unwrap();
        parse_function(&mut Cursor::new(&tokens, line)).unwrap()
    }

    #[test]
    fn void_parameter_list_collapses() {
        let parsed = function("void glfwTerminate(void)");
        assert_eq!(parsed.name, "glfwTerminate");
        assert_eq!(parsed.return_type, CType::new("void"));
        assert!(parsed.parameters.is_empty());
    }

    #[test]
    fn pointer_parameters() {
        let parsed = function(
            "GLFWwindow* glfwCreateWindow(int width, int height, const char* title, GLFWmonitor* monitor, GLFWwindow* share)",
        );
        assert_eq!(parsed.name, "glfwCreateWindow");
        assert_eq!(parsed.return_type, CType::new("GLFWwindow*"));
        assert_eq!(parsed.parameters, vec![
            Parameter::new("width", CType::new("int")),
            Parameter::new("height", CType::new("int")),
            Parameter::new("title", CType::new("const char*")),
            Parameter::new("monitor", CType::new("GLFWmonitor*")),
            Parameter::new("share", CType::new("GLFWwindow*")),
        ]);
    }

    #[test]
    fn doxygen_spacing() {
        let parsed = function("const float * glfwGetJoystickAxes (int jid, int *count)");
        assert_eq!(parsed.return_type, CType::new("const float*"));
        assert_eq!(parsed.parameters[1], Parameter::new("count", CType::new("int*")));
    }

    #[test]
    fn anonymous_parameters() {
        let parsed = function("int glfwAnonymous(int, GLFWwindow*)");
        assert_eq!(parsed.parameters, vec![
            Parameter::new("", CType::new("int")),
            Parameter::new("", CType::new("GLFWwindow*")),
        ]);
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let line = "int glfwInit(void) ;";
        let tokens = tokenize(line).unwrap();
        assert!(parse_function(&mut Cursor::new(&tokens, line)).is_err());
    }
}
