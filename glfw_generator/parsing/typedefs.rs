////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use super::{parse_identifier, parse_parameters, parse_type, Cursor};
use crate::error::Result;
use crate::lexer::TokenKind;
use crate::registry::{Documentation, StructField, TypeDef};

/// `typedef struct tag name` or `typedef ret (* name) (params)`.
///
/// Struct typedefs come back without fields; those are read from the struct's own page.
pub fn parse_type_def(cursor: &mut Cursor) -> Result<TypeDef> {
    cursor.consume_word("typedef")?;

    if cursor.try_consume_where(TokenKind::Identifier, |t| t.text == "struct").is_some() {
        let tag = parse_identifier(cursor)?;
        parse_identifier(cursor)?;
        cursor.expect_end()?;
        return Ok(TypeDef::Struct {
            name: tag,
            documentation: Documentation::default(),
            fields: Vec::new(),
        });
    }

    let return_type = parse_type(cursor)?;
    cursor.consume(TokenKind::LeftParen)?;
    cursor.consume(TokenKind::Asterisk)?;
    let name = parse_identifier(cursor)?;
    cursor.consume(TokenKind::RightParen)?;
    cursor.consume(TokenKind::LeftParen)?;
    let parameters = parse_parameters(cursor)?;
    cursor.expect_end()?;

    Ok(TypeDef::Delegate {
        name,
        documentation: Documentation::default(),
        return_type,
        parameters,
    })
}

/// `type name` as listed in a struct's data field table.
pub fn parse_struct_field(cursor: &mut Cursor) -> Result<StructField> {
    let ty = parse_type(cursor)?;
    let name = parse_identifier(cursor)?;
    cursor.expect_end()?;
    Ok(StructField {
        name,
        ty,
        documentation: Documentation::default(),
    })
}
