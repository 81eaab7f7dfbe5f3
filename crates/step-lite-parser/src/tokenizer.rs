// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Part21 record tokenizer using nom combinators
//!
//! Parses one instance record into its name, type and attribute tokens.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{cut, map, map_res, opt, recognize, value},
    error::ErrorKind,
    multi::{many0_count, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use step_lite_model::{AttributeValue, EntityId};

/// Raw token from a record (before conversion to AttributeValue)
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Instance reference (#123)
    EntityRef(u32),
    /// String value ('text'), escapes still doubled
    String(&'a str),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Enumeration (.VALUE.)
    Enum(&'a str),
    /// List of tokens
    List(Vec<Token<'a>>),
    /// Typed value like IFCLABEL('text')
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value ($)
    Null,
    /// Derived value (*)
    Derived,
}

impl<'a> Token<'a> {
    /// Convert token to owned AttributeValue
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(s.replace("''", "'")),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum("T") => AttributeValue::Bool(true),
            Token::Enum("F") => AttributeValue::Bool(false),
            Token::Enum(s) => AttributeValue::Enum((*s).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(|t| t.to_attribute_value()).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                (*name).to_string(),
                args.iter().map(|t| t.to_attribute_value()).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

/// One tokenized record
#[derive(Clone, Debug, PartialEq)]
pub struct RawEntity<'a> {
    pub id: u32,
    pub type_name: &'a str,
    pub attributes: Vec<Token<'a>>,
}

impl RawEntity<'_> {
    /// Owned attribute values in order
    pub fn attribute_values(&self) -> Vec<AttributeValue> {
        self.attributes.iter().map(|t| t.to_attribute_value()).collect()
    }
}

// ============================================================================
// Parsing Primitives
// ============================================================================

/// Whitespace and `/* */` comments
fn ws(input: &str) -> IResult<&str, ()> {
    let comment = (tag("/*"), take_until("*/"), tag("*/"));
    value((), pair(multispace0, many0_count(pair(comment, multispace0)))).parse(input)
}

/// Type or typed-value name
fn keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_').parse(input)
}

/// `#123`; a name that does not fit in `u32` is a hard failure
fn instance_name(input: &str) -> IResult<&str, u32> {
    preceded(
        char('#'),
        cut(map_res(digit1, |digits: &str| digits.parse::<u32>())),
    )
    .parse(input)
}

fn entity_ref(input: &str) -> IResult<&str, Token> {
    map(instance_name, Token::EntityRef).parse(input)
}

/// `'text'`, with `''` standing for one quote
fn step_string(input: &str) -> IResult<&str, Token> {
    let body = recognize(many0_count(alt((is_not("'"), tag("''")))));
    map(delimited(char('\''), body, char('\'')), Token::String).parse(input)
}

/// Integer or real; values out of range fail instead of wrapping
fn number(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize((
        opt(alt((char('-'), char('+')))),
        digit1,
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            digit1,
        )),
    ))
    .parse(input)?;

    let text = text.strip_prefix('+').unwrap_or(text);
    let token = if text.contains(['.', 'e', 'E']) {
        lexical_core::parse::<f64>(text.as_bytes())
            .ok()
            .filter(|f| f.is_finite())
            .map(Token::Float)
    } else {
        lexical_core::parse::<i64>(text.as_bytes())
            .ok()
            .map(Token::Integer)
    };

    match token {
        Some(token) => Ok((rest, token)),
        None => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        ))),
    }
}

/// `.VALUE.`
fn enumeration(input: &str) -> IResult<&str, Token> {
    map(delimited(char('.'), keyword, char('.')), Token::Enum).parse(input)
}

/// Parse a parenthesized, comma-separated token list
fn token_list(input: &str) -> IResult<&str, Vec<Token>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

/// Typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, Token> {
    let (input, (name, _, args)) = (keyword, ws, token_list).parse(input)?;
    Ok((input, Token::TypedValue(name, args)))
}

/// Parse any token
fn token(input: &str) -> IResult<&str, Token> {
    alt((
        entity_ref,
        step_string,
        value(Token::Null, char('$')),
        value(Token::Derived, char('*')),
        enumeration,
        number,
        map(token_list, Token::List),
        typed_value,
    ))
    .parse(input)
}

// ============================================================================
// Record Parsing
// ============================================================================

/// Parse a complete instance record
///
/// Format: `#123=IFCWALL(attr1,attr2,...);`. Comments may appear wherever
/// whitespace may.
pub fn parse_entity(input: &str) -> Result<RawEntity<'_>, String> {
    let (input, id) = preceded(ws, instance_name)
        .parse(input)
        .map_err(|_| "Expected instance name")?;

    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_| "Expected = after instance name")?;

    let (input, type_name) = keyword(input).map_err(|_| "Expected type name")?;

    let (input, attributes) = preceded(ws, token_list)
        .parse(input)
        .map_err(|e| format!("Failed to parse attributes: {:?}", e))?;

    (ws, char(';'))
        .parse(input)
        .map_err(|_| "Expected ; after attributes")?;

    Ok(RawEntity {
        id,
        type_name,
        attributes,
    })
}

/// Parse the record spanning `start..end`
pub fn parse_entity_at(content: &str, start: usize, end: usize) -> Result<RawEntity<'_>, String> {
    let slice = &content[start..end];
    parse_entity(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_ref() {
        let (remaining, token) = entity_ref("#123").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::EntityRef(123));
    }

    #[test]
    fn test_parse_string_with_escaped_quote() {
        let (remaining, token) = step_string("'it''s a test'").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::String("it''s a test"));
        assert_eq!(
            token.to_attribute_value(),
            AttributeValue::String("it's a test".to_string())
        );
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(step_string("'never closed").is_err());
    }

    #[test]
    fn test_parse_number_scientific() {
        let (remaining, token) = number("1.5E-3").unwrap();
        assert_eq!(remaining, "");
        if let Token::Float(f) = token {
            assert!((f - 0.0015).abs() < 1e-10);
        } else {
            panic!("Expected float");
        }
    }

    #[test]
    fn test_parse_number_integer() {
        let (_, token) = number("-42").unwrap();
        assert_eq!(token, Token::Integer(-42));
    }

    #[test]
    fn test_boolean_enums() {
        let (_, token) = enumeration(".T.").unwrap();
        assert_eq!(token.to_attribute_value(), AttributeValue::Bool(true));
        let (_, token) = enumeration(".ELEMENT.").unwrap();
        assert_eq!(
            token.to_attribute_value(),
            AttributeValue::Enum("ELEMENT".to_string())
        );
    }

    #[test]
    fn test_parse_entity() {
        let entity = parse_entity("#1=IFCWALL('abc',$,#2,(1,2.5),IFCLABEL('x'));").unwrap();
        assert_eq!(entity.id, 1);
        assert_eq!(entity.type_name, "IFCWALL");
        assert_eq!(entity.attributes.len(), 5);

        let values = entity.attribute_values();
        assert_eq!(values[2], AttributeValue::EntityRef(EntityId(2)));
        assert_eq!(values[4].as_string(), Some("x"));
    }

    #[test]
    fn test_comments_count_as_whitespace() {
        let entity =
            parse_entity("#1 /* a */ = WALL ( 'a' /* it's; */ , /**/ $ ) /* end */ ;").unwrap();
        assert_eq!(entity.id, 1);
        assert_eq!(entity.type_name, "WALL");
        assert_eq!(entity.attributes, [Token::String("a"), Token::Null]);
    }

    #[test]
    fn test_out_of_range_values_are_errors() {
        assert!(entity_ref("#99999999999").is_err());
        assert!(number("99999999999999999999999").is_err());
        assert!(number("1.0E999").is_err());
        assert!(parse_entity("#1=WALL(#99999999999);").is_err());
        assert!(parse_entity("#1=WALL(99999999999999999999999);").is_err());
        assert!(parse_entity("#99999999999=WALL();").is_err());
    }

    #[test]
    fn test_reals_without_fraction_digits() {
        assert_eq!(number("0.").unwrap().1, Token::Float(0.0));
        assert_eq!(number("1.E2").unwrap().1, Token::Float(100.0));
    }

    #[test]
    fn test_parse_entity_rejects_garbage() {
        assert!(parse_entity("#1=IFCWALL('abc',,);").is_err());
        assert!(parse_entity("#1=IFCWALL('abc') junk;").is_err());
        assert!(parse_entity("IFCWALL();").is_err());
    }
}
