//! DDL data type grammar: `name`, `name(n)`, `name(p, s)`, multi-word
//! names, `with|without time zone` suffixes and `[]` array suffixes.

use nom::{
    IResult,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, multispace0, space1},
    combinator::{all_consuming, map_res, opt},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, tuple},
};

use crate::ast::DataTypeNode;
use crate::error::{QuarryError, QuarryResult};

const KNOWN_TYPES: &[&str] = &[
    "bigint",
    "bigserial",
    "binary",
    "bit",
    "blob",
    "bool",
    "boolean",
    "bytea",
    "char",
    "character",
    "character varying",
    "cidr",
    "date",
    "datetime",
    "datetime2",
    "datetimeoffset",
    "decimal",
    "double",
    "double precision",
    "float",
    "float4",
    "float8",
    "inet",
    "int",
    "int2",
    "int4",
    "int8",
    "integer",
    "interval",
    "json",
    "jsonb",
    "longblob",
    "longtext",
    "mediumint",
    "mediumtext",
    "money",
    "nchar",
    "ntext",
    "numeric",
    "nvarchar",
    "real",
    "serial",
    "smalldatetime",
    "smallint",
    "smallserial",
    "text",
    "time",
    "time with time zone",
    "time without time zone",
    "timestamp",
    "timestamp with time zone",
    "timestamp without time zone",
    "timestamptz",
    "timetz",
    "tinyint",
    "tinytext",
    "tsvector",
    "uniqueidentifier",
    "uuid",
    "varbinary",
    "varbit",
    "varchar",
    "xml",
    "year",
];

struct ParsedType<'a> {
    name: Vec<&'a str>,
    args: Option<Vec<u32>>,
    suffix: Option<Vec<&'a str>>,
    arrays: usize,
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn words(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(space1, word)(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

fn args(input: &str) -> IResult<&str, Vec<u32>> {
    delimited(
        tuple((char('('), multispace0)),
        separated_list1(tuple((multispace0, char(','), multispace0)), number),
        tuple((multispace0, char(')'))),
    )(input)
}

fn data_type(input: &str) -> IResult<&str, ParsedType<'_>> {
    let (rest, (name, args, suffix, arrays)) = all_consuming(tuple((
        words,
        opt(preceded(multispace0, args)),
        opt(preceded(space1, words)),
        many0(tag("[]")),
    )))(input)?;

    Ok((
        rest,
        ParsedType {
            name,
            args,
            suffix,
            arrays: arrays.len(),
        },
    ))
}

/// Validate and normalize a data type string.
pub fn parse_data_type(input: &str) -> QuarryResult<DataTypeNode> {
    let lowered = input.trim().to_lowercase();
    let (_, parsed) =
        data_type(&lowered).map_err(|_| QuarryError::InvalidDataType(input.to_string()))?;

    let mut full_name = parsed.name.join(" ");
    if let Some(suffix) = &parsed.suffix {
        full_name.push(' ');
        full_name.push_str(&suffix.join(" "));
    }
    if !KNOWN_TYPES.contains(&full_name.as_str()) {
        return Err(QuarryError::InvalidDataType(input.to_string()));
    }

    let mut data_type = parsed.name.join(" ");
    if let Some(args) = &parsed.args {
        let args: Vec<String> = args.iter().map(u32::to_string).collect();
        data_type.push_str(&format!("({})", args.join(", ")));
    }
    if let Some(suffix) = &parsed.suffix {
        data_type.push(' ');
        data_type.push_str(&suffix.join(" "));
    }
    data_type.push_str(&"[]".repeat(parsed.arrays));

    Ok(DataTypeNode { data_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_and_sized_types() {
        assert_eq!(parse_data_type("integer").unwrap().data_type, "integer");
        assert_eq!(parse_data_type("VARCHAR(255)").unwrap().data_type, "varchar(255)");
        assert_eq!(parse_data_type("numeric( 10,2 )").unwrap().data_type, "numeric(10, 2)");
    }

    #[test]
    fn test_multi_word_types() {
        assert_eq!(
            parse_data_type("double precision").unwrap().data_type,
            "double precision"
        );
        assert_eq!(
            parse_data_type("timestamp(3) with time zone").unwrap().data_type,
            "timestamp(3) with time zone"
        );
        assert_eq!(parse_data_type("text[]").unwrap().data_type, "text[]");
    }

    #[test]
    fn test_unknown_types_are_rejected() {
        assert!(parse_data_type("varchar(").is_err());
        assert!(parse_data_type("strng").is_err());
        let err = parse_data_type("int; drop table x").unwrap_err();
        assert_eq!(err.to_string(), "Invalid data type: 'int; drop table x'");
    }
}
