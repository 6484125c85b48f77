use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_till1},
    character::complete::{i64 as integer, space0, space1},
    combinator::all_consuming,
};

use crate::error::{DbError, DbResult};
use crate::sql::ast::{MetaCommand, Statement};
use crate::storage::row::Row;

/// Parse one input line into a statement.
///
/// Lines starting with `insert` must be `insert <id> <username> <email>`;
/// `select` must stand alone. Anything else is unrecognized.
pub fn parse_statement(line: &str) -> DbResult<Statement> {
    if line.starts_with("insert") {
        return parse_insert(line);
    }
    if line == "select" {
        return Ok(Statement::Select);
    }
    Err(DbError::UnrecognizedStatement(line.to_string()))
}

/// `None` for anything other than the known dot commands.
pub fn parse_meta_command(line: &str) -> Option<MetaCommand> {
    match line {
        ".exit" => Some(MetaCommand::Exit),
        ".btree" => Some(MetaCommand::Btree),
        ".constants" => Some(MetaCommand::Constants),
        _ => None,
    }
}

fn parse_insert(line: &str) -> DbResult<Statement> {
    let (_, (id, username, email)) = all_consuming(insert_args)
        .parse(line)
        .map_err(|_| DbError::Syntax(line.to_string()))?;

    if id < 0 {
        return Err(DbError::NegativeId);
    }
    let id = u32::try_from(id).map_err(|_| DbError::Syntax(format!("id {} is out of range", id)))?;
    Ok(Statement::Insert(Row::new(id, username, email)?))
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace()).parse(input)
}

fn insert_args(input: &str) -> IResult<&str, (i64, &str, &str)> {
    let (rest, (_, _, id, _, username, _, email, _)) = (
        tag("insert"),
        space1,
        integer,
        space1,
        word,
        space1,
        word,
        space0,
    )
        .parse(input)?;
    Ok((rest, (id, username, email)))
}
