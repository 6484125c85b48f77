use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use log::{debug, info, warn};

use leafdb::sql::ast::{MetaCommand, Statement};
use leafdb::sql::parser::{parse_meta_command, parse_statement};
use leafdb::storage::page::constants_report;
use leafdb::{DbError, DbResult, Table};

fn main() {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        println!("Must supply a database filename.");
        process::exit(1);
    };

    if let Err(e) = run(&path) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Open the table, serve the prompt, and close the table however the session ends.
fn run(path: &str) -> DbResult<()> {
    let mut table = Table::open(path)?;
    info!("leafdb ready on {}. Type .exit to quit.", path);

    let session = repl(&mut table);
    finish(table, session)
}

/// Close the table even when the session failed; the session's error wins.
fn finish(table: Table, session: DbResult<()>) -> DbResult<()> {
    if let Err(e) = &session {
        warn!("Session ended early: {}", e);
    }
    let closed = table.close();
    session.and(closed)
}

fn repl(table: &mut Table) -> DbResult<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("db > ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            debug!("End of input.");
            return Ok(());
        };
        let line = line?;
        let input = line.trim_end_matches('\r');

        if input.starts_with('.') {
            match parse_meta_command(input) {
                Some(MetaCommand::Exit) => return Ok(()),
                Some(MetaCommand::Btree) => {
                    let tree = table.render_tree()?;
                    println!("Tree:");
                    print!("{}", tree);
                }
                Some(MetaCommand::Constants) => {
                    println!("Constants:");
                    print!("{}", constants_report());
                }
                None => println!("Unrecognized command '{}'", input),
            }
            continue;
        }

        let statement = match parse_statement(input) {
            Ok(statement) => statement,
            Err(e) => {
                warn!("Rejected statement '{}': {}", input, e);
                println!("{}", rejection_message(&e, input));
                continue;
            }
        };

        match execute(table, statement) {
            Ok(()) => println!("Executed."),
            Err(e) => match execution_message(&e) {
                Some(message) => {
                    debug!("Statement failed: {}", e);
                    println!("{}", message);
                }
                None => return Err(e),
            },
        }
    }
}

fn execute(table: &mut Table, statement: Statement) -> DbResult<()> {
    match statement {
        Statement::Insert(row) => table.insert(&row),
        Statement::Select => {
            for row in table.scan()? {
                println!("{}", row?);
            }
            Ok(())
        }
    }
}

/// What to print for a statement that failed to parse or validate.
fn rejection_message(error: &DbError, input: &str) -> String {
    match error {
        DbError::NegativeId => "ID must be positive.".to_string(),
        DbError::StringTooLong { .. } => "String is too long.".to_string(),
        DbError::UnrecognizedStatement(_) => {
            format!("Unrecognized keyword at start of '{}'.", input)
        }
        _ => "Syntax error. Could not parse statement.".to_string(),
    }
}

/// What to print for an execution error the session survives; `None` ends it.
fn execution_message(error: &DbError) -> Option<&'static str> {
    match error {
        DbError::DuplicateKey(_) => Some("Error: Duplicate key."),
        DbError::CapacityExhausted { .. } => Some("Error: Table full."),
        _ => None,
    }
}
