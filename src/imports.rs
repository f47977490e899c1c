pub use self::statement::{
    parse_statement, parse_transaction, read_statements, sort_by_time, ImportError,
};

mod statement;
