pub use self::mt940::{
    balance_field, description_line, movement_line, parse_balance_line, parse_movement_line,
    MovementLine, Mt940Writer, StatementParseError,
};

mod mt940;
