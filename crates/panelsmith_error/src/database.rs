//! PostgreSQL failures surfaced by the diesel stores.

/// What went wrong talking to PostgreSQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// `DATABASE_URL` missing or the server refused the connection
    #[display("cannot connect: {}", _0)]
    Connection(String),
    /// Embedded schema migrations did not apply
    #[display("schema migration failed: {}", _0)]
    Migration(String),
    /// A unique or foreign key constraint rejected a write
    #[display("constraint violated: {}", _0)]
    Constraint(String),
    /// Any other statement failure
    #[display("query failed: {}", _0)]
    Query(String),
}

/// Database error with source location tracking.
///
/// Missing rows are not database errors; the stores report them as
/// [`StorageError`](crate::StorageError) `NotFound`.
///
/// # Examples
///
/// ```
/// use panelsmith_error::{DatabaseError, DatabaseErrorKind};
///
/// let err = DatabaseError::new(DatabaseErrorKind::Connection("DATABASE_URL not set".into()));
/// assert!(err.to_string().contains("cannot connect: DATABASE_URL not set"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// The failure
    pub kind: DatabaseErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DatabaseError {
    /// Record a database failure at the caller's location.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<diesel::result::Error> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind as Pg, Error};

        let kind = match &err {
            Error::DatabaseError(Pg::UniqueViolation | Pg::ForeignKeyViolation, info) => {
                DatabaseErrorKind::Constraint(info.message().to_string())
            }
            _ => DatabaseErrorKind::Query(err.to_string()),
        };
        DatabaseError::new(kind)
    }
}
