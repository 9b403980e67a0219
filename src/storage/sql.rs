//! SQL text for the two statements the writer issues.
//!
//! Values are always bound as positional parameters; only identifiers are
//! spliced into the text, double-quoted.

/// Quote an identifier, doubling embedded quotes.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `INSERT INTO t (a, b) VALUES (?1, ?2) RETURNING pk`
#[must_use]
pub fn insert_sql<'a>(
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
    primary_key: &str,
) -> String {
    let columns: Vec<String> = columns.into_iter().map(quote_ident).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quote_ident(table),
        columns.join(", "),
        placeholders.join(", "),
        quote_ident(primary_key)
    )
}

/// `INSERT INTO t DEFAULT VALUES RETURNING pk`, with the backend's fragment.
#[must_use]
pub fn insert_fragment_sql(table: &str, fragment: &str, primary_key: &str) -> String {
    format!(
        "INSERT INTO {} {} RETURNING {}",
        quote_ident(table),
        fragment,
        quote_ident(primary_key)
    )
}

/// `UPDATE t SET a = ?1, b = ?2 WHERE pk = ?3`
///
/// The key parameter is numbered after the SET parameters.
#[must_use]
pub fn update_sql<'a>(
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
    primary_key: &str,
) -> String {
    let sets: Vec<String> = columns
        .into_iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", quote_ident(c), i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_ident(table),
        sets.join(", "),
        quote_ident(primary_key),
        sets.len() + 1
    )
}

/// `SELECT * FROM t WHERE pk = ?1`
#[must_use]
pub fn select_by_key_sql(table: &str, primary_key: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = ?1",
        quote_ident(table),
        quote_ident(primary_key)
    )
}
