//! Connection-string helper for credential-based configuration.

/// Fixed query parameters appended to every DSN.
pub const DSN_PARAMS: &str = "parseTime=true&loc=Local&interpolateParams=true";

/// Render `user:password@tcp(host:port)/database?<DSN_PARAMS>`.
///
/// Inputs are substituted verbatim; nothing is escaped or validated.
pub fn new_dsn(user: &str, password: &str, host: &str, database: &str, port: u16) -> String {
    format!("{user}:{password}@tcp({host}:{port})/{database}?{DSN_PARAMS}")
}

/// Replace the password in a DSN with `***` for logging.
///
/// Handles both URL DSNs (`postgres://user:pw@host/db`) and the
/// `user:pw@tcp(host:port)/db` form. Credentials end at the last `@` of the
/// authority, so a password may itself contain `@`. Strings without a
/// password come back unchanged.
pub fn mask_dsn(dsn: &str) -> String {
    let (start, end) = match dsn.find("://") {
        Some(pos) => {
            let start = pos + 3;
            let end = dsn[start..]
                .find(['/', '?', '#'])
                .map_or(dsn.len(), |i| start + i);
            (start, end)
        }
        None => (0, dsn.find("@tcp(").map_or(dsn.len(), |i| i + 1)),
    };

    let authority = &dsn[start..end];
    let Some(at_pos) = authority.rfind('@') else {
        return dsn.to_string();
    };
    let Some(colon_pos) = authority[..at_pos].find(':') else {
        return dsn.to_string();
    };

    format!(
        "{}***{}",
        &dsn[..start + colon_pos + 1],
        &dsn[start + at_pos..]
    )
}
