//! Generation drivers, one per artifact kind.
//!
//! Each driver is a pure function from resolved schema structures to
//! rendered text; the workflow decides where the text lands and how it is
//! tracked. Drivers are deterministic given the same schema.
pub mod auth;
pub mod controller;
pub mod factory;
pub mod migration;
pub mod model;
pub mod observer;
pub mod policy;
pub mod routes;
pub mod seeder;

/// Join rendered lines into a file body with a trailing newline.
pub(crate) fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Quote a list of PHP string literals: `'a', 'b'`.
pub(crate) fn php_string_list(items: &[impl AsRef<str>]) -> String {
    items
        .iter()
        .map(|item| format!("'{}'", item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
