//! Environment variable expansion for user-entered paths
//!
//! Settings fields like the launcher's application path may contain
//! Windows-style `%VAR%` references (for example `%ProgramFiles%`). They are
//! expanded before the path is touched.

/// Expands `%VAR%` references using the process environment.
///
/// References whose variable is not set are left in place verbatim, as are
/// unpaired `%` characters.
pub fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        output.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) if !name.is_empty() => {
                        output.push_str(&value);
                    }
                    _ => {
                        output.push('%');
                        output.push_str(name);
                        output.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unpaired trailing percent
                output.push('%');
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}
