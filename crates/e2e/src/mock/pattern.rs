//! URL glob patterns in the browser-automation dialect.
//!
//! `**` matches any run of characters, `*` matches any run that does not
//! cross a `/`, and `{a,b}` alternates. Everything else is literal, so a
//! query string after the path is matched by a trailing `*` or `**`.

use regex::Regex;

use crate::error::E2eResult;

#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    pub fn glob(pattern: &str) -> E2eResult<Self> {
        let regex = Regex::new(&glob_to_regex(pattern))?;
        Ok(Self { source: pattern.to_string(), regex })
    }

    /// Use a raw regular expression instead of a glob.
    pub fn regex(pattern: &str) -> E2eResult<Self> {
        Ok(Self { source: pattern.to_string(), regex: Regex::new(pattern)? })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    out.push('^');
    let mut chars = glob.chars().peekable();
    let mut in_group = false;
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            '{' => {
                in_group = true;
                out.push('(');
            }
            '}' if in_group => {
                in_group = false;
                out.push(')');
            }
            ',' if in_group => out.push('|'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("**/api/console/patients*", "http://localhost/api/console/patients", true ; "bare list")]
    #[test_case("**/api/console/patients*", "http://localhost/api/console/patients?status=active", true ; "list with query")]
    #[test_case("**/api/console/patients*", "http://localhost/api/console/patients/pat-1", false ; "single star stops at slash")]
    #[test_case("**/api/console/patients**", "http://localhost/api/console/patients/pat-1", true ; "double star crosses slash")]
    #[test_case("**/api/console/admin/users/*/role", "http://localhost/api/console/admin/users/u-1/role", true ; "inner star")]
    #[test_case("**/api/**", "http://localhost/health", false ; "outside api")]
    #[test_case("**/api/console/admin/users{,/**,?**}", "http://localhost/api/console/admin/users?page=2", true ; "collection with query")]
    #[test_case("**/api/console/admin/users{,/**,?**}", "http://localhost/api/console/admin/users/u-1/role", true ; "collection sub path")]
    #[test_case("**/api/console/admin/users{,/**,?**}", "http://localhost/api/console/admin/users-export", false ; "sibling path")]
    #[test_case("**/api/auth/{login,logout}", "http://localhost/api/auth/logout", true ; "alternation")]
    fn test_glob(pattern: &str, url: &str, expected: bool) {
        assert_eq!(UrlPattern::glob(pattern).unwrap().matches(url), expected);
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let pattern = UrlPattern::glob("**/api/v1.0/items?x=1").unwrap();
        assert!(pattern.matches("http://h/api/v1.0/items?x=1"));
        assert!(!pattern.matches("http://h/api/v1x0/items?x=1"));
    }

    #[test]
    fn test_raw_regex() {
        let pattern = UrlPattern::regex(r"/api/console/hr/applicants/[^/]+/advance$").unwrap();
        assert!(pattern.matches("http://h/api/console/hr/applicants/app-1/advance"));
    }
}
