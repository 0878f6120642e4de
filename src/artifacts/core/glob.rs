use regex::Regex;

/// A shell-style glob compiled to an anchored regex.
///
/// `*` never crosses a `/`, `**` does, `?` matches one non-separator
/// character and `[...]` is passed through as a character class.
#[derive(Debug, Clone)]
pub struct Glob {
    source: String,
    pattern: Regex,
}

impl Glob {
    pub fn try_parse(glob: &str) -> anyhow::Result<Self> {
        let pattern = Regex::new(&Self::to_regex(glob))
            .map_err(|err| anyhow::anyhow!("invalid pattern '{}': {}", glob, err))?;

        Ok(Glob {
            source: glob.to_string(),
            pattern,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.pattern.is_match(candidate)
    }

    fn to_regex(glob: &str) -> String {
        let mut regex = String::from("^");
        let chars = glob.chars().collect::<Vec<_>>();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' if chars.get(i + 1) == Some(&'*') => {
                    regex.push_str(".*");
                    i += 2;
                }
                '*' => {
                    regex.push_str("[^/]*");
                    i += 1;
                }
                '?' => {
                    regex.push_str("[^/]");
                    i += 1;
                }
                '[' => {
                    let close = chars[i + 1..].iter().position(|&c| c == ']');
                    match close {
                        Some(offset) => {
                            regex.push('[');
                            chars[i + 1..i + 1 + offset].iter().for_each(|&c| {
                                if c == '\\' {
                                    regex.push('\\');
                                }
                                regex.push(c)
                            });
                            regex.push(']');
                            i += offset + 2;
                        }
                        None => {
                            regex.push_str(r"\[");
                            i += 1;
                        }
                    }
                }
                c => {
                    regex.push_str(&regex::escape(&c.to_string()));
                    i += 1;
                }
            }
        }

        regex.push('$');
        regex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*.log", "debug.log", true)]
    #[case("*.log", "logs/debug.log", false)]
    #[case("**/*.log", "logs/debug.log", true)]
    #[case("file?.txt", "file1.txt", true)]
    #[case("file?.txt", "file10.txt", false)]
    #[case("data[0-9].bin", "data7.bin", true)]
    #[case("data[0-9].bin", "datax.bin", false)]
    #[case("a.b", "axb", false)]
    #[case("unclosed[", "unclosed[", true)]
    fn glob_matches(#[case] glob: &str, #[case] candidate: &str, #[case] expected: bool) {
        let glob = Glob::try_parse(glob).unwrap();

        pretty_assertions::assert_eq!(glob.is_match(candidate), expected);
    }
}
