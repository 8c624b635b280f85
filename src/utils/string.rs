// Mon Oct 19 2026 - Alex

pub struct StringUtils;

impl StringUtils {
    /// Character-wise common prefix; not aligned to path components.
    pub fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
        let end = a
            .char_indices()
            .zip(b.chars())
            .find(|((_, ca), cb)| ca != cb)
            .map(|((i, _), _)| i)
            .unwrap_or_else(|| a.len().min(b.len()));
        &a[..end]
    }

    /// Drops the part of `directory` shared with `source_dir` plus the separator after it.
    pub fn remove_common_root(source_dir: Option<&str>, directory: &str) -> String {
        match source_dir {
            Some(root) if !root.is_empty() => {
                let prefix = StringUtils::common_prefix(directory, root);
                match directory.get(prefix.len() + 1..) {
                    Some(rest) => rest.to_string(),
                    None if prefix.len() >= directory.len() => String::new(),
                    // The cut fell inside a multibyte character.
                    None => directory.to_string(),
                }
            }
            _ => directory.to_string(),
        }
    }

    pub fn tail_lines(text: &str, count: usize) -> Vec<&str> {
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(count);
        lines[start..].to_vec()
    }

    /// Lines around a 0-based `line_index`, marked with `> ` for the line itself.
    pub fn context_window(text: &str, line_index: usize, radius: usize) -> Vec<String> {
        let start = line_index.saturating_sub(radius);
        let end = line_index + radius + 1;

        text.lines()
            .enumerate()
            .skip(start)
            .take(end - start)
            .map(|(i, line)| {
                let marker = if i == line_index { ">" } else { " " };
                format!("{} {}", marker, line.trim_end())
            })
            .collect()
    }
}
